//! HTML renderer.
//!
//! Standalone page per document with a small embedded stylesheet; target
//! badges and platform-hinted blocks get dedicated markup.

use crate::content::{ContentNode, GroupKind};
use crate::pages::PageNode;
use crate::render::{RenderContext, Renderer};

pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn render_page(&self, page: &PageNode, page_path: &str, ctx: &RenderContext<'_>) -> String {
        let mut out = String::new();

        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        out.push_str("<meta charset=\"utf-8\">\n");
        out.push_str(&format!("<title>{}</title>\n", html_escape(&page.name)));
        out.push_str("<style>\n");
        out.push_str("body { font-family: system-ui, sans-serif; max-width: 48em; margin: 2em auto; padding: 0 1em; }\n");
        out.push_str("code { background: #f4f4f4; padding: 0.15em 0.3em; border-radius: 3px; }\n");
        out.push_str("pre { background: #f4f4f4; padding: 1em; border-radius: 5px; overflow-x: auto; }\n");
        out.push_str(".platform { border-left: 3px solid #888; padding-left: 1em; margin: 1em 0; }\n");
        out.push_str(".platform > .target { font-weight: bold; }\n");
        out.push_str("</style>\n");
        out.push_str("</head>\n<body>\n");

        out.push_str(&format!("<h1>{}</h1>\n", html_escape(&page.name)));
        for node in &page.content {
            render_block(node, 1, page_path, ctx, &mut out);
        }

        out.push_str("</body>\n</html>\n");
        out
    }

    fn file_extension(&self) -> &str {
        "html"
    }
}

fn render_block(
    node: &ContentNode,
    depth: usize,
    page_path: &str,
    ctx: &RenderContext<'_>,
    out: &mut String,
) {
    match node {
        ContentNode::Text(text) => {
            out.push_str(&format!("<p>{}</p>\n", html_escape(text)));
        }
        ContentNode::Code(code) => {
            out.push_str(&format!("<pre><code>{}</code></pre>\n", html_escape(code)));
        }
        ContentNode::Link { .. } | ContentNode::ResolvedLink { .. } => {
            out.push_str(&format!("<p>{}</p>\n", render_inline(node, page_path, ctx)));
        }
        ContentNode::Group {
            kind: GroupKind::Section,
            title,
            children,
        } => {
            if let Some(title) = title {
                let level = (depth + 1).min(6);
                out.push_str(&format!("<h{level}>{}</h{level}>\n", html_escape(title)));
            }
            for child in children {
                render_block(child, depth + 1, page_path, ctx, out);
            }
        }
        ContentNode::Group {
            kind: GroupKind::List,
            children,
            ..
        } => {
            out.push_str("<ul>\n");
            for child in children {
                out.push_str(&format!("  <li>{}</li>\n", render_inline(child, page_path, ctx)));
            }
            out.push_str("</ul>\n");
        }
        ContentNode::Group {
            kind: GroupKind::Table,
            children,
            ..
        } => {
            out.push_str("<table>\n");
            for child in children {
                match child {
                    ContentNode::Group {
                        kind: GroupKind::Row,
                        children: cells,
                        ..
                    } => {
                        out.push_str("  <tr>");
                        for cell in cells {
                            out.push_str(&format!("<td>{}</td>", render_inline(cell, page_path, ctx)));
                        }
                        out.push_str("</tr>\n");
                    }
                    other => {
                        out.push_str(&format!(
                            "  <tr><td>{}</td></tr>\n",
                            render_inline(other, page_path, ctx)
                        ));
                    }
                }
            }
            out.push_str("</table>\n");
        }
        ContentNode::Group {
            kind: GroupKind::Row,
            children,
            ..
        } => {
            out.push_str(&format!(
                "<p>{}</p>\n",
                children
                    .iter()
                    .map(|c| render_inline(c, page_path, ctx))
                    .collect::<Vec<_>>()
                    .join(" ")
            ));
        }
        ContentNode::PlatformHinted(overlay) => {
            for (target, children) in overlay.iter() {
                out.push_str("<div class=\"platform\">\n");
                out.push_str(&format!(
                    "<span class=\"target\">{}</span>\n",
                    html_escape(&target.to_string())
                ));
                for child in children {
                    render_block(child, depth, page_path, ctx, out);
                }
                out.push_str("</div>\n");
            }
        }
    }
}

fn render_inline(node: &ContentNode, page_path: &str, ctx: &RenderContext<'_>) -> String {
    match node {
        ContentNode::Text(text) => html_escape(text),
        ContentNode::Code(code) => format!("<code>{}</code>", html_escape(code)),
        ContentNode::Link { text, dri } => match ctx.link(page_path, dri, text) {
            Some(address) => format!(
                "<a href=\"{}\">{}</a>",
                html_escape(&address),
                html_escape(text)
            ),
            None => html_escape(text),
        },
        ContentNode::ResolvedLink { text, address } => format!(
            "<a href=\"{}\">{}</a>",
            html_escape(address),
            html_escape(text)
        ),
        ContentNode::Group {
            title, children, ..
        } => {
            let body = children
                .iter()
                .map(|c| render_inline(c, page_path, ctx))
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            match title {
                Some(title) => format!("<strong>{}</strong> {body}", html_escape(title)),
                None => body,
            }
        }
        ContentNode::PlatformHinted(overlay) => {
            let mut parts = Vec::new();
            for (target, children) in overlay.iter() {
                let body = children
                    .iter()
                    .map(|c| render_inline(c, page_path, ctx))
                    .collect::<Vec<_>>()
                    .join(" ");
                parts.push(format!(
                    "<code>{}</code> {body}",
                    html_escape(&target.to_string())
                ));
            }
            parts.join(" ")
        }
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Reporter;
    use crate::ident::DeclarationRef;
    use crate::location::LocationProvider;
    use crate::pages::{PageKind, PageNode};
    use std::collections::BTreeSet;

    fn page_with(content: Vec<ContentNode>) -> PageNode {
        PageNode {
            name: "example".into(),
            kind: PageKind::Package,
            refs: vec![DeclarationRef::package("example")],
            anchored: vec![],
            targets: BTreeSet::new(),
            content,
            children: vec![],
        }
    }

    fn render(page: &PageNode) -> (String, usize) {
        let root = PageNode {
            name: "docs".into(),
            kind: PageKind::Module,
            refs: vec![],
            anchored: vec![],
            targets: BTreeSet::new(),
            content: vec![],
            children: vec![page.clone()],
        };
        let locations = LocationProvider::build(&root, "html", Vec::new());
        let reporter = Reporter::new();
        let ctx = RenderContext {
            locations: &locations,
            reporter: &reporter,
        };
        let output = HtmlRenderer.render_page(page, "example/index.html", &ctx);
        (output, reporter.warning_count())
    }

    fn page_with_output(content: Vec<ContentNode>) -> (String, usize) {
        render(&page_with(content))
    }

    #[test]
    fn escapes_markup_in_text_and_code() {
        let (output, _) = page_with_output(vec![
            ContentNode::Text("a < b".into()),
            ContentNode::Code("fun <T> id(x: T)".into()),
        ]);
        assert!(output.contains("<p>a &lt; b</p>"));
        assert!(output.contains("<pre><code>fun &lt;T&gt; id(x: T)</code></pre>"));
    }

    #[test]
    fn table_rows_become_tr_td() {
        let (output, _) = page_with_output(vec![ContentNode::Group {
            kind: GroupKind::Table,
            title: None,
            children: vec![ContentNode::Group {
                kind: GroupKind::Row,
                title: None,
                children: vec![
                    ContentNode::Text("bar".into()),
                    ContentNode::Code("fun bar()".into()),
                ],
            }],
        }]);
        assert!(
            output.contains("<tr><td>bar</td><td><code>fun bar()</code></td></tr>"),
            "{output}"
        );
    }

    #[test]
    fn unresolved_link_stays_plain_and_warns() {
        let (output, warnings) = page_with_output(vec![ContentNode::list(vec![ContentNode::Link {
            text: "Gone".into(),
            dri: DeclarationRef::classlike("elsewhere", "Gone"),
        }])]);
        assert!(output.contains("<li>Gone</li>"), "{output}");
        assert_eq!(warnings, 1);
    }
}
