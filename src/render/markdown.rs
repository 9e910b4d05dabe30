//! Markdown renderer.
//!
//! One document per page: a top-level heading with the page name, then the
//! content tree rendered with headings scaled to group nesting depth.

use crate::content::{ContentNode, GroupKind};
use crate::pages::PageNode;
use crate::render::{RenderContext, Renderer};

pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render_page(&self, page: &PageNode, page_path: &str, ctx: &RenderContext<'_>) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", page.name));
        for node in &page.content {
            render_block(node, 1, page_path, ctx, &mut out);
        }
        out
    }

    fn file_extension(&self) -> &str {
        "md"
    }
}

/// Render one node in block position.
fn render_block(
    node: &ContentNode,
    depth: usize,
    page_path: &str,
    ctx: &RenderContext<'_>,
    out: &mut String,
) {
    match node {
        ContentNode::Text(text) => {
            out.push_str(text);
            out.push_str("\n\n");
        }
        ContentNode::Code(code) => {
            out.push_str("```\n");
            out.push_str(code);
            if !code.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n\n");
        }
        ContentNode::Link { .. } | ContentNode::ResolvedLink { .. } => {
            out.push_str(&render_inline(node, page_path, ctx));
            out.push_str("\n\n");
        }
        ContentNode::Group {
            kind: GroupKind::Section,
            title,
            children,
        } => {
            if let Some(title) = title {
                out.push_str(&"#".repeat((depth + 1).min(6)));
                out.push(' ');
                out.push_str(title);
                out.push_str("\n\n");
            }
            for child in children {
                render_block(child, depth + 1, page_path, ctx, out);
            }
        }
        ContentNode::Group {
            kind: GroupKind::List,
            children,
            ..
        }
        | ContentNode::Group {
            kind: GroupKind::Table,
            children,
            ..
        } => {
            for child in children {
                out.push_str("* ");
                out.push_str(&render_inline(child, page_path, ctx));
                out.push('\n');
            }
            out.push('\n');
        }
        ContentNode::Group {
            kind: GroupKind::Row,
            children,
            ..
        } => {
            out.push_str(&join_inline(children, page_path, ctx));
            out.push_str("\n\n");
        }
        ContentNode::PlatformHinted(overlay) => {
            for (target, children) in overlay.iter() {
                out.push_str(&format!("**{target}**\n\n"));
                for child in children {
                    render_block(child, depth, page_path, ctx, out);
                }
            }
        }
    }
}

/// Render one node in inline position (inside a list item or table row).
fn render_inline(node: &ContentNode, page_path: &str, ctx: &RenderContext<'_>) -> String {
    match node {
        ContentNode::Text(text) => text.clone(),
        ContentNode::Code(code) => format!("`{code}`"),
        ContentNode::Link { text, dri } => match ctx.link(page_path, dri, text) {
            Some(address) => format!("[{text}]({address})"),
            None => text.clone(),
        },
        ContentNode::ResolvedLink { text, address } => format!("[{text}]({address})"),
        ContentNode::Group {
            title, children, ..
        } => {
            let body = join_inline(children, page_path, ctx);
            match title {
                Some(title) => format!("**{title}** {body}"),
                None => body,
            }
        }
        ContentNode::PlatformHinted(overlay) => {
            let mut parts = Vec::new();
            for (target, children) in overlay.iter() {
                parts.push(format!("`{target}` {}", join_inline(children, page_path, ctx)));
            }
            parts.join(" ")
        }
    }
}

fn join_inline(children: &[ContentNode], page_path: &str, ctx: &RenderContext<'_>) -> String {
    children
        .iter()
        .map(|c| render_inline(c, page_path, ctx))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
