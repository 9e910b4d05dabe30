//! The generic, platform-aware content tree attached to pages.
//!
//! Content is built once per page and only ever rewritten into a new tree by
//! page transforms, never mutated in place. `ContentNode` is a closed enum:
//! every renderer matches it exhaustively, so an unhandled kind is a compile
//! error instead of a silent empty render.

use serde::{Deserialize, Serialize};

use crate::ident::DeclarationRef;
use crate::model::Overlay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    /// A titled block (headers scale with nesting depth).
    Section,
    List,
    Table,
    Row,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContentNode {
    Text(String),
    /// Inline code, e.g. a signature fragment.
    Code(String),
    /// Cross-reference still awaiting resolution.
    Link {
        text: String,
        dri: DeclarationRef,
    },
    /// Cross-reference with a resolved output-relative (or absolute) address.
    ResolvedLink {
        text: String,
        address: String,
    },
    Group {
        kind: GroupKind,
        title: Option<String>,
        children: Vec<ContentNode>,
    },
    /// Content that differs per target: one sub-tree per target where the
    /// rendered output diverges.
    PlatformHinted(Overlay<Vec<ContentNode>>),
}

impl ContentNode {
    pub fn section(title: impl Into<String>, children: Vec<ContentNode>) -> Self {
        Self::Group {
            kind: GroupKind::Section,
            title: Some(title.into()),
            children,
        }
    }

    pub fn list(children: Vec<ContentNode>) -> Self {
        Self::Group {
            kind: GroupKind::List,
            title: None,
            children,
        }
    }

    /// Rewrite this tree bottom-up, producing a new tree. The transformation
    /// runs on children first, then on the rebuilt node itself.
    pub fn rewrite(self, f: &impl Fn(ContentNode) -> ContentNode) -> ContentNode {
        let rebuilt = match self {
            Self::Group {
                kind,
                title,
                children,
            } => Self::Group {
                kind,
                title,
                children: children.into_iter().map(|c| c.rewrite(f)).collect(),
            },
            Self::PlatformHinted(overlay) => {
                let mut rewritten = Overlay::new();
                for (target, children) in overlay.iter() {
                    rewritten.insert(
                        target.clone(),
                        children.iter().cloned().map(|c| c.rewrite(f)).collect(),
                    );
                }
                Self::PlatformHinted(rewritten)
            }
            leaf => leaf,
        };
        f(rebuilt)
    }

    /// Depth-first walk over this node and every descendant.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a ContentNode)) {
        visit(self);
        match self {
            Self::Group { children, .. } => {
                for child in children {
                    child.walk(visit);
                }
            }
            Self::PlatformHinted(overlay) => {
                for children in overlay.values() {
                    for child in children {
                        child.walk(visit);
                    }
                }
            }
            Self::Text(_) | Self::Code(_) | Self::Link { .. } | Self::ResolvedLink { .. } => {}
        }
    }
}
