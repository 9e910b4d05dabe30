//! Page tree and the page builder.
//!
//! Container declarations (module, package, class-like with members) get a
//! page of their own; leaf declarations are inlined into their container's
//! page with an anchor. Auxiliary pages are injected afterwards by page-tree
//! transforms, never by the builder itself.

use std::collections::BTreeSet;

use crate::content::ContentNode;
use crate::ident::{to_filename_segment, DeclarationRef, TargetId};
use crate::model::{Classlike, Member, ModuleDecl, Overlay, PackageDecl};
use crate::transform::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Module,
    Package,
    Classlike,
    /// Generated page that documents no declaration (navigation, indexes).
    Auxiliary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageNode {
    pub name: String,
    pub kind: PageKind,
    /// Declaration refs documented by this page; empty for auxiliary pages.
    pub refs: Vec<DeclarationRef>,
    /// Leaf declarations inlined into this page, with their anchors.
    pub anchored: Vec<(DeclarationRef, String)>,
    pub targets: BTreeSet<TargetId>,
    pub content: Vec<ContentNode>,
    pub children: Vec<PageNode>,
}

impl PageNode {
    /// Container pages resolve to `<path>/index`; leaf (auxiliary) pages are
    /// plain files. Mirrors the location provider's index-append rule.
    pub fn is_container(&self) -> bool {
        self.kind != PageKind::Auxiliary
    }

    /// The filesystem segment contributed by this page.
    pub fn path_segment(&self) -> String {
        to_filename_segment(&self.name)
    }

    /// Depth-first iteration over this page and all descendants.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a PageNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// Build the page tree for a merged module: one page per container
/// declaration, leaves inlined (`has_members` decides which is which).
pub fn build_pages(module: &ModuleDecl) -> PageNode {
    let mut content = vec![];
    if let Some(doc) = documentation_block(&module.documentation) {
        content.push(doc);
    }
    if !module.packages.is_empty() {
        content.push(ContentNode::section(
            "Packages",
            module
                .packages
                .iter()
                .map(|pkg| ContentNode::Link {
                    text: pkg.name.clone(),
                    dri: pkg.dri.clone(),
                })
                .collect(),
        ));
    }

    PageNode {
        name: module.name.clone(),
        kind: PageKind::Module,
        refs: vec![],
        anchored: vec![],
        targets: module.targets.clone(),
        content,
        children: module.packages.iter().map(build_package_page).collect(),
    }
}

fn build_package_page(pkg: &PackageDecl) -> PageNode {
    let mut content = vec![];
    let mut anchored = vec![];
    let mut children = vec![];

    if let Some(doc) = documentation_block(&pkg.documentation) {
        content.push(doc);
    }

    if !pkg.classlikes.is_empty() {
        let mut entries = vec![];
        for classlike in &pkg.classlikes {
            entries.push(ContentNode::Link {
                text: classlike.name.clone(),
                dri: classlike.dri.clone(),
            });
            if classlike.has_members() {
                children.push(build_classlike_page(classlike, &pkg.targets));
            } else {
                // Leaf class-like: no page of its own, document it here.
                let anchor = to_filename_segment(&classlike.name);
                anchored.push((classlike.dri.clone(), anchor));
                if let Some(doc) = documentation_block(&classlike.documentation) {
                    entries.push(doc);
                }
            }
        }
        content.push(ContentNode::section("Types", entries));
    }

    if !pkg.members.is_empty() {
        content.push(members_section(&pkg.members, &pkg.targets, &mut anchored));
    }

    PageNode {
        name: pkg.name.clone(),
        kind: PageKind::Package,
        refs: vec![pkg.dri.clone()],
        anchored,
        targets: pkg.targets.clone(),
        content,
        children,
    }
}

fn build_classlike_page(classlike: &Classlike, parent_targets: &BTreeSet<TargetId>) -> PageNode {
    let mut content = vec![];
    let mut anchored = vec![];

    let mut header = vec![ContentNode::Code(classlike.name.clone())];
    header.extend(target_badges(&classlike.targets, parent_targets));
    content.push(ContentNode::list(header));

    if let Some(doc) = documentation_block(&classlike.documentation) {
        content.push(doc);
    }
    if !classlike.members.is_empty() {
        content.push(members_section(
            &classlike.members,
            &classlike.targets,
            &mut anchored,
        ));
    }
    if !classlike.nested.is_empty() {
        content.push(ContentNode::section(
            "Types",
            classlike
                .nested
                .iter()
                .map(|nested| ContentNode::Link {
                    text: nested.name.clone(),
                    dri: nested.dri.clone(),
                })
                .collect(),
        ));
    }

    PageNode {
        name: classlike.name.clone(),
        kind: PageKind::Classlike,
        refs: vec![classlike.dri.clone()],
        anchored,
        targets: classlike.targets.clone(),
        content,
        children: classlike
            .nested
            .iter()
            .filter(|nested| nested.has_members())
            .map(|nested| build_classlike_page(nested, &classlike.targets))
            .collect(),
    }
}

/// The "Members" section: every member is inlined with an anchor, a link, a
/// signature fragment and its documentation.
fn members_section(
    members: &[Member],
    page_targets: &BTreeSet<TargetId>,
    anchored: &mut Vec<(DeclarationRef, String)>,
) -> ContentNode {
    let mut entries = vec![];
    for member in members {
        let anchor = to_filename_segment(&member.name);
        anchored.push((member.dri.clone(), anchor));

        let mut row = vec![
            ContentNode::Link {
                text: member.name.clone(),
                dri: member.dri.clone(),
            },
            signature_block(member),
        ];
        row.extend(target_badges(&member.targets, page_targets));
        if let Some(doc) = documentation_block(&member.documentation) {
            row.push(doc);
        }
        entries.push(ContentNode::Group {
            kind: crate::content::GroupKind::Row,
            title: None,
            children: row,
        });
    }
    ContentNode::section("Members", entries)
}

/// Signature fragment for a member. Uniform across targets renders as one
/// code node; a divergent declared type becomes a platform-hinted block.
fn signature_block(member: &Member) -> ContentNode {
    let render = |decl_type: Option<&String>| {
        let params: Vec<String> = member.params.iter().map(|p| p.name.clone()).collect();
        let mut sig = member.name.clone();
        if !params.is_empty() || member.kind == crate::model::MemberKind::Function {
            sig.push('(');
            sig.push_str(&params.join(", "));
            sig.push(')');
        }
        if let Some(t) = decl_type {
            sig.push_str(": ");
            sig.push_str(t);
        }
        ContentNode::Code(sig)
    };

    if member.decl_type.is_uniform() {
        render(member.decl_type.values().next())
    } else {
        let mut variants = Overlay::new();
        for (target, decl_type) in member.decl_type.iter() {
            variants.insert(target.clone(), vec![render(Some(decl_type))]);
        }
        ContentNode::PlatformHinted(variants)
    }
}

/// Documentation text block: a single text node when every target agrees,
/// a platform-hinted block when they diverge.
fn documentation_block(docs: &Overlay<String>) -> Option<ContentNode> {
    if docs.is_empty() {
        return None;
    }
    if docs.is_uniform() {
        docs.values().next().cloned().map(ContentNode::Text)
    } else {
        let mut variants = Overlay::new();
        for (target, text) in docs.iter() {
            variants.insert(target.clone(), vec![ContentNode::Text(text.clone())]);
        }
        Some(ContentNode::PlatformHinted(variants))
    }
}

/// Target-name badges for declarations present on a strict subset of the
/// page's targets.
fn target_badges(
    targets: &BTreeSet<TargetId>,
    page_targets: &BTreeSet<TargetId>,
) -> Vec<ContentNode> {
    if targets.is_empty() || targets == page_targets {
        return vec![];
    }
    targets
        .iter()
        .map(|t| ContentNode::Code(t.target.clone()))
        .collect()
}

/// Page transform injecting the auxiliary navigation page: a flat list of
/// every documented package, linked. Demonstrates that auxiliary pages come
/// from transforms, not the builder.
pub fn navigation_transform() -> Transform<PageNode> {
    Transform::new("navigation-page", |mut root: PageNode, _ctx| {
        let mut links = vec![];
        root.walk(&mut |page| {
            if page.kind == PageKind::Package {
                links.push(ContentNode::Link {
                    text: page.name.clone(),
                    dri: page.refs[0].clone(),
                });
            }
        });
        let navigation = PageNode {
            name: "navigation".into(),
            kind: PageKind::Auxiliary,
            refs: vec![],
            anchored: vec![],
            targets: root.targets.clone(),
            content: vec![ContentNode::section("All packages", links)],
            children: vec![],
        };
        root.children.push(navigation);
        root
    })
}
