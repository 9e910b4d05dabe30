//! Location resolution: declaration ref (or page) to output-relative path.
//!
//! Internal resolution indexes the page tree once; external resolution goes
//! through per-manifest providers (see [`external`]). Both sides share the
//! same path construction so the page builder, the renderer and the
//! manifests can never disagree about where a page lives.

pub mod external;

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::ident::{to_filename_segment, DeclarationRef};
use crate::pages::PageNode;

pub use external::ExternalLocationProvider;

/// Output-relative path for a ref path: each segment filename-escaped and
/// joined with `/`, with a trailing `index` appended for container pages.
/// The root container (empty segment list) resolves to plain `index`.
pub fn path_for(segments: &[String], is_container: bool) -> String {
    if segments.is_empty() {
        return "index".to_string();
    }
    let joined = segments
        .iter()
        .map(|s| to_filename_segment(s))
        .collect::<Vec<_>>()
        .join("/");
    if is_container {
        format!("{joined}/index")
    } else {
        joined
    }
}

/// Relative link from one output path to another. Paths use forward slashes
/// regardless of the host separator. A self-link without anchor collapses to
/// `./<filename>`.
pub fn relative_link(from: &str, to: &str, anchor: Option<&str>) -> String {
    let strip_extension = |p: &str| match p.rsplit_once('.') {
        Some((base, ext)) if !ext.contains('/') => base.to_string(),
        _ => p.to_string(),
    };
    if strip_extension(from) == strip_extension(to) && anchor.is_none() {
        let filename = to.rsplit('/').next().unwrap_or(to);
        return format!("./{filename}");
    }

    let from_parts: Vec<&str> = from.split('/').collect();
    let to_parts: Vec<&str> = to.split('/').collect();
    let parent = &from_parts[..from_parts.len() - 1];
    let common = parent
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; parent.len() - common];
    parts.extend(&to_parts[common..]);
    let mut link = parts.join("/");
    if let Some(anchor) = anchor {
        link.push('#');
        link.push_str(anchor);
    }
    link
}

/// Where a declaration lives: its page's raw name path from the root, plus
/// an anchor when the declaration is inlined rather than paged.
#[derive(Debug, Clone, PartialEq)]
struct Location {
    name_path: Vec<String>,
    is_container: bool,
    anchor: Option<String>,
}

/// Resolves declaration refs and pages to output paths. Built once per run
/// from the final page tree; never outlives it.
pub struct LocationProvider {
    extension: String,
    by_ref: HashMap<DeclarationRef, Location>,
    page_paths: HashMap<Vec<String>, bool>,
    externals: Vec<ExternalLocationProvider>,
}

impl LocationProvider {
    pub fn build(
        root: &PageNode,
        extension: impl Into<String>,
        externals: Vec<ExternalLocationProvider>,
    ) -> Self {
        let mut provider = Self {
            extension: extension.into(),
            by_ref: HashMap::new(),
            page_paths: HashMap::new(),
            externals,
        };
        let mut name_path = Vec::new();
        provider.register(root, &mut name_path);
        provider
    }

    fn register(&mut self, page: &PageNode, name_path: &mut Vec<String>) {
        self.page_paths
            .insert(name_path.clone(), page.is_container());
        for dri in &page.refs {
            self.by_ref.insert(
                dri.without_target(),
                Location {
                    name_path: name_path.clone(),
                    is_container: page.is_container(),
                    anchor: None,
                },
            );
        }
        for (dri, anchor) in &page.anchored {
            self.by_ref.insert(
                dri.without_target(),
                Location {
                    name_path: name_path.clone(),
                    is_container: page.is_container(),
                    anchor: Some(anchor.clone()),
                },
            );
        }
        for child in &page.children {
            name_path.push(child.name.clone());
            self.register(child, name_path);
            name_path.pop();
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Resolve a ref to a root-relative path (internal) or absolute URL
    /// (external). `None` means unresolved; the caller reports and falls
    /// back to plain text.
    pub fn resolve(&self, dri: &DeclarationRef) -> Option<String> {
        let normalized = dri.without_target();
        if let Some(location) = self.by_ref.get(&normalized) {
            let mut path = format!(
                "{}.{}",
                path_for(&location.name_path, location.is_container),
                self.extension
            );
            if let Some(anchor) = &location.anchor {
                path.push('#');
                path.push_str(anchor);
            }
            return Some(path);
        }
        self.externals
            .iter()
            .find_map(|external| external.resolve(&normalized))
    }

    /// Path of a page identified by its raw name path from the root.
    /// Asking for a page outside the tree is a programmer error.
    pub fn resolve_page(&self, name_path: &[String]) -> Result<String> {
        let is_container = self
            .page_paths
            .get(name_path)
            .copied()
            .ok_or_else(|| Error::UnknownLocation(name_path.join("/")))?;
        Ok(format!(
            "{}.{}",
            path_for(name_path, is_container),
            self.extension
        ))
    }

    /// Relative form of [`resolve`] as seen from the page at `from`.
    pub fn resolve_relative(&self, from: &str, dri: &DeclarationRef) -> Option<String> {
        let absolute = self.resolve(dri)?;
        if absolute.contains("://") {
            // External links stay absolute.
            return Some(absolute);
        }
        let (path, anchor) = match absolute.split_once('#') {
            Some((path, anchor)) => (path, Some(anchor)),
            None => (absolute.as_str(), None),
        };
        Some(relative_link(from, path, anchor))
    }
}
