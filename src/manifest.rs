//! The package-list manifest: a newline-separated list of package names,
//! preceded by `$unidoc.` parameter lines. Written once per generation run
//! at the output root; read when resolving references into other,
//! already-generated documentation sets.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::pages::{PageKind, PageNode};

/// Prefix of manifest parameter lines.
pub const PARAM_PREFIX: &str = "$unidoc.";

/// Separator between lookup key and path in a `location` parameter.
pub const LOCATION_SEPARATOR: char = '\u{1f}';

/// Name of the manifest file at the output root.
pub const FILE_NAME: &str = "package-list";

/// Known manifest format variants. The tag is part of the wire contract:
/// canonical-ref lookup keys are only stable across versions sharing a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// Current naming: canonical-ref lookup keys, case-escaped segments.
    HtmlV1,
    /// Legacy naming: `package.ClassName` lookup keys.
    Javadoc,
}

impl ManifestFormat {
    pub fn tag(self) -> &'static str {
        match self {
            Self::HtmlV1 => "html-v1",
            Self::Javadoc => "javadoc",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "html-v1" => Some(Self::HtmlV1),
            "javadoc" => Some(Self::Javadoc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageList {
    pub format: ManifestFormat,
    pub link_extension: String,
    /// Module prefix for multi-module layouts, inserted between root URL and
    /// package directory on resolution.
    pub module: Option<String>,
    pub packages: BTreeSet<String>,
    /// Direct lookup table: format-specific key to relative path.
    pub locations: BTreeMap<String, String>,
}

impl PackageList {
    /// Parse manifest text. A parameter line without `:` is a malformed
    /// fragment header and aborts the run; unknown parameter keys are
    /// ignored for forward compatibility.
    pub fn parse(text: &str) -> Result<Self> {
        // Legacy manifests carry no format line at all.
        let mut format = ManifestFormat::Javadoc;
        let mut link_extension = "html".to_string();
        let mut module = None;
        let mut packages = BTreeSet::new();
        let mut locations = BTreeMap::new();

        for line in text.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let Some(param) = line.strip_prefix(PARAM_PREFIX) else {
                packages.insert(line.to_string());
                continue;
            };
            let (key, value) = param
                .split_once(':')
                .ok_or_else(|| Error::MalformedManifest(line.to_string()))?;
            match key {
                "format" => {
                    format = ManifestFormat::from_tag(value)
                        .ok_or_else(|| Error::MalformedManifest(line.to_string()))?;
                }
                "linkExtension" => link_extension = value.to_string(),
                "module" => module = Some(value.to_string()),
                "location" => {
                    let (dri, path) = value
                        .split_once(LOCATION_SEPARATOR)
                        .ok_or_else(|| Error::MalformedManifest(line.to_string()))?;
                    locations.insert(dri.to_string(), path.to_string());
                }
                _ => {
                    tracing::debug!("ignoring unknown package-list parameter {key:?}");
                }
            }
        }

        Ok(Self {
            format,
            link_extension,
            module,
            packages,
            locations,
        })
    }

    /// Render back to manifest text. Parameters first, then package names,
    /// both in sorted order so output is reproducible.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{PARAM_PREFIX}format:{}\n", self.format.tag()));
        out.push_str(&format!(
            "{PARAM_PREFIX}linkExtension:{}\n",
            self.link_extension
        ));
        if let Some(module) = &self.module {
            out.push_str(&format!("{PARAM_PREFIX}module:{module}\n"));
        }
        for (dri, path) in &self.locations {
            out.push_str(&format!(
                "{PARAM_PREFIX}location:{dri}{LOCATION_SEPARATOR}{path}\n"
            ));
        }
        for package in &self.packages {
            out.push_str(package);
            out.push('\n');
        }
        out
    }

    /// Fold the page tree into a manifest: distinct package names from every
    /// package page, plus direct-lookup lines for inlined declarations
    /// (their addresses are anchors, which path construction alone cannot
    /// recover).
    pub fn from_pages(root: &PageNode, module: Option<String>, link_extension: &str) -> Self {
        let mut packages = BTreeSet::new();
        let mut locations = BTreeMap::new();

        let mut segments: Vec<String> = Vec::new();
        collect(root, &mut segments, &mut packages, &mut locations, link_extension);

        fn collect(
            page: &PageNode,
            segments: &mut Vec<String>,
            packages: &mut BTreeSet<String>,
            locations: &mut BTreeMap<String, String>,
            link_extension: &str,
        ) {
            if page.kind == PageKind::Package {
                packages.insert(page.name.clone());
            }
            let page_path = crate::location::path_for(segments, page.is_container());
            for (dri, anchor) in &page.anchored {
                locations.insert(
                    dri.without_target().to_canonical_string(),
                    format!("{page_path}.{link_extension}#{anchor}"),
                );
            }
            for child in &page.children {
                segments.push(child.name.clone());
                collect(child, segments, packages, locations, link_extension);
                segments.pop();
            }
        }

        Self {
            format: ManifestFormat::HtmlV1,
            link_extension: link_extension.to_string(),
            module,
            packages,
            locations,
        }
    }
}
