//! Renderer module: trait-based format dispatch, the page-tree walk and the
//! duplicate-guarded output writer.
//!
//! Rendering pages in parallel is safe once the tree and location provider
//! are fixed; every page write funnels through one shared registry of
//! already-written paths.

pub mod html;
pub mod markdown;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rayon::prelude::*;

use crate::error::{Error, Reporter, Result};
use crate::ident::DeclarationRef;
use crate::location::LocationProvider;
use crate::manifest::{self, PackageList};
use crate::pages::PageNode;
use crate::transform::RunContext;

/// Everything a format backend needs while rendering one page.
pub struct RenderContext<'a> {
    pub locations: &'a LocationProvider,
    pub reporter: &'a Reporter,
}

impl RenderContext<'_> {
    /// Resolve a content link relative to the rendering page, falling back
    /// to `None` (plain text) with a warning when the ref is unknown.
    pub fn link(&self, page_path: &str, dri: &DeclarationRef, text: &str) -> Option<String> {
        match self.locations.resolve_relative(page_path, dri) {
            Some(address) => Some(address),
            None => {
                self.reporter
                    .warn(&format!("unresolved reference {dri} (rendered {text:?} as plain text)"));
                None
            }
        }
    }
}

/// Renders one page of the tree into a specific output format.
pub trait Renderer: Send + Sync {
    fn render_page(&self, page: &PageNode, page_path: &str, ctx: &RenderContext<'_>) -> String;
    fn file_extension(&self) -> &str;
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str) -> Result<Box<dyn Renderer>> {
    match format {
        "markdown" | "md" => Ok(Box::new(markdown::MarkdownRenderer)),
        "html" => Ok(Box::new(html::HtmlRenderer)),
        _ => Err(Error::UnknownFormat(format.to_string())),
    }
}

/// Writes output files under one root. Page writes go through a shared
/// registry: the second write to a path is reported as an error and skipped,
/// never overwritten. Resource writes (package-list, assets) bypass the
/// registry.
pub struct OutputWriter {
    root: PathBuf,
    written: Mutex<HashSet<String>>,
}

impl OutputWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            written: Mutex::new(HashSet::new()),
        }
    }

    pub fn write_page(&self, rel_path: &str, contents: &str, reporter: &Reporter) -> Result<()> {
        {
            let mut written = self.written.lock().expect("writer registry lock");
            if !written.insert(rel_path.to_string()) {
                reporter.error(&format!("duplicate write to {rel_path}, skipping"));
                return Ok(());
            }
        }
        self.write(rel_path, contents)
    }

    pub fn write_resource(&self, rel_path: &str, contents: &str) -> Result<()> {
        self.write(rel_path, contents)
    }

    fn write(&self, rel_path: &str, contents: &str) -> Result<()> {
        // rel_path always uses forward slashes; map onto the host separator.
        let target = rel_path
            .split('/')
            .fold(self.root.clone(), |p, seg| p.join(seg));
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, contents)?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Render the whole page tree: the package-list manifest first, then every
/// page in parallel.
pub fn render_all(
    root: &PageNode,
    locations: &LocationProvider,
    renderer: &dyn Renderer,
    writer: &OutputWriter,
    ctx: &RunContext,
) -> Result<()> {
    let list = PackageList::from_pages(
        root,
        Some(root.name.clone()),
        renderer.file_extension(),
    );
    writer.write_resource(manifest::FILE_NAME, &list.render())?;

    let mut jobs: Vec<(&PageNode, Vec<String>)> = Vec::new();
    collect_jobs(root, &mut Vec::new(), &mut jobs);

    let render_ctx = RenderContext {
        locations,
        reporter: &ctx.reporter,
    };
    jobs.into_par_iter().try_for_each(|(page, name_path)| {
        let page_path = locations.resolve_page(&name_path)?;
        let output = renderer.render_page(page, &page_path, &render_ctx);
        writer.write_page(&page_path, &output, &ctx.reporter)
    })
}

fn collect_jobs<'a>(
    page: &'a PageNode,
    name_path: &mut Vec<String>,
    jobs: &mut Vec<(&'a PageNode, Vec<String>)>,
) {
    jobs.push((page, name_path.clone()));
    for child in &page.children {
        name_path.push(child.name.clone());
        collect_jobs(child, name_path, jobs);
        name_path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_format_is_rejected() {
        assert!(matches!(
            create_renderer("xml"),
            Err(Error::UnknownFormat(_))
        ));
        assert!(create_renderer("markdown").is_ok());
        assert!(create_renderer("html").is_ok());
    }

    #[test]
    fn duplicate_page_write_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path());
        let reporter = Reporter::new();

        writer.write_page("p/index.md", "first", &reporter).unwrap();
        writer.write_page("p/index.md", "second", &reporter).unwrap();

        let contents = fs::read_to_string(dir.path().join("p").join("index.md")).unwrap();
        assert_eq!(contents, "first");
        assert_eq!(reporter.error_count(), 1);
        assert_eq!(reporter.warning_count(), 0);
    }

    #[test]
    fn resource_writes_bypass_the_registry() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path());

        writer.write_resource("package-list", "p1\n").unwrap();
        writer.write_resource("package-list", "p1\np2\n").unwrap();

        let contents = fs::read_to_string(dir.path().join("package-list")).unwrap();
        assert_eq!(contents, "p1\np2\n");
    }
}
