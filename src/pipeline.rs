//! The generation pipeline: load, pre-merge transforms, merge, post-merge
//! transforms, pages, page transforms, render, report.
//!
//! Each stage is pure over its tree; the only side effects are file writes
//! during rendering and counter bumps on the run reporter. The fail-on-warning
//! gate fires at report time, after all output has been written.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use crate::error::Result;
use crate::location::external::ExternalLocationProvider;
use crate::location::LocationProvider;
use crate::matcher::PackageOptions;
use crate::merge::merge_modules;
use crate::model::ModuleDecl;
use crate::pages::{self, PageNode};
use crate::render::{self, OutputWriter};
use crate::transform::{apply_per_target, Pipeline, RunContext, Transform};

/// How a generation run ended. `NothingToDocument` is a graceful exit, not
/// an error: every input tree was empty after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    Finished,
    NothingToDocument,
}

pub struct GenerationConfig {
    pub output: PathBuf,
    pub format: String,
    /// Overrides the merged module name when set.
    pub module_name: Option<String>,
    pub fail_on_warning: bool,
    pub package_options: PackageOptions,
    pub externals: Vec<ExternalLocationProvider>,
    /// Extra transforms applied to each per-target tree before the merge.
    /// The built-in package filter is appended after these.
    pub pre_merge: Vec<Transform<ModuleDecl>>,
    /// Extra transforms applied once to the unified tree after the merge.
    pub post_merge: Vec<Transform<ModuleDecl>>,
    /// Extra transforms applied to the page tree. The built-in navigation
    /// transform is appended after these.
    pub page_transforms: Vec<Transform<PageNode>>,
}

impl GenerationConfig {
    pub fn new(output: impl Into<PathBuf>, format: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            format: format.into(),
            module_name: None,
            fail_on_warning: false,
            package_options: PackageOptions::new(),
            externals: Vec::new(),
            pre_merge: Vec::new(),
            post_merge: Vec::new(),
            page_transforms: Vec::new(),
        }
    }
}

/// Read one serialized per-target declaration tree per input file.
pub fn load_inputs(paths: &[PathBuf]) -> Result<Vec<ModuleDecl>> {
    paths
        .iter()
        .map(|path| {
            tracing::debug!(path = %path.display(), "loading declaration tree");
            let text = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&text)?)
        })
        .collect()
}

/// Run the whole pipeline over already-loaded per-target trees.
pub fn generate(inputs: Vec<ModuleDecl>, config: GenerationConfig) -> Result<GenerationOutcome> {
    let started = Instant::now();
    let ctx = RunContext::new(config.format.clone());

    // Per-target stage: runs before any merging, in parallel over targets.
    let mut pre_merge = config.pre_merge;
    pre_merge.push(config.package_options.into_transform());
    let pre_merge = Pipeline::new(pre_merge)?;
    let inputs = apply_per_target(&pre_merge, inputs, &ctx);

    let mut merged = match merge_modules(inputs)? {
        Some(module) => module,
        None => {
            tracing::info!("no declarations to document, skipping output");
            return Ok(GenerationOutcome::NothingToDocument);
        }
    };
    if let Some(name) = config.module_name {
        merged.name = name;
    }
    tracing::debug!(
        module = %merged.name,
        targets = merged.targets.len(),
        packages = merged.packages.len(),
        "merged declaration trees"
    );

    // Unified stage: sees one tree with every target's attributions in it.
    let post_merge = Pipeline::new(config.post_merge)?;
    let merged = post_merge.apply(merged, &ctx);

    let page_root = pages::build_pages(&merged);
    let mut page_transforms = config.page_transforms;
    page_transforms.push(pages::navigation_transform());
    let page_pipeline: Pipeline<PageNode> = Pipeline::new(page_transforms)?;
    tracing::debug!(order = ?page_pipeline.names(), "page transform order");
    let page_root = page_pipeline.apply(page_root, &ctx);

    let renderer = render::create_renderer(&config.format)?;
    let locations =
        LocationProvider::build(&page_root, renderer.file_extension(), config.externals);
    let writer = OutputWriter::new(&config.output);
    render::render_all(&page_root, &locations, renderer.as_ref(), &writer, &ctx)?;

    tracing::info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        warnings = ctx.reporter.warning_count(),
        errors = ctx.reporter.error_count(),
        "documentation written to {}",
        config.output.display()
    );
    ctx.reporter.check(config.fail_on_warning)?;
    Ok(GenerationOutcome::Finished)
}

/// Convenience entry point: load input files, then generate.
pub fn run(input_files: &[PathBuf], config: GenerationConfig) -> Result<GenerationOutcome> {
    let inputs = load_inputs(input_files)?;
    generate(inputs, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::{DeclarationRef, TargetId};
    use crate::model::{Classlike, ClasslikeKind, Member, MemberKind, Overlay, PackageDecl};
    use std::collections::BTreeSet;

    fn jvm() -> TargetId {
        TargetId::new("demo", "jvm")
    }

    fn js() -> TargetId {
        TargetId::new("demo", "js")
    }

    fn member(name: &str, target: TargetId) -> Member {
        Member {
            dri: DeclarationRef::classlike("example", "Foo")
                .with_callable(crate::ident::Callable::function(name, Vec::new())),
            name: name.into(),
            kind: MemberKind::Function,
            targets: BTreeSet::from([target.clone()]),
            documentation: Overlay::new(),
            visibility: Overlay::new(),
            decl_type: Overlay::of(target, "Unit".into()),
            params: Vec::new(),
        }
    }

    fn tree_for(target: TargetId, member_name: &str) -> ModuleDecl {
        ModuleDecl {
            name: "demo".into(),
            targets: BTreeSet::from([target.clone()]),
            documentation: Overlay::new(),
            packages: vec![PackageDecl {
                dri: DeclarationRef::package("example"),
                name: "example".into(),
                targets: BTreeSet::from([target.clone()]),
                documentation: Overlay::new(),
                classlikes: vec![Classlike {
                    dri: DeclarationRef::classlike("example", "Foo"),
                    name: "Foo".into(),
                    kind: ClasslikeKind::Class,
                    targets: BTreeSet::from([target.clone()]),
                    documentation: Overlay::new(),
                    visibility: Overlay::new(),
                    modifiers: Overlay::new(),
                    nested: Vec::new(),
                    members: vec![member(member_name, target)],
                }],
                members: Vec::new(),
            }],
        }
    }

    #[test]
    fn end_to_end_two_target_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = GenerationConfig::new(dir.path(), "markdown");

        let outcome =
            generate(vec![tree_for(jvm(), "bar"), tree_for(js(), "baz")], config).unwrap();
        assert_eq!(outcome, GenerationOutcome::Finished);

        // Module root, package page, the Foo page, the navigation aux page
        // and the package-list manifest.
        assert!(dir.path().join("index.md").exists());
        assert!(dir.path().join("example").join("index.md").exists());
        let foo = fs::read_to_string(
            dir.path().join("example").join("-foo").join("index.md"),
        )
        .unwrap();
        assert!(foo.contains("bar"), "{foo}");
        assert!(foo.contains("baz"), "{foo}");
        assert!(dir.path().join("navigation.md").exists());

        let manifest = fs::read_to_string(dir.path().join("package-list")).unwrap();
        assert!(manifest.contains("example"));
        assert!(manifest.contains("$unidoc.format:html-v1"));
    }

    #[test]
    fn empty_inputs_skip_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = GenerationConfig::new(dir.path(), "markdown");

        let empty = ModuleDecl {
            name: "demo".into(),
            targets: BTreeSet::from([jvm()]),
            documentation: Overlay::new(),
            packages: Vec::new(),
        };
        let outcome = generate(vec![empty], config).unwrap();
        assert_eq!(outcome, GenerationOutcome::NothingToDocument);
        assert!(!dir.path().join("package-list").exists());
    }

    #[test]
    fn suppressed_package_never_reaches_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = GenerationConfig::new(dir.path(), "markdown");
        config.package_options.add(r"example", true).unwrap();

        let outcome = generate(vec![tree_for(jvm(), "bar")], config).unwrap();
        // Suppressing the only package leaves nothing to document.
        assert_eq!(outcome, GenerationOutcome::NothingToDocument);
    }

    #[test]
    fn post_merge_transform_sees_the_unified_tree() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = GenerationConfig::new(dir.path(), "markdown");
        config.post_merge.push(Transform::new(
            "stamp-target-count",
            |mut tree: ModuleDecl, _ctx| {
                tree.name = format!("{} ({} targets)", tree.name, tree.targets.len());
                tree
            },
        ));

        generate(vec![tree_for(jvm(), "bar"), tree_for(js(), "baz")], config).unwrap();

        // Ran exactly once, after the join point: both targets are visible.
        let root = fs::read_to_string(dir.path().join("index.md")).unwrap();
        assert!(root.starts_with("# demo (2 targets)\n"), "{root}");
    }

    #[test]
    fn registered_page_transform_runs_before_builtin_navigation() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = GenerationConfig::new(dir.path(), "markdown");
        config.page_transforms.push(Transform::new(
            "seen-before-navigation",
            |root: PageNode, _ctx| {
                assert!(!root.children.iter().any(|c| c.name == "navigation"));
                root
            },
        ));

        generate(vec![tree_for(jvm(), "bar")], config).unwrap();
        assert!(dir.path().join("navigation.md").exists());
    }

    #[test]
    fn module_name_override_applies() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = GenerationConfig::new(dir.path(), "markdown");
        config.module_name = Some("renamed".into());

        generate(vec![tree_for(jvm(), "bar")], config).unwrap();
        let root = fs::read_to_string(dir.path().join("index.md")).unwrap();
        assert!(root.starts_with("# renamed\n"), "{root}");
    }
}
