//! unidoc — generate cross-platform documentation from declaration trees.
//!
//! `unidoc trees/*.json -o docs/` merges one tree per compilation target
//! and writes one documentation set with per-target attribution.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

use unidoc::location::external::ExternalLocationProvider;
use unidoc::manifest::PackageList;
use unidoc::pipeline::{self, GenerationConfig, GenerationOutcome};

#[derive(Parser)]
#[command(
    name = "unidoc",
    about = "Merge per-target declaration trees and render documentation"
)]
struct Cli {
    /// Input declaration trees, one JSON file per target (glob patterns
    /// supported).
    files: Vec<String>,

    /// Output directory
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Output format: markdown (default), html
    #[arg(short = 'f', long, default_value = "markdown")]
    format: String,

    /// Override the merged module name
    #[arg(long)]
    module_name: Option<String>,

    /// Link against external documentation: URL=PATH, where PATH is the
    /// local copy of that documentation's package-list. Repeatable.
    #[arg(long, value_name = "URL=PATH")]
    external_docs: Vec<String>,

    /// Drop packages whose name matches this regex. Repeatable; when
    /// patterns overlap, the longest match decides.
    #[arg(long, value_name = "REGEX")]
    suppress_package: Vec<String>,

    /// Keep packages whose name matches this regex, overriding a broader
    /// --suppress-package. Repeatable.
    #[arg(long, value_name = "REGEX")]
    keep_package: Vec<String>,

    /// Exit non-zero when the run produced warnings. Output is still written.
    #[arg(long)]
    fail_on_warning: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "unidoc=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    anyhow::ensure!(!cli.files.is_empty(), "no input files given");

    let input_files = expand_globs(&cli.files)?;
    anyhow::ensure!(!input_files.is_empty(), "no input files matched");

    let mut config = GenerationConfig::new(&cli.output, &cli.format);
    config.module_name = cli.module_name.clone();
    config.fail_on_warning = cli.fail_on_warning;
    for pattern in &cli.suppress_package {
        config
            .package_options
            .add(pattern, true)
            .with_context(|| format!("bad --suppress-package pattern: {pattern}"))?;
    }
    for pattern in &cli.keep_package {
        config
            .package_options
            .add(pattern, false)
            .with_context(|| format!("bad --keep-package pattern: {pattern}"))?;
    }
    for spec in &cli.external_docs {
        config.externals.push(load_external(spec)?);
    }

    match pipeline::run(&input_files, config)? {
        GenerationOutcome::Finished => {}
        GenerationOutcome::NothingToDocument => {
            eprintln!("nothing to document");
        }
    }
    Ok(())
}

/// Parse one `URL=PATH` pair into an external location provider.
fn load_external(spec: &str) -> Result<ExternalLocationProvider> {
    let (url, path) = spec
        .split_once('=')
        .with_context(|| format!("--external-docs expects URL=PATH, got: {spec}"))?;
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read package-list: {path}"))?;
    let list = PackageList::parse(&text)
        .with_context(|| format!("failed to parse package-list: {path}"))?;
    Ok(ExternalLocationProvider::new(url, list))
}

/// Expand glob patterns into a sorted, deduplicated list of files.
fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        let matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {pattern}"))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            eprintln!("warning: no files matched: {pattern}");
        }
        files.extend(matches);
    }
    files.sort();
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_spec_requires_separator() {
        assert!(load_external("https://example.org/docs").is_err());
    }

    #[test]
    fn globs_deduplicate_and_sort() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.json");
        fs::write(&a, "{}").unwrap();
        fs::write(&b, "{}").unwrap();

        let pattern = dir.path().join("*.json").to_string_lossy().to_string();
        let listed = expand_globs(&[pattern.clone(), a.to_string_lossy().to_string(), pattern])
            .unwrap();
        assert_eq!(listed, vec![a, b]);
    }
}
