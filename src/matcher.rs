//! Per-package options selected by regex matchers.
//!
//! When several patterns match one package, the longest pattern string wins;
//! two patterns of equal length tie-break by registration order (the earlier
//! registration wins).

use regex::Regex;

use crate::error::Result;
use crate::model::ModuleDecl;
use crate::transform::Transform;

#[derive(Debug)]
struct PackageRule {
    pattern: Regex,
    suppress: bool,
}

/// Ordered set of package rules. Rules are consulted per package name; the
/// default for an unmatched package is "not suppressed".
#[derive(Debug, Default)]
pub struct PackageOptions {
    rules: Vec<PackageRule>,
}

impl PackageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pattern: &str, suppress: bool) -> Result<()> {
        self.rules.push(PackageRule {
            pattern: Regex::new(pattern)?,
            suppress,
        });
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True when the winning rule for this package suppresses it.
    pub fn suppresses(&self, package: &str) -> bool {
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.pattern.is_match(package))
            // Longest pattern wins; max_by_key keeps the *last* of equal keys,
            // so invert the registration index to prefer the first.
            .max_by_key(|(i, rule)| (rule.pattern.as_str().len(), usize::MAX - i))
            .map(|(_, rule)| rule.suppress)
            .unwrap_or(false)
    }

    /// The pre-merge transform that drops suppressed packages from a tree.
    pub fn into_transform(self) -> Transform<ModuleDecl> {
        Transform::new("suppress-packages", move |mut tree: ModuleDecl, _ctx| {
            tree.packages.retain(|pkg| !self.suppresses(&pkg.name));
            tree
        })
    }
}
