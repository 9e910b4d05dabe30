//! Error taxonomy and the run-scoped warning/error reporter.
//!
//! Fatal/structural failures are variants of [`Error`] and abort the run.
//! Recoverable conditions are counted on the [`Reporter`] and logged, never
//! returned as `Err`: unresolved references are warnings, duplicate page
//! writes are errors. Either counter trips the fail-on-warning gate.

use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;

/// Fatal failures. Each variant aborts the generation run.
#[derive(Debug, Error)]
pub enum Error {
    /// A parameter line in a package-list manifest had no `:` separator.
    #[error("malformed package-list header line: {0:?}")]
    MalformedManifest(String),

    /// Two merge inputs both claimed the same target for the same declaration.
    #[error("conflicting attribution: target {target} claimed twice for {dri}")]
    AttributionCollision { dri: String, target: String },

    /// A location was requested for a page that is not part of the page tree.
    /// This is a programmer error, not a recoverable condition.
    #[error("page {0:?} does not belong to the current page tree")]
    UnknownLocation(String),

    /// The before/after constraints of registered transforms form a cycle.
    #[error("unsatisfiable transform ordering involving {0:?}")]
    TransformCycle(String),

    /// A transform constraint referenced a name that was never registered.
    #[error("transform {0:?} constrains unknown transform {1:?}")]
    UnknownTransform(String, String),

    #[error("unknown format: {0}. Use markdown or html")]
    UnknownFormat(String),

    /// Raised at report time under `--fail-on-warning`. Output has already
    /// been written when this is returned.
    #[error("generation finished with {warnings} warning(s) and {errors} error(s)")]
    FailedOnWarnings { warnings: usize, errors: usize },

    #[error("invalid package matcher: {0}")]
    InvalidPackagePattern(#[from] regex::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Accumulates warning/error counts across one generation run.
///
/// Shared between parallel renderer workers; counters are atomic so a
/// `&Reporter` can be handed out freely.
#[derive(Debug, Default)]
pub struct Reporter {
    warnings: AtomicUsize,
    errors: AtomicUsize,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&self, message: &str) {
        self.warnings.fetch_add(1, Ordering::Relaxed);
        tracing::warn!("{message}");
    }

    pub fn error(&self, message: &str) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        tracing::error!("{message}");
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// The report-stage gate: fatal iff any counter is non-zero and the
    /// fail-on-warning policy is set. Output is never rolled back.
    pub fn check(&self, fail_on_warning: bool) -> Result<()> {
        let warnings = self.warning_count();
        let errors = self.error_count();
        if fail_on_warning && (warnings > 0 || errors > 0) {
            return Err(Error::FailedOnWarnings { warnings, errors });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_reporter_passes_gate() {
        let reporter = Reporter::new();
        assert!(reporter.check(true).is_ok());
    }

    #[test]
    fn warning_trips_gate_only_when_policy_set() {
        let reporter = Reporter::new();
        reporter.warn("something odd");
        assert!(reporter.check(false).is_ok());
        assert!(matches!(
            reporter.check(true),
            Err(Error::FailedOnWarnings { warnings: 1, errors: 0 })
        ));
    }

    #[test]
    fn error_trips_gate_even_without_warnings() {
        let reporter = Reporter::new();
        reporter.error("could not write page");
        assert!(reporter.check(false).is_ok());
        assert!(matches!(
            reporter.check(true),
            Err(Error::FailedOnWarnings { warnings: 0, errors: 1 })
        ));
    }
}
