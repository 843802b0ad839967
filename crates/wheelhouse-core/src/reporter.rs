//! Reporter trait for dependency injection
//!
//! Core logic reports skipped wheels, divergent CUDA sources and ambiguous
//! matches through this trait instead of printing, so the CLI decides how
//! they look and tests can assert on them.

use std::path::Path;

pub trait Reporter: Send + Sync {
    /// Indicates a new section or phase has started (e.g. "Indexing").
    fn section(&self, title: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a non-fatal warning.
    fn warning(&self, msg: &str);

    /// A wheel was left out of the index.
    fn skipped(&self, path: &Path, reason: &str);
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn skipped(&self, _: &Path, _: &str) {}
}

/// Collects every message; used by tests to assert on diagnostics.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    pub(crate) warnings: std::sync::Mutex<Vec<String>>,
    pub(crate) skipped: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl Reporter for RecordingReporter {
    fn section(&self, _: &str) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, msg: &str) {
        self.warnings.lock().unwrap().push(msg.to_string());
    }
    fn skipped(&self, path: &Path, reason: &str) {
        self.skipped
            .lock()
            .unwrap()
            .push(format!("{}: {reason}", path.display()));
    }
}
