//! The result of one build.

use minim_diagnostics::{Diagnostic, DiagnosticRenderer};

/// Counters for one build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Assets the FILTER stage selected.
    pub eligible: usize,
    /// Assets served from the cache without dispatching a task.
    pub cache_hits: usize,
    /// Times the minifier was actually called.
    pub minifier_calls: usize,
    /// Assets that ended in an error and kept their original content.
    pub failed: usize,
    /// Companion comment assets written.
    pub comment_files: usize,
}

/// Diagnostics and counters produced by [`Orchestrator::run`](crate::Orchestrator::run).
///
/// Both lists are in FILTER order across assets and emission order within
/// an asset.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Error diagnostics.
    pub errors: Vec<Diagnostic>,
    /// Warning diagnostics.
    pub warnings: Vec<Diagnostic>,
    /// Build counters.
    pub stats: BuildStats,
}

impl BuildReport {
    /// Returns `true` if any asset failed.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Files a diagnostic under errors or warnings by its severity.
    pub fn push(&mut self, diag: Diagnostic) {
        if diag.severity.is_error() {
            self.errors.push(diag);
        } else {
            self.warnings.push(diag);
        }
    }

    /// Renders every diagnostic, errors first.
    pub fn render(&self, renderer: &dyn DiagnosticRenderer) -> String {
        self.errors
            .iter()
            .chain(&self.warnings)
            .map(|d| renderer.render(d))
            .collect()
    }
}
