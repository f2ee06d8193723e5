//! Diagnostic rendering for terminal output.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic into a formatted string.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// Produces output like:
/// ```text
/// error[E100]: Unexpected token [./src/app.js:4,10][main.js:1,120]
///   --> main.js:1:120
///    = note: original location ./src/app.js:4,10
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn header(&self, diag: &Diagnostic) -> String {
        let label = format!("{}[{}]", diag.severity, diag.code);
        if !self.color {
            return label;
        }
        let color = match diag.severity {
            Severity::Error => "31",
            Severity::Warning => "33",
        };
        format!("\x1b[1;{color}m{label}\x1b[0m")
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = format!("{}: {}\n", self.header(diag), diag.message);

        if let Some(file) = &diag.file {
            match (diag.line, diag.column) {
                (Some(line), Some(col)) => out.push_str(&format!("  --> {file}:{line}:{col}\n")),
                _ => out.push_str(&format!("  --> {file}\n")),
            }
        }

        if let Some(original) = &diag.original {
            out.push_str(&format!("   = note: original location {original}\n"));
        }

        out
    }
}
