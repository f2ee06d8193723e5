//! Structured diagnostic messages attached to a build.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use minim_sourcemap::OriginalPosition;
use serde::{Deserialize, Serialize};

/// A structured error or warning produced while minifying an asset.
///
/// `line` and `column` are the position in the minified input as the
/// minifier reported it. `original`, when present, is that position resolved
/// through the asset's source map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The code identifying the kind of diagnostic.
    pub code: DiagnosticCode,
    /// The full, human-readable message.
    pub message: String,
    /// The asset this diagnostic belongs to.
    pub file: Option<String>,
    /// 1-based line in the asset.
    pub line: Option<u32>,
    /// Column in the asset, as the minifier reported it.
    pub column: Option<u32>,
    /// The position in the original source, if it could be resolved.
    pub original: Option<OriginalPosition>,
}

impl Diagnostic {
    /// Creates a new error diagnostic with the given code and message.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message.into())
    }

    /// Creates a new warning diagnostic with the given code and message.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message.into())
    }

    fn new(severity: Severity, code: DiagnosticCode, message: String) -> Self {
        Self {
            severity,
            code,
            message,
            file: None,
            line: None,
            column: None,
            original: None,
        }
    }

    /// Sets the asset this diagnostic refers to.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Sets the 1-based position in the asset.
    pub fn with_position(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Sets the resolved original-source position.
    pub fn with_original(mut self, original: OriginalPosition) -> Self {
        self.original = Some(original);
        self
    }

    /// Replaces the diagnostic code.
    pub fn with_code(mut self, code: DiagnosticCode) -> Self {
        self.code = code;
        self
    }
}
