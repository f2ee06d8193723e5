//! Diagnostic codes with category prefixes for structured error identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Error diagnostics, prefixed with `E`.
    Error,
    /// Warning diagnostics, prefixed with `W`.
    Warning,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a numeric identifier.
///
/// Displayed as the category prefix followed by a zero-padded 3-digit number,
/// e.g., `E100`, `W101`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// The minifier rejected an asset.
    pub const MINIFY_FAILED: Self = Self::new(Category::Error, 100);
    /// The minifier panicked while processing an asset.
    pub const MINIFIER_PANICKED: Self = Self::new(Category::Error, 101);
    /// The minifier reported a warning.
    pub const MINIFIER_WARNING: Self = Self::new(Category::Warning, 100);
    /// Extracted comments could not be written because the target asset exists.
    pub const COMMENTS_CONFLICT: Self = Self::new(Category::Warning, 101);
    /// An asset's input source map was present but malformed and was ignored.
    pub const INVALID_SOURCE_MAP: Self = Self::new(Category::Warning, 102);

    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
