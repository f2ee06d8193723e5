//! The minifier contract.

use minim_diagnostics::RawMinifyError;
use serde_json::Value;

/// What a successful minification produces.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MinifyOutput {
    /// The minified code.
    pub code: String,
    /// The output source map in raw JSON form.
    pub map: Option<Value>,
    /// Warning texts, in emission order. A `[file:line,col]` marker in the
    /// text locates the warning in the minifier's input.
    pub warnings: Vec<String>,
    /// Comments removed from the code that must be preserved elsewhere.
    pub extracted_comments: Vec<String>,
}

impl MinifyOutput {
    /// Output with just code.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }
}

/// An external minifier.
///
/// Implementations must be deterministic: identical source and options must
/// produce identical output, or cached results will be wrong. A minifier is
/// called from several worker threads at once.
pub trait Minifier: Send + Sync {
    /// Stable identifier, part of every cache key.
    fn name(&self) -> &str;

    /// Version string, part of every cache key. Changing it invalidates the
    /// cache.
    fn version(&self) -> &str;

    /// Minifies `source` with `options`.
    ///
    /// When `options` carries `"sourceMap": true` an output map is expected
    /// but not required.
    fn minify(&self, source: &str, options: &Value) -> Result<MinifyOutput, RawMinifyError>;
}
