//! Diagnostic creation for minifier failures and warnings.
//!
//! Raw minifier output arrives as a [`RawMinifyError`] or a warning string with
//! an embedded `[file:line,col]` marker. [`build_error`] and [`build_warning`]
//! turn these into structured [`Diagnostic`]s, resolving minified positions to
//! original sources through a [`SourceMap`](minim_sourcemap::SourceMap) when one
//! is available. [`TerminalRenderer`] formats them for humans.

#![warn(missing_docs)]

pub mod builder;
pub mod code;
pub mod diagnostic;
pub mod raw;
pub mod renderer;
pub mod severity;
pub mod shorten;

pub use builder::{build_error, build_warning};
pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use raw::RawMinifyError;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use shorten::{ContextShortener, PathShortener};
