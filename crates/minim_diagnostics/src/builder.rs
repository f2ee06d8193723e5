//! Conversion of raw minifier output into positioned diagnostics.

use std::sync::LazyLock;

use minim_sourcemap::{OriginalPosition, SourceMap};
use regex::Regex;

use crate::code::DiagnosticCode;
use crate::diagnostic::Diagnostic;
use crate::raw::RawMinifyError;
use crate::shorten::PathShortener;

/// Matches the `[file:line,col]` marker minifiers embed in warning text.
static LOCATION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\[\]]+):([0-9]+),([0-9]+)\]").expect("location marker regex is valid")
});

/// Builds an error diagnostic for a failed asset.
///
/// A stack trace is used verbatim. A position is resolved through `source_map`
/// when possible, in which case the message names both the original and the
/// minified location. Otherwise the message carries the asset name.
pub fn build_error(
    raw: &RawMinifyError,
    asset: &str,
    source_map: Option<&SourceMap>,
    shortener: Option<&dyn PathShortener>,
) -> Diagnostic {
    match raw {
        RawMinifyError::StackPresent { stack } => {
            Diagnostic::error(DiagnosticCode::MINIFY_FAILED, stack.clone()).with_file(asset)
        }
        RawMinifyError::PositionPresent { message, line, col } => {
            let (line, col) = (*line, *col);
            let minified = format!("[{asset}:{line},{col}]");
            match resolve(source_map, line, col) {
                Some(original) => {
                    let location = original_marker(&original, shortener);
                    Diagnostic::error(
                        DiagnosticCode::MINIFY_FAILED,
                        format!("{message} {location}{minified}"),
                    )
                    .with_file(asset)
                    .with_position(line, col)
                    .with_original(original)
                }
                None => Diagnostic::error(
                    DiagnosticCode::MINIFY_FAILED,
                    format!("{message} {minified}"),
                )
                .with_file(asset)
                .with_position(line, col),
            }
        }
        RawMinifyError::MessageOnly { message } => {
            Diagnostic::error(DiagnosticCode::MINIFY_FAILED, format!("{message} [{asset}]"))
                .with_file(asset)
        }
    }
}

/// Builds a warning diagnostic from raw minifier warning text.
///
/// Returns `None` when `filter` is supplied and rejects the warning. The
/// `[file:line,col]` marker in the text is replaced by the resolved original
/// location when `source_map` covers it; otherwise the text is kept as-is.
/// Without an asset name the marker is dropped and no location is attached.
pub fn build_warning(
    text: &str,
    asset: Option<&str>,
    source_map: Option<&SourceMap>,
    shortener: Option<&dyn PathShortener>,
    filter: Option<&dyn Fn(&str, Option<&str>) -> bool>,
) -> Option<Diagnostic> {
    if let Some(filter) = filter {
        if !filter(text, asset) {
            return None;
        }
    }

    let Some(asset) = asset else {
        let stripped = LOCATION_MARKER.replace_all(text, "");
        return Some(Diagnostic::warning(
            DiagnosticCode::MINIFIER_WARNING,
            stripped.trim_end(),
        ));
    };

    let position = LOCATION_MARKER.captures(text).and_then(|caps| {
        let line = caps.get(2)?.as_str().parse::<u32>().ok()?;
        let col = caps.get(3)?.as_str().parse::<u32>().ok()?;
        Some((line, col))
    });

    let Some((line, col)) = position else {
        return Some(Diagnostic::warning(DiagnosticCode::MINIFIER_WARNING, text).with_file(asset));
    };

    let diag = match resolve(source_map, line, col) {
        Some(original) => {
            let stripped = LOCATION_MARKER.replace(text, "");
            let location = original_marker(&original, shortener);
            Diagnostic::warning(
                DiagnosticCode::MINIFIER_WARNING,
                format!("{} {location}[{asset}:{line},{col}]", stripped.trim_end()),
            )
            .with_original(original)
        }
        None => Diagnostic::warning(DiagnosticCode::MINIFIER_WARNING, text),
    };
    Some(diag.with_file(asset).with_position(line, col))
}

fn resolve(source_map: Option<&SourceMap>, line: u32, col: u32) -> Option<OriginalPosition> {
    source_map?.original_position_for(line, col)
}

fn original_marker(original: &OriginalPosition, shortener: Option<&dyn PathShortener>) -> String {
    let source = match shortener {
        Some(s) => s.shorten(&original.source),
        None => original.source.clone(),
    };
    format!("[{source}:{},{}]", original.line, original.column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::Severity;
    use crate::shorten::ContextShortener;
    use minim_sourcemap::build_source_map;
    use serde_json::json;

    fn source_map() -> SourceMap {
        build_source_map(Some(&json!({
            "version": 3,
            "file": "test.js",
            "names": ["bar", "baz", "n"],
            "sources": ["one.js", "two.js"],
            "sourceRoot": "http://example.com/www/js/",
            "mappings": "CAAC,IAAI,IAAM,SAAUA,GAClB,OAAOC,IAAID;CCDb,IAAI,IAAM,SAAUE,GAClB,OAAOA"
        })))
        .unwrap()
    }

    fn shortener() -> ContextShortener {
        ContextShortener::new("http://example.com/www/js/")
    }

    fn position_error() -> RawMinifyError {
        RawMinifyError::from_parts("Message", Some(1), Some(1), None)
    }

    #[test]
    fn error_message_only() {
        let diag = build_error(&RawMinifyError::message("Message"), "test.js", None, None);
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.message, "Message [test.js]");
        assert_eq!(diag.file.as_deref(), Some("test.js"));
        assert!(diag.line.is_none());
    }

    #[test]
    fn error_position_resolved_through_map() {
        let map = source_map();
        let diag = build_error(&position_error(), "test.js", Some(&map), None);
        assert_eq!(
            diag.message,
            "Message [http://example.com/www/js/one.js:1,1][test.js:1,1]"
        );
        let original = diag.original.unwrap();
        assert!(original.source.starts_with("http://example.com/www/js/"));
        assert_eq!((diag.line, diag.column), (Some(1), Some(1)));
    }

    #[test]
    fn error_position_shortened() {
        let map = source_map();
        let s = shortener();
        let diag = build_error(&position_error(), "test.js", Some(&map), Some(&s));
        assert_eq!(diag.message, "Message [./one.js:1,1][test.js:1,1]");
        // the structured location keeps the full source
        assert_eq!(
            diag.original.unwrap().source,
            "http://example.com/www/js/one.js"
        );
    }

    #[test]
    fn error_position_without_map() {
        let diag = build_error(&position_error(), "test.js", None, None);
        assert_eq!(diag.message, "Message [test.js:1,1]");
        assert!(diag.original.is_none());
    }

    #[test]
    fn error_position_outside_map_falls_back() {
        let map = source_map();
        let raw = RawMinifyError::from_parts("Message", Some(40), Some(1), None);
        let diag = build_error(&raw, "test.js", Some(&map), None);
        assert_eq!(diag.message, "Message [test.js:40,1]");
        assert!(diag.original.is_none());
    }

    #[test]
    fn error_column_before_first_mapping_falls_back() {
        let map = source_map();
        // line 1 of the map starts at column 1
        let raw = RawMinifyError::from_parts("Message", Some(1), Some(0), None);
        let diag = build_error(&raw, "test.js", Some(&map), None);
        assert_eq!(diag.message, "Message [test.js:1,0]");
        assert!(diag.original.is_none());
    }

    #[test]
    fn error_resolves_nearest_preceding_mapping() {
        let map = source_map();
        // columns 9 to 17 sit in the segment starting at 9, original column 11
        let raw = RawMinifyError::from_parts("Message", Some(1), Some(12), None);
        let diag = build_error(&raw, "test.js", Some(&map), None);
        assert_eq!(
            diag.message,
            "Message [http://example.com/www/js/one.js:1,11][test.js:1,12]"
        );
    }

    #[test]
    fn error_stack_verbatim() {
        let map = source_map();
        let raw = RawMinifyError::from_parts("Message", Some(1), Some(1), Some("Stack".into()));
        let diag = build_error(&raw, "test.js", Some(&map), None);
        assert_eq!(diag.message, "Stack");
        assert!(diag.line.is_none());
        assert!(diag.original.is_none());
    }

    #[test]
    fn warning_without_asset() {
        let diag = build_warning("Warning [test.js:1,1]", None, None, None, None).unwrap();
        assert_eq!(diag.message, "Warning");
        assert!(diag.file.is_none());
        assert!(diag.line.is_none());
    }

    #[test]
    fn warning_without_map_keeps_marker() {
        let diag = build_warning("Warning [test.js:1,1]", Some("test.js"), None, None, None)
            .unwrap();
        assert_eq!(diag.message, "Warning [test.js:1,1]");
        assert_eq!((diag.line, diag.column), (Some(1), Some(1)));
    }

    #[test]
    fn warning_resolved_through_map() {
        let map = source_map();
        let diag = build_warning("Warning [test.js:1,1]", Some("test.js"), Some(&map), None, None)
            .unwrap();
        assert_eq!(
            diag.message,
            "Warning [http://example.com/www/js/one.js:1,1][test.js:1,1]"
        );
    }

    #[test]
    fn warning_resolved_and_shortened() {
        let map = source_map();
        let s = shortener();
        let diag = build_warning(
            "Warning [test.js:1,1]",
            Some("test.js"),
            Some(&map),
            Some(&s),
            None,
        )
        .unwrap();
        assert_eq!(diag.message, "Warning [./one.js:1,1][test.js:1,1]");
    }

    #[test]
    fn warning_filter_accepting_matches_unfiltered() {
        let map = source_map();
        let s = shortener();
        let accept = |_: &str, _: Option<&str>| true;
        let filtered = build_warning(
            "Warning [test.js:1,1]",
            Some("test.js"),
            Some(&map),
            Some(&s),
            Some(&accept),
        );
        let unfiltered = build_warning(
            "Warning [test.js:1,1]",
            Some("test.js"),
            Some(&map),
            Some(&s),
            None,
        );
        assert!(filtered.is_some());
        assert_eq!(filtered, unfiltered);
    }

    #[test]
    fn warning_filter_rejecting_suppresses() {
        let map = source_map();
        let s = shortener();
        let reject = |_: &str, _: Option<&str>| false;
        let diag = build_warning(
            "Warning [test.js:1,1]",
            Some("test.js"),
            Some(&map),
            Some(&s),
            Some(&reject),
        );
        assert!(diag.is_none());
    }

    #[test]
    fn warning_filter_sees_text_and_asset() {
        let only_vendor = |text: &str, asset: Option<&str>| {
            !(text.contains("Dropping") && asset == Some("vendor.js"))
        };
        assert!(build_warning("Dropping x [vendor.js:1,1]", Some("vendor.js"), None, None, Some(&only_vendor)).is_none());
        assert!(build_warning("Dropping x [app.js:1,1]", Some("app.js"), None, None, Some(&only_vendor)).is_some());
    }

    #[test]
    fn warning_without_marker() {
        let diag = build_warning("Side effects in initialization", Some("a.js"), None, None, None)
            .unwrap();
        assert_eq!(diag.message, "Side effects in initialization");
        assert!(diag.line.is_none());
    }
}
