//! A scriptable minifier for pipeline tests.
//!
//! `FakeMinifier` strips whitespace line by line and joins the lines, emitting
//! a source map that maps each joined line back to its input line. Source
//! text can steer it:
//!
//! - a line starting with `/*!` is extracted as a license comment
//! - a line containing `unused` produces a warning located at that line
//! - `syntax-error` on line N fails with a position on line N, column 1
//! - `stack-error` fails with a stack trace
//! - `panic-now` panics
//! - `delay:<ms>` sleeps that long before answering

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use minim_diagnostics::RawMinifyError;
use minim_pipeline::{AbortHandle, Minifier, MinifyOutput};
use minim_sourcemap::{Mappings, Segment, SourceRef};
use serde_json::{json, Value};

/// Name the fake minifier gives its input in warnings and maps.
pub const INPUT_NAME: &str = "input.js";

#[derive(Default)]
pub struct FakeMinifier {
    pub calls: AtomicUsize,
    running: AtomicUsize,
    pub peak: AtomicUsize,
    /// Delay per call unless the source carries a `delay:<ms>` marker.
    pub base_delay_ms: u64,
    /// Aborted at the start of the first call, when set.
    pub abort_on_call: OnceLock<AbortHandle>,
}

impl FakeMinifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_delay(ms: u64) -> Arc<Self> {
        Arc::new(Self {
            base_delay_ms: ms,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

fn delay_for(source: &str, base: u64) -> u64 {
    source
        .split("delay:")
        .nth(1)
        .and_then(|rest| {
            let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
        .unwrap_or(base)
}

impl Minifier for FakeMinifier {
    fn name(&self) -> &str {
        "fake"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn minify(&self, source: &str, options: &Value) -> Result<MinifyOutput, RawMinifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(abort) = self.abort_on_call.get() {
            abort.abort();
        }
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(delay_for(source, self.base_delay_ms)));
        let result = squash(source, options);
        self.running.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn squash(source: &str, options: &Value) -> Result<MinifyOutput, RawMinifyError> {
    if source.contains("panic-now") {
        panic!("compressor blew up");
    }
    if source.contains("stack-error") {
        return Err(RawMinifyError::from_parts(
            "boom",
            Some(1),
            Some(1),
            Some("Error: boom\n    at compress (minifier.js:10:5)".to_string()),
        ));
    }

    let mut code = String::new();
    let mut segments = Vec::new();
    let mut warnings = Vec::new();
    let mut comments = Vec::new();

    for (i, line) in source.lines().enumerate() {
        let line_no = i as u32;
        if line.contains("syntax-error") {
            return Err(RawMinifyError::from_parts(
                "Unexpected token",
                Some(line_no + 1),
                Some(1),
                None,
            ));
        }
        if line.trim_start().starts_with("/*!") {
            comments.push(line.trim().to_string());
            continue;
        }
        if line.contains("unused") {
            warnings.push(format!(
                "Dropping unused variable [{INPUT_NAME}:{},1]",
                line_no + 1
            ));
        }
        let squashed: String = line.split_whitespace().collect();
        if squashed.is_empty() {
            continue;
        }
        segments.push(Segment {
            generated_column: code.len() as u32,
            source: Some(SourceRef {
                source: 0,
                line: line_no,
                column: 0,
                name: None,
            }),
        });
        code.push_str(&squashed);
    }

    let wants_map = options.get("sourceMap").and_then(Value::as_bool).unwrap_or(false);
    let map = wants_map.then(|| {
        json!({
            "version": 3,
            "file": "output.js",
            "sources": [INPUT_NAME],
            "names": [],
            "mappings": Mappings::from_lines(vec![segments]).encode(),
        })
    });

    Ok(MinifyOutput {
        code,
        map,
        warnings,
        extracted_comments: comments,
    })
}

/// A map sending line N of the asset to line N of `source`, column 0.
pub fn line_map(source: &str, lines: usize, source_root: Option<&str>) -> Value {
    let mappings = Mappings::from_lines(
        (0..lines as u32)
            .map(|line| {
                vec![Segment {
                    generated_column: 0,
                    source: Some(SourceRef {
                        source: 0,
                        line,
                        column: 0,
                        name: None,
                    }),
                }]
            })
            .collect(),
    );
    let mut map = json!({
        "version": 3,
        "sources": [source],
        "names": [],
        "mappings": mappings.encode(),
    });
    if let Some(root) = source_root {
        map["sourceRoot"] = json!(root);
    }
    map
}
