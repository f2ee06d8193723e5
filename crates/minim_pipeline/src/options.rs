//! Effective pipeline options.

use minim_config::{Banner, MinimConfig, Parallelism, RuleSet};
use serde_json::{Map, Value};

/// How extracted comments are written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentExtraction {
    /// Which comments the minifier extracts; forwarded as `extractComments`.
    pub condition: String,
    /// Target asset name template (`[file]`, `[query]`, `[base]`).
    pub filename: String,
    /// Banner prepended to the minified code.
    pub banner: Banner,
}

impl Default for CommentExtraction {
    fn default() -> Self {
        Self {
            condition: "some".to_string(),
            filename: minim_config::DEFAULT_COMMENTS_FILENAME.to_string(),
            banner: Banner::default(),
        }
    }
}

/// Everything the orchestrator needs to know about a build.
#[derive(Debug, Clone)]
pub struct MinifyOptions {
    /// Which assets are minified.
    pub rules: RuleSet,
    /// Whether output source maps are produced and merged.
    pub source_map: bool,
    /// Worker parallelism.
    pub parallel: Parallelism,
    /// Options forwarded to the minifier.
    pub minifier_options: Value,
    /// Comment extraction, or `None` to leave comments to the minifier.
    pub extract_comments: Option<CommentExtraction>,
}

impl Default for MinifyOptions {
    fn default() -> Self {
        Self {
            rules: RuleSet::parse(&[minim_config::DEFAULT_TEST_RULE.to_string()], &[], &[])
                .unwrap_or_default(),
            source_map: true,
            parallel: Parallelism::Auto,
            minifier_options: Value::Object(Map::new()),
            extract_comments: Some(CommentExtraction::default()),
        }
    }
}

impl MinifyOptions {
    /// Builds options from a loaded configuration.
    pub fn from_config(config: &MinimConfig) -> Result<Self, minim_config::ConfigError> {
        let minify = &config.minify;
        let comments = &config.extract_comments;
        Ok(Self {
            rules: RuleSet::parse(&minify.test, &minify.include, &minify.exclude)?,
            source_map: minify.source_map,
            parallel: minify.parallel,
            minifier_options: minify.options_json(),
            extract_comments: comments.enabled.then(|| CommentExtraction {
                condition: comments.condition.clone(),
                filename: comments.filename.clone(),
                banner: comments.banner.clone(),
            }),
        })
    }

    /// The options object handed to the minifier and folded into cache keys.
    ///
    /// Adds `sourceMap` and, when extraction is on, `extractComments` to the
    /// configured options unless they are already set there.
    pub fn effective_minifier_options(&self) -> Value {
        let mut map = match &self.minifier_options {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("options".to_string(), other.clone());
                map
            }
        };
        map.entry("sourceMap")
            .or_insert(Value::Bool(self.source_map));
        if let Some(extract) = &self.extract_comments {
            map.entry("extractComments")
                .or_insert_with(|| Value::String(extract.condition.clone()));
        }
        Value::Object(map)
    }
}
