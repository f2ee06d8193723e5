//! Configuration types deserialized from `minim.toml`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

/// Default `test` rule: JavaScript and ES module assets, with or without a query.
pub const DEFAULT_TEST_RULE: &str = r"/\.m?js(\?.*)?$/i";

/// Default file name template for extracted comments.
pub const DEFAULT_COMMENTS_FILENAME: &str = "[file].LICENSE";

/// Default cache directory, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = ".minim-cache";

/// The top-level configuration parsed from `minim.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct MinimConfig {
    /// Asset selection, minifier options, and scheduling.
    #[serde(default)]
    pub minify: MinifyConfig,
    /// Result cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// License comment extraction settings.
    #[serde(default)]
    pub extract_comments: ExtractCommentsConfig,
}

/// The `[minify]` section.
#[derive(Debug, Deserialize)]
pub struct MinifyConfig {
    /// Rules an asset name must match one of.
    #[serde(default = "default_test", deserialize_with = "deserialize_string_or_vec")]
    pub test: Vec<String>,
    /// Further rules an asset name must match one of.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub include: Vec<String>,
    /// Rules that reject an asset name.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub exclude: Vec<String>,
    /// Whether to produce and merge source maps.
    #[serde(default = "default_true")]
    pub source_map: bool,
    /// Worker parallelism.
    #[serde(default)]
    pub parallel: Parallelism,
    /// Options forwarded verbatim to the minifier.
    #[serde(default)]
    pub options: BTreeMap<String, toml::Value>,
}

impl Default for MinifyConfig {
    fn default() -> Self {
        Self {
            test: default_test(),
            include: Vec::new(),
            exclude: Vec::new(),
            source_map: true,
            parallel: Parallelism::default(),
            options: BTreeMap::new(),
        }
    }
}

impl MinifyConfig {
    /// The minifier options as a JSON value, the form minifiers and cache
    /// keys consume.
    pub fn options_json(&self) -> serde_json::Value {
        let map = self
            .options
            .iter()
            .map(|(k, v)| (k.clone(), toml_to_json(v)))
            .collect();
        serde_json::Value::Object(map)
    }
}

fn toml_to_json(value: &toml::Value) -> serde_json::Value {
    use serde_json::Value as J;
    match value {
        toml::Value::String(s) => J::String(s.clone()),
        toml::Value::Integer(i) => J::from(*i),
        toml::Value::Float(f) => serde_json::Number::from_f64(*f).map_or(J::Null, J::Number),
        toml::Value::Boolean(b) => J::Bool(*b),
        toml::Value::Datetime(d) => J::String(d.to_string()),
        toml::Value::Array(items) => J::Array(items.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => J::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
    }
}

/// How many minifications may run at once.
///
/// In TOML: `parallel = true` (one worker per hardware thread), `false`
/// (a single worker), or a positive integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawParallelism")]
pub enum Parallelism {
    /// One task at a time.
    Disabled,
    /// One worker per available hardware thread.
    #[default]
    Auto,
    /// A fixed number of workers.
    Workers(usize),
}

impl Parallelism {
    /// The concrete worker bound. Always at least 1.
    pub fn bound(self) -> usize {
        match self {
            Parallelism::Disabled => 1,
            Parallelism::Auto => minim_common::available_workers(),
            Parallelism::Workers(n) => n.max(1),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawParallelism {
    Toggle(bool),
    Count(i64),
}

impl TryFrom<RawParallelism> for Parallelism {
    type Error = String;

    fn try_from(raw: RawParallelism) -> Result<Self, Self::Error> {
        match raw {
            RawParallelism::Toggle(true) => Ok(Parallelism::Auto),
            RawParallelism::Toggle(false) => Ok(Parallelism::Disabled),
            RawParallelism::Count(n) if n >= 1 => Ok(Parallelism::Workers(n as usize)),
            RawParallelism::Count(n) => Err(format!("parallel must be at least 1, got {n}")),
        }
    }
}

/// The `[cache]` section.
#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    /// Whether results are cached on disk.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cache directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

impl CacheConfig {
    /// The configured directory, or [`DEFAULT_CACHE_DIR`].
    pub fn dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR))
    }
}

/// The `[extract_comments]` section.
#[derive(Debug, Deserialize)]
pub struct ExtractCommentsConfig {
    /// Whether extracted comments are moved into a separate asset.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Which comments the minifier should extract (`"some"` for legal
    /// comments, `"all"`, or a `/regex/`). Forwarded to the minifier.
    #[serde(default = "default_condition")]
    pub condition: String,
    /// Target asset name template; `[file]` is replaced by the asset name.
    #[serde(default = "default_comments_filename")]
    pub filename: String,
    /// Banner prepended to the minified code.
    #[serde(default)]
    pub banner: Banner,
}

impl Default for ExtractCommentsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            condition: default_condition(),
            filename: default_comments_filename(),
            banner: Banner::default(),
        }
    }
}

/// The banner pointing readers at the extracted comments file.
///
/// `true` uses the standard banner, `false` disables it, and a string is
/// used as the banner text inside a `/*! ... */` comment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Banner {
    /// Standard banner on or off.
    Toggle(bool),
    /// Custom banner text.
    Text(String),
}

impl Default for Banner {
    fn default() -> Self {
        Banner::Toggle(true)
    }
}

fn default_true() -> bool {
    true
}

fn default_test() -> Vec<String> {
    vec![DEFAULT_TEST_RULE.to_string()]
}

fn default_condition() -> String {
    "some".to_string()
}

fn default_comments_filename() -> String {
    DEFAULT_COMMENTS_FILENAME.to_string()
}

/// Deserializes a field that can be either a single string or a list of strings.
///
/// Lets `test = "/\\.js$/"` and `test = ["/\\.js$/", "vendor/"]` both parse.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}
