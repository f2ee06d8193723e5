//! Parsing and validation of `minim.toml` pipeline configuration files.
//!
//! This crate reads the configuration file and produces a strongly-typed
//! [`MinimConfig`]: asset selection rules, minifier options, parallelism,
//! cache location, and comment extraction settings.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod rule;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use rule::{Rule, RuleSet};
pub use types::*;
