//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::rule::RuleSet;
use crate::types::MinimConfig;
use std::path::Path;

/// Name of the configuration file inside a project directory.
pub const CONFIG_FILE: &str = "minim.toml";

/// Loads and validates a `minim.toml` configuration from a project directory.
///
/// A missing file is not an error: the defaults apply.
pub fn load_config(project_dir: &Path) -> Result<MinimConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(MinimConfig::default());
    }
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `minim.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<MinimConfig, ConfigError> {
    let config: MinimConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks that rules compile and templates are usable.
fn validate_config(config: &MinimConfig) -> Result<(), ConfigError> {
    let minify = &config.minify;
    RuleSet::parse(&minify.test, &minify.include, &minify.exclude)?;

    let comments = &config.extract_comments;
    if comments.enabled && comments.filename.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "extract_comments.filename must not be empty".to_string(),
        ));
    }
    if comments.enabled && comments.filename == "[file]" {
        return Err(ConfigError::ValidationError(
            "extract_comments.filename would overwrite the asset itself".to_string(),
        ));
    }
    Ok(())
}
