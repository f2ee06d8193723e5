//! Asset selection rules.
//!
//! A rule is written either as a plain string, which matches asset names
//! starting with it, or as `/pattern/flags`, which matches by regex.
//! Supported flags: `i` (case-insensitive), `m` (multi-line), `s` (dot
//! matches newline). `g`, `u` and `y` are accepted and ignored.

use std::str::FromStr;

use regex::{Regex, RegexBuilder};

use crate::error::ConfigError;

/// A single asset-name rule.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Matches names starting with the given prefix.
    Prefix(String),
    /// Matches names the regex finds a match in.
    Pattern(Regex),
}

impl Rule {
    /// Returns `true` if `name` satisfies this rule.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Rule::Prefix(prefix) => name.starts_with(prefix.as_str()),
            Rule::Pattern(re) => re.is_match(name),
        }
    }
}

impl FromStr for Rule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(body) = s.strip_prefix('/') else {
            return Ok(Rule::Prefix(s.to_string()));
        };
        let Some(end) = body.rfind('/') else {
            return Ok(Rule::Prefix(s.to_string()));
        };
        let (pattern, flags) = (&body[..end], &body[end + 1..]);

        let mut builder = RegexBuilder::new(pattern);
        for flag in flags.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'g' | 'u' | 'y' => &mut builder,
                other => {
                    return Err(ConfigError::ValidationError(format!(
                        "unsupported flag '{other}' in rule '{s}'"
                    )))
                }
            };
        }

        builder
            .build()
            .map(Rule::Pattern)
            .map_err(|e| ConfigError::ValidationError(format!("invalid rule '{s}': {e}")))
    }
}

/// The `test`/`include`/`exclude` triple deciding which assets are minified.
///
/// An asset is selected when it matches some `test` rule, some `include`
/// rule, and no `exclude` rule. An empty `test` or `include` list places
/// no constraint.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    /// Rules an asset must match one of.
    pub test: Vec<Rule>,
    /// Further rules an asset must match one of.
    pub include: Vec<Rule>,
    /// Rules that reject an asset.
    pub exclude: Vec<Rule>,
}

impl RuleSet {
    /// Parses the three rule lists.
    pub fn parse(test: &[String], include: &[String], exclude: &[String]) -> Result<Self, ConfigError> {
        Ok(Self {
            test: parse_all(test)?,
            include: parse_all(include)?,
            exclude: parse_all(exclude)?,
        })
    }

    /// Returns `true` if the asset named `name` is selected.
    pub fn matches(&self, name: &str) -> bool {
        any_or_empty(&self.test, name)
            && any_or_empty(&self.include, name)
            && !self.exclude.iter().any(|r| r.matches(name))
    }
}

fn parse_all(rules: &[String]) -> Result<Vec<Rule>, ConfigError> {
    rules.iter().map(|r| r.parse()).collect()
}

fn any_or_empty(rules: &[Rule], name: &str) -> bool {
    rules.is_empty() || rules.iter().any(|r| r.matches(name))
}
