//! Configuration schema definitions.
//!
//! This module defines the configuration file structure for the router.
//! All types derive Serde traits for deserialization from TOML.

use serde::{Deserialize, Serialize};

use crate::routing::rules::TargetClass;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Hot reload settings.
    pub reload: ReloadConfig,

    /// Caller-side selection policy.
    pub ranking: RankingConfig,

    /// Target definitions, each with its scoring rules.
    pub targets: Vec<TargetConfig>,
}

/// A target and the rules grouped under it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetConfig {
    /// Whether the target selects on peer identity or realm.
    pub class: TargetClass,

    /// Literal or regular expression to match.
    #[serde(rename = "match")]
    pub literal: String,

    /// Treat `match` as a regular expression.
    #[serde(default)]
    pub pattern: bool,

    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// One scoring rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleConfig {
    /// Attribute to inspect (`all`, `origin_host`, `oh`, ...).
    pub criteria: String,

    /// Value the attribute must match; omitted for `all`.
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub literal: Option<String>,

    #[serde(default)]
    pub pattern: bool,

    /// Score delta, numeric or named (`REALM`, `-FINALDEST`, ...).
    pub score: ScoreValue,
}

/// A score as written in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ScoreValue {
    Value(i64),
    Named(String),
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Reload configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Watch the configuration file and reload on change.
    pub watch: bool,

    /// Seconds the file must stay unchanged before a watched change is
    /// reloaded. Also the poll interval where notify falls back to polling.
    pub poll_interval_secs: u64,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            watch: true,
            poll_interval_secs: 2,
        }
    }
}

/// Ranking configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Drop candidates scoring below this value.
    pub min_score: Option<i64>,
}
