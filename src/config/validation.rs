//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic checks serde cannot express (named scores, log level, addresses)
//! - Lower the file schema into routing [`Directive`]s
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Rule-set errors (bad patterns, duplicates) belong to the builder
//! - Pure function: RouterConfig → Result<Vec<Directive>, Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

use crate::config::schema::{RouterConfig, ScoreValue};
use crate::routing::builder::{Directive, MatchLiteral, TargetKey};
use crate::routing::rules::score;

/// A semantic problem in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("target '{target}': unknown score name '{name}'")]
    UnknownScoreName { target: String, name: String },

    #[error("target '{target}': rule '{criteria}' sets pattern without a match value")]
    PatternWithoutMatch { target: String, criteria: String },

    #[error("invalid log level '{0}'")]
    InvalidLogLevel(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),

    #[error("reload poll interval must be greater than zero")]
    ZeroPollInterval,
}

fn resolve_score(target: &str, value: &ScoreValue) -> Result<i64, ValidationError> {
    match value {
        ScoreValue::Value(v) => Ok(*v),
        ScoreValue::Named(name) => score::named(name).map(i64::from).ok_or_else(|| {
            ValidationError::UnknownScoreName {
                target: target.to_string(),
                name: name.clone(),
            }
        }),
    }
}

/// A bare level (`info`) or a filter with per-target directives
/// (`diameter_rtd=debug,warn`).
fn is_valid_log_level(level: &str) -> bool {
    if level.contains('=') {
        EnvFilter::try_new(level).is_ok()
    } else {
        level.parse::<LevelFilter>().is_ok()
    }
}

/// Check the non-rule sections.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !is_valid_log_level(&config.observability.log_level) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }
    if config.reload.watch && config.reload.poll_interval_secs == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate and convert the target list into builder directives.
pub fn lower_config(config: &RouterConfig) -> Result<Vec<Directive>, Vec<ValidationError>> {
    let mut errors = match validate_config(config) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };
    let mut directives = Vec::new();

    for target in &config.targets {
        let key = TargetKey::new(target.class, target.literal.clone(), target.pattern);
        directives.push(Directive::AddTarget(key.clone()));

        for rule in &target.rules {
            if rule.pattern && rule.literal.is_none() {
                errors.push(ValidationError::PatternWithoutMatch {
                    target: target.literal.clone(),
                    criteria: rule.criteria.clone(),
                });
                continue;
            }
            let score = match resolve_score(&target.literal, &rule.score) {
                Ok(score) => score,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };
            directives.push(Directive::AddRule {
                target: key.clone(),
                criteria: rule.criteria.clone(),
                matcher: rule.literal.as_ref().map(|literal| MatchLiteral {
                    literal: literal.clone(),
                    pattern: rule.pattern,
                }),
                score,
            });
        }
    }

    if errors.is_empty() {
        Ok(directives)
    } else {
        Err(errors)
    }
}
