//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::config::validation::{lower_config, ValidationError};
use crate::routing::builder::{build, ConfigError};
use crate::routing::repository::Repository;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("Rule error: {0}")]
    Build(#[from] ConfigError),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a configuration document without touching the disk.
pub fn parse_config(content: &str) -> Result<RouterConfig, LoadError> {
    Ok(toml::from_str(content)?)
}

/// Load and parse configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RouterConfig, LoadError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Validate `config` and build its rule set.
pub fn build_repository(config: &RouterConfig) -> Result<Repository, LoadError> {
    let directives = lower_config(config).map_err(LoadError::Validation)?;
    Ok(build(&directives)?)
}

/// Load a file and build its rule set in one step.
pub fn load_repository(path: &Path) -> Result<(RouterConfig, Repository), LoadError> {
    let config = load_config(path)?;
    let repo = build_repository(&config)?;
    Ok((config, repo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_build_repository() {
        let config = parse_config(
            r#"
            [[targets]]
            class = "realm"
            match = "example.com"
              [[targets.rules]]
              criteria = "all"
              score = 10
            "#,
        )
        .unwrap();
        let repo = build_repository(&config).unwrap();
        assert_eq!(repo.target_count(), 1);
        assert_eq!(repo.rule_count(), 1);
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(parse_config("targets = 3"), Err(LoadError::Parse(_))));

        let config = parse_config(
            r#"
            [[targets]]
            class = "realm"
            match = "[bad"
            pattern = true
            "#,
        )
        .unwrap();
        let err = build_repository(&config).unwrap_err();
        assert!(matches!(err, LoadError::Build(ConfigError::InvalidPattern { .. })));
        assert!(err.to_string().starts_with("Rule error: invalid pattern '[bad'"));

        let config = parse_config(
            r#"
            [observability]
            log_level = "loud"
            "#,
        )
        .unwrap();
        let err = build_repository(&config).unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: invalid log level 'loud'");
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[targets]]\nclass = \"peer\"\nmatch = \"a.node\"").unwrap();

        let (config, repo) = load_repository(file.path()).unwrap();
        assert_eq!(config.targets.len(), 1);
        assert_eq!(repo.target_count(), 1);

        let missing = file.path().with_extension("missing");
        assert!(matches!(load_config(&missing), Err(LoadError::Io(_))));
    }
}
