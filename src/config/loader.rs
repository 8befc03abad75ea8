//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GuardConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides `session.secret`.
pub const ENV_SESSION_SECRET: &str = "GUARD_SESSION_SECRET";
/// Deployment environment; `production` turns on secure cookies.
pub const ENV_DEPLOYMENT: &str = "GUARD_ENV";
/// Overrides the port of `listener.bind_address`.
pub const ENV_PORT: &str = "PORT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a TOML file, apply environment overrides and validate the result.
pub fn load_config(path: &Path) -> Result<GuardConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GuardConfig = toml::from_str(&content)?;
    finalize(config, |key| std::env::var(key).ok())
}

/// Build a configuration from defaults plus the environment, for running
/// without a config file.
pub fn load_from_env() -> Result<GuardConfig, ConfigError> {
    finalize(GuardConfig::default(), |key| std::env::var(key).ok())
}

fn finalize<F>(mut config: GuardConfig, lookup: F) -> Result<GuardConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    apply_env_overrides(&mut config, lookup);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Resolve deployment-dependent settings once, at startup.
///
/// `GUARD_ENV` decides the `Secure` cookie attribute whenever it is set, so
/// the pipeline never has to look at the environment itself.
pub fn apply_env_overrides<F>(config: &mut GuardConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(secret) = lookup(ENV_SESSION_SECRET).filter(|s| !s.is_empty()) {
        config.session.secret = secret;
    }

    if let Some(env) = lookup(ENV_DEPLOYMENT) {
        config.session.secure_cookies = env.eq_ignore_ascii_case("production");
    }

    if let Some(port) = lookup(ENV_PORT).and_then(|p| p.parse::<u16>().ok()) {
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{}:{}", host, port);
    }
}
