//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (max-age > 0, timeouts > 0)
//! - Reject weak signing keys and malformed cookie names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GuardConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GuardConfig;

/// Minimum length of the cookie signing key, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("session.secret must be at least 32 bytes (got {0})")]
    WeakSecret(usize),

    #[error("session.cookie_max_age_ms must be greater than zero")]
    ZeroMaxAge,

    #[error("session.cookie_name {0:?} is not a valid cookie name")]
    InvalidCookieName(String),

    #[error("session.cookie_path must start with '/'")]
    InvalidCookiePath,

    #[error("csrf: at least one of form_field or header_names must be set")]
    NoCsrfCarrier,

    #[error("csrf.form_field {0:?} may only contain letters, digits, '_', '-' and '.'")]
    InvalidFormField(String),

    #[error("csrf.header_names contains an invalid header name {0:?}")]
    InvalidHeaderName(String),

    #[error("store.timeout_ms must be greater than zero")]
    ZeroStoreTimeout,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("{field} {value:?} is not a socket address")]
    InvalidAddress { field: &'static str, value: String },
}

/// Check a parsed configuration for semantic problems.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let session = &config.session;
    if session.secret.len() < MIN_SECRET_LEN {
        errors.push(ValidationError::WeakSecret(session.secret.len()));
    }
    if session.cookie_max_age_ms == 0 {
        errors.push(ValidationError::ZeroMaxAge);
    }
    if !is_cookie_token(&session.cookie_name) {
        errors.push(ValidationError::InvalidCookieName(session.cookie_name.clone()));
    }
    if !session.cookie_path.starts_with('/') {
        errors.push(ValidationError::InvalidCookiePath);
    }

    let csrf = &config.csrf;
    if csrf.form_field.is_empty() && csrf.header_names.is_empty() {
        errors.push(ValidationError::NoCsrfCarrier);
    }
    // Rendered verbatim into form markup.
    if !csrf.form_field.bytes().all(|b| b.is_ascii_alphanumeric() || b"_-.".contains(&b)) {
        errors.push(ValidationError::InvalidFormField(csrf.form_field.clone()));
    }
    for name in &csrf.header_names {
        if axum::http::HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        }
    }

    if config.store.timeout_ms == 0 {
        errors.push(ValidationError::ZeroStoreTimeout);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// RFC 6265 cookie-name: a non-empty RFC 7230 token.
fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}
