//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the storefront guard.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Session cookie and lifetime settings.
    pub session: SessionConfig,

    /// CSRF token carriers.
    pub csrf: CsrfConfig,

    /// Session backend selection.
    pub store: StoreConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Session settings.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Key used to sign the session cookie value.
    pub secret: String,

    /// Session cookie name.
    pub cookie_name: String,

    /// Session cookie path.
    pub cookie_path: String,

    /// Validity window of a session, also used as the cookie Max-Age.
    pub cookie_max_age_ms: u64,

    /// Emit the `Secure` attribute. Only set this behind HTTPS.
    pub secure_cookies: bool,

    /// Extend the expiry on every request instead of fixing it at creation.
    pub sliding_renewal: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            cookie_name: "sid".to_string(),
            cookie_path: "/".to_string(),
            cookie_max_age_ms: 3_600_000, // 1 hour
            secure_cookies: false,
            sliding_renewal: false,
        }
    }
}

// Hand-written so the signing key never ends up in logs.
impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("cookie_name", &self.cookie_name)
            .field("cookie_path", &self.cookie_path)
            .field("cookie_max_age_ms", &self.cookie_max_age_ms)
            .field("secure_cookies", &self.secure_cookies)
            .field("sliding_renewal", &self.sliding_renewal)
            .finish()
    }
}

/// Where clients may put the CSRF token on mutating requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// Form / JSON body field carrying the token.
    pub form_field: String,

    /// Request headers carrying the token, checked in order.
    pub header_names: Vec<String>,

    /// Largest body buffered while looking for the form field.
    pub max_body_bytes: usize,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            form_field: "_csrf".to_string(),
            header_names: vec![
                "x-csrf-token".to_string(),
                "csrf-token".to_string(),
                "xsrf-token".to_string(),
                "x-xsrf-token".to_string(),
            ],
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Available session backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackendKind {
    /// Process-local concurrent map.
    #[default]
    Memory,
}

/// Session backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend implementation.
    pub backend: StoreBackendKind,

    /// Deadline for a single backend call in milliseconds.
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackendKind::Memory,
            timeout_ms: 2_000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human readable, for development.
    #[default]
    Pretty,
    /// One JSON object per line, for production.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: GuardConfig = toml::from_str(
            r#"
            [session]
            secret = "0123456789abcdef0123456789abcdef"
            "#,
        )
        .unwrap();

        assert_eq!(config.session.cookie_name, "sid");
        assert_eq!(config.session.cookie_max_age_ms, 3_600_000);
        assert!(!config.session.secure_cookies);
        assert_eq!(config.csrf.form_field, "_csrf");
        assert_eq!(config.store.backend, StoreBackendKind::Memory);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_full_toml() {
        let config: GuardConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:8000"

            [session]
            secret = "0123456789abcdef0123456789abcdef"
            cookie_name = "shop.sid"
            cookie_max_age_ms = 60000
            secure_cookies = true
            sliding_renewal = true

            [csrf]
            header_names = ["x-csrf-token"]

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:8000");
        assert_eq!(config.session.cookie_name, "shop.sid");
        assert!(config.session.secure_cookies);
        assert!(config.session.sliding_renewal);
        assert_eq!(config.csrf.header_names, vec!["x-csrf-token".to_string()]);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let session = SessionConfig {
            secret: "super-secret-signing-key".to_string(),
            ..Default::default()
        };
        let rendered = format!("{:?}", session);
        assert!(!rendered.contains("super-secret-signing-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
