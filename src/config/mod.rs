//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + environment (.env honoured)
//!     → loader.rs (parse, deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → GuardConfig (validated, immutable)
//!     → handed to the session store, CSRF manager and HTTP server
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Deployment-dependent settings (secure cookies) are resolved once here
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    CsrfConfig, GuardConfig, ListenerConfig, LogFormat, ObservabilityConfig, SessionConfig,
    StoreBackendKind, StoreConfig, TimeoutConfig,
};
