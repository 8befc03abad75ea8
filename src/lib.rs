//! Storefront security middleware: sessions, CSRF protection and security
//! headers in front of a small storefront.

pub mod config;
pub mod csrf;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;
pub mod session;
pub mod storefront;

pub use config::GuardConfig;
pub use csrf::{CsrfToken, CsrfTokenManager, ValidationResult};
pub use error::GuardError;
pub use http::{GuardState, HttpServer, RequestSession};
pub use lifecycle::Shutdown;
pub use security::SecurityHeaders;
pub use session::{MemoryBackend, SessionBackend, SessionStore};
