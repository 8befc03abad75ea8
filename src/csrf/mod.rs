//! CSRF protection subsystem.
//!
//! # Data Flow
//! ```text
//! Rendering request (GET, HEAD, OPTIONS, TRACE):
//!     → handler asks token.rs for a token bound to the session
//!     → token embedded in the form / page
//!
//! Mutating request (everything else):
//!     → extract.rs (header, else form / JSON body field)
//!     → token.rs (verify against session secret)
//!     → Valid: dispatch; otherwise uniform 403
//! ```
//!
//! # Design Decisions
//! - Synchronizer-token pattern: one secret per session, no token lists
//! - Verification is constant time
//! - Failure sub-cases only reach logs and metrics

pub mod extract;
pub mod token;

pub use extract::submitted_token;
pub use token::{CsrfToken, CsrfTokenManager, ValidationResult};

use axum::http::Method;

/// Whether a request method changes state and therefore needs a token.
pub fn requires_validation(method: &Method) -> bool {
    !method.is_safe()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_mutating_methods_validated() {
        for method in [Method::GET, Method::HEAD, Method::OPTIONS, Method::TRACE] {
            assert!(!requires_validation(&method), "{}", method);
        }
        for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            assert!(requires_validation(&method), "{}", method);
        }
    }
}
