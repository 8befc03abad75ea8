//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Outgoing response (handler output or rejection):
//!     → headers.rs (stamp CSP, framing, sniffing, HSTS, caching policy)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - Defense in depth: headers complement CSRF and SameSite cookies
//! - Fail closed: every response path carries the policy

pub mod headers;

pub use headers::SecurityHeaders;
