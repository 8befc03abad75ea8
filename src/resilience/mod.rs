//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Session store call to its backend:
//!     → timeouts.rs (enforce per-call deadline)
//!     → On timeout or backend error: StoreUnavailable, 503 for this request only
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every backend call has a deadline
//! - No retries inside a request; the client's own retry policy applies

pub mod timeouts;

pub use timeouts::{with_deadline, DeadlineError};
