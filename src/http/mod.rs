//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layer stack)
//!     → request.rs (request ID assigned and echoed)
//!     → pipeline.rs (session, CSRF check, security headers)
//!     → storefront handlers
//!     → Send to client
//! ```

pub mod pipeline;
pub mod request;
pub mod server;

pub use pipeline::{GuardState, RequestSession, SessionEnded};
pub use request::X_REQUEST_ID;
pub use server::{protect, HttpServer};
