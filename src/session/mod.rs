//! Session subsystem.
//!
//! # Data Flow
//! ```text
//! Request Cookie header
//!     → cookie.rs (find session cookie, verify signature)
//!     → store.rs (load via backend, check expiry, or create)
//!     → backend.rs / memory.rs (record storage)
//!     → Resolution { session, Existing | Created }
//!
//! Response:
//!     → cookie.rs (Set-Cookie on create / renewal, removal on logout)
//! ```
//!
//! # Design Decisions
//! - Backend injected as `Arc<dyn SessionBackend>`; no global session map
//! - Expiry is checked lazily on resolve; the server also sweeps the
//!   in-memory backend periodically to bound memory
//! - Every backend call carries a deadline (see `resilience::timeouts`)

pub mod backend;
pub mod cookie;
pub mod memory;
pub mod store;
pub mod types;

pub use backend::{BackendError, SessionBackend};
pub use cookie::SessionCookies;
pub use memory::MemoryBackend;
pub use store::{Resolution, ResolveOutcome, SessionStore, StoreError};
pub use types::{CsrfSecret, Session, SessionId};
