//! Storage seam for session records.
//!
//! The store never touches a concrete map; it talks to a `SessionBackend`
//! handed to it at construction. Backends only persist records. Expiry,
//! cookie handling and timeouts are decided by `SessionStore`.

use async_trait::async_trait;
use thiserror::Error;

use crate::session::types::{Session, SessionId};

/// Failure reported by a backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backing storage could not be reached.
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// A stored record could not be decoded.
    #[error("corrupt session record: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait SessionBackend: Send + Sync + 'static {
    /// Fetch a record by id.
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, BackendError>;

    /// Store a brand-new record. Returns `false` without writing when the id
    /// is already taken.
    async fn insert_new(&self, session: &Session) -> Result<bool, BackendError>;

    /// Overwrite a record that still exists (renewal, secret rotation).
    /// Returns `false` without writing when the id is gone, so a session
    /// removed in the meantime is never written back.
    async fn update_existing(&self, session: &Session) -> Result<bool, BackendError>;

    /// Drop a record. Removing a missing id is not an error.
    async fn remove(&self, id: &SessionId) -> Result<(), BackendError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}
