//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap session backend calls with a deadline
//! - Turn an elapsed deadline into a distinct error instead of a hang
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from backend errors

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Outcome of a deadline-bounded call that did not succeed.
#[derive(Debug, Error)]
pub enum DeadlineError<E> {
    #[error("operation timed out after {0:?}")]
    Elapsed(Duration),

    #[error(transparent)]
    Inner(E),
}

/// Run `fut`, giving up after `limit`.
pub async fn with_deadline<T, E, F>(limit: Duration, fut: F) -> Result<T, DeadlineError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(DeadlineError::Inner(e)),
        Err(_) => Err(DeadlineError::Elapsed(limit)),
    }
}
