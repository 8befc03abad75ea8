//! Session lifecycle on top of an injected backend.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue};
use thiserror::Error;

use crate::config::{SessionConfig, StoreConfig};
use crate::error::GuardError;
use crate::observability::metrics;
use crate::resilience::{with_deadline, DeadlineError};
use crate::session::backend::{BackendError, SessionBackend};
use crate::session::cookie::SessionCookies;
use crate::session::types::{now_millis, CsrfSecret, Session};

/// Attempts at drawing an unused id before giving up.
const MAX_CREATE_ATTEMPTS: usize = 3;

/// The store could not serve the request.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session backend {backend} timed out after {after:?}")]
    Timeout { backend: &'static str, after: Duration },

    #[error("session backend {backend} failed: {source}")]
    Backend {
        backend: &'static str,
        #[source]
        source: BackendError,
    },

    #[error("could not allocate an unused session id")]
    IdExhausted,
}

impl From<StoreError> for GuardError {
    fn from(err: StoreError) -> Self {
        GuardError::StoreUnavailable(err.to_string())
    }
}

/// How `resolve` obtained its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The request carried a valid cookie for a live session.
    Existing,
    /// A new session was created; the response must set the cookie.
    Created,
}

/// Result of resolving a request's session.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub session: Session,
    pub outcome: ResolveOutcome,
}

impl Resolution {
    pub fn is_new(&self) -> bool {
        self.outcome == ResolveOutcome::Created
    }
}

/// Owner of all session records.
///
/// Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn SessionBackend>,
    cookies: SessionCookies,
    ttl_ms: u64,
    sliding: bool,
    timeout: Duration,
}

impl SessionStore {
    pub fn new(
        backend: Arc<dyn SessionBackend>,
        session: &SessionConfig,
        store: &StoreConfig,
    ) -> Self {
        Self {
            backend,
            cookies: SessionCookies::from_config(session),
            ttl_ms: session.cookie_max_age_ms,
            sliding: session.sliding_renewal,
            timeout: Duration::from_millis(store.timeout_ms),
        }
    }

    pub fn cookies(&self) -> &SessionCookies {
        &self.cookies
    }

    pub fn sliding_renewal(&self) -> bool {
        self.sliding
    }

    /// Find the live session named by the request's cookie, or create one.
    ///
    /// Missing, malformed, forged, unknown and expired cookies all degrade to
    /// a new session. Only backend failure is an error.
    pub async fn resolve(&self, headers: &HeaderMap) -> Result<Resolution, StoreError> {
        if let Some(id) = self.cookies.session_id(headers) {
            match self.call(self.backend.load(&id)).await? {
                Some(session) if !session.is_expired() => {
                    return Ok(Resolution {
                        session,
                        outcome: ResolveOutcome::Existing,
                    });
                }
                Some(session) => {
                    tracing::debug!(
                        session = ?session.id,
                        reason = GuardError::SessionExpired.reason(),
                        "Discarding expired session"
                    );
                    metrics::record_session_expired();
                    self.call(self.backend.remove(&session.id)).await?;
                }
                None => {
                    tracing::debug!(session = ?id, "Cookie names an unknown session");
                }
            }
        }

        let session = self.create().await?;
        Ok(Resolution {
            session,
            outcome: ResolveOutcome::Created,
        })
    }

    async fn create(&self) -> Result<Session, StoreError> {
        for _ in 0..MAX_CREATE_ATTEMPTS {
            let session = Session::new(self.ttl_ms);
            if self.call(self.backend.insert_new(&session)).await? {
                tracing::debug!(session = ?session.id, "Session created");
                metrics::record_session_created();
                return Ok(session);
            }
            tracing::warn!("Session id collision, drawing again");
        }
        Err(StoreError::IdExhausted)
    }

    /// Push the expiry out by one window when sliding renewal is on.
    ///
    /// Returns whether the session was renewed (and the cookie must be
    /// re-sent). A session invalidated since it was loaded stays dead: the
    /// record is not written back and `session` is marked expired.
    pub async fn touch(&self, session: &mut Session) -> Result<bool, StoreError> {
        if !self.sliding {
            return Ok(false);
        }
        let mut renewed = session.clone();
        renewed.expires_at = now_millis().saturating_add(self.ttl_ms);
        if self.call(self.backend.update_existing(&renewed)).await? {
            *session = renewed;
            Ok(true)
        } else {
            tracing::debug!(session = ?session.id, "Session ended while in flight, not renewed");
            expire_now(session);
            Ok(false)
        }
    }

    /// End a session now. Idempotent.
    pub async fn invalidate(&self, session: &mut Session) -> Result<(), StoreError> {
        expire_now(session);
        self.call(self.backend.remove(&session.id)).await?;
        tracing::debug!(session = ?session.id, "Session invalidated");
        Ok(())
    }

    /// Replace the CSRF secret, revoking every token issued so far.
    ///
    /// Returns `false` when the session no longer exists; `session` is then
    /// marked expired and nothing is stored.
    pub async fn rotate_csrf_secret(&self, session: &mut Session) -> Result<bool, StoreError> {
        let mut rotated = session.clone();
        rotated.csrf_secret = CsrfSecret::generate();
        if !self.call(self.backend.update_existing(&rotated)).await? {
            expire_now(session);
            return Ok(false);
        }
        *session = rotated;
        tracing::debug!(session = ?session.id, "CSRF secret rotated");
        Ok(true)
    }

    /// `Set-Cookie` value for a created or renewed session.
    pub fn set_cookie(&self, session: &Session) -> Option<HeaderValue> {
        self.cookies.set_cookie(&session.id)
    }

    async fn call<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: std::future::Future<Output = Result<T, BackendError>>,
    {
        let backend = self.backend.name();
        with_deadline(self.timeout, fut).await.map_err(|e| {
            metrics::record_store_unavailable();
            match e {
                DeadlineError::Elapsed(after) => StoreError::Timeout { backend, after },
                DeadlineError::Inner(source) => StoreError::Backend { backend, source },
            }
        })
    }
}

fn expire_now(session: &mut Session) {
    session.expires_at = session.expires_at.min(now_millis().saturating_sub(1));
}
