//! The per-request security pipeline.
//!
//! # States
//! ```text
//! Start → SessionResolved
//! SessionResolved → ValidationSkipped    read-only method
//! SessionResolved → ValidationPassed     mutating method, token Valid
//! SessionResolved → ValidationFailed     mutating method, anything else
//! ValidationFailed → Rejected            403, handler never runs
//! ValidationSkipped | ValidationPassed → Dispatched
//! ```
//!
//! Every exit, including a store failure at `Start`, goes through
//! `GuardState::finish`, which stamps the security headers and the session
//! cookie. Headers are applied after the handler returns so they override
//! whatever the handler set.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header::SET_COOKIE, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::{CsrfConfig, GuardConfig};
use crate::csrf::{self, CsrfToken, CsrfTokenManager};
use crate::error::GuardError;
use crate::http::request::request_id;
use crate::observability::metrics;
use crate::security::SecurityHeaders;
use crate::session::{Session, SessionBackend, SessionId, SessionStore};

/// Where a request left the pipeline; logged on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    StoreFailed,
    ValidationSkipped,
    ValidationPassed,
    ValidationFailed,
}

/// Shared state of the pipeline middleware.
#[derive(Clone)]
pub struct GuardState {
    store: SessionStore,
    csrf: CsrfTokenManager,
    csrf_config: Arc<CsrfConfig>,
    body_timeout: Duration,
}

impl GuardState {
    pub fn new(config: &GuardConfig, backend: Arc<dyn SessionBackend>) -> Self {
        Self {
            store: SessionStore::new(backend, &config.session, &config.store),
            csrf: CsrfTokenManager::new(),
            csrf_config: Arc::new(config.csrf.clone()),
            body_timeout: Duration::from_secs(config.timeouts.request_secs),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn csrf(&self) -> &CsrfTokenManager {
        &self.csrf
    }

    async fn run(&self, request: Request<Body>, next: Next, request_id: &str) -> (Stage, Response) {
        // Start → SessionResolved
        let mut resolution = match self.store.resolve(request.headers()).await {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Session store unavailable");
                return (Stage::StoreFailed, self.finish(GuardError::from(e).into_response(), None));
            }
        };

        let is_new = resolution.is_new();
        let mut cookie_due = is_new;
        if !is_new {
            match self.store.touch(&mut resolution.session).await {
                Ok(renewed) => cookie_due |= renewed,
                Err(e) => {
                    tracing::error!(request_id = %request_id, error = %e, "Session renewal failed");
                    return (Stage::StoreFailed, self.finish(GuardError::from(e).into_response(), None));
                }
            }
        }
        let session = resolution.session;
        let cookie_for = |session: &Session| cookie_due.then(|| session.id.clone());

        // SessionResolved → Validation*
        let (mut request, stage) = if !csrf::requires_validation(request.method()) {
            (request, Stage::ValidationSkipped)
        } else {
            let (request, submitted) = match csrf::submitted_token(request, &self.csrf_config, self.body_timeout).await {
                Ok(found) => found,
                Err(err) => {
                    tracing::warn!(request_id = %request_id, reason = err.reason(), "Request body rejected");
                    let response = self.finish(err.into_response(), cookie_for(&session));
                    return (Stage::ValidationFailed, response);
                }
            };

            // A session created by this request cannot have issued the token.
            let existing = (!is_new).then_some(&session);
            let verdict = self.csrf.validate(existing, submitted.as_deref());
            if let Some(err) = verdict.into_error() {
                tracing::warn!(
                    request_id = %request_id,
                    session = ?session.id,
                    reason = err.reason(),
                    "CSRF validation failed"
                );
                metrics::record_csrf_rejection(err.reason());
                // ValidationFailed → Rejected
                let response = self.finish(err.into_response(), cookie_for(&session));
                return (Stage::ValidationFailed, response);
            }
            (request, Stage::ValidationPassed)
        };

        // → Dispatched
        let cookie = cookie_for(&session);
        request.extensions_mut().insert(RequestSession {
            session,
            is_new,
            csrf: self.csrf,
            csrf_config: self.csrf_config.clone(),
            store: self.store.clone(),
        });
        let response = next.run(request).await;
        (stage, self.finish(response, cookie))
    }

    /// Stamp headers and the session cookie on an outgoing response.
    fn finish(&self, mut response: Response, cookie_for: Option<SessionId>) -> Response {
        let cookies = self.store.cookies();
        let set_cookie = if response.extensions().get::<SessionEnded>().is_some() {
            cookies.removal_cookie()
        } else {
            cookie_for.and_then(|id| cookies.set_cookie(&id))
        };
        if let Some(value) = set_cookie {
            response.headers_mut().append(SET_COOKIE, value);
        }

        SecurityHeaders::apply(response.headers_mut());
        response
    }
}

/// Middleware entry point; see the module docs for the state machine.
pub async fn guard_middleware(
    State(guard): State<GuardState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let request_id = request_id(request.headers());
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let (stage, response) = guard.run(request, next, &request_id).await;

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        stage = ?stage,
        status = response.status().as_u16(),
        "Request finished"
    );
    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

/// The caller's session, inserted into request extensions for handlers.
#[derive(Clone)]
pub struct RequestSession {
    session: Session,
    is_new: bool,
    csrf: CsrfTokenManager,
    csrf_config: Arc<CsrfConfig>,
    store: SessionStore,
}

impl RequestSession {
    pub fn id(&self) -> &SessionId {
        &self.session.id
    }

    /// Whether the session was created by this request.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn expires_at(&self) -> u64 {
        self.session.expires_at
    }

    /// A fresh token to embed in a form or page.
    pub fn csrf_token(&self) -> CsrfToken {
        self.csrf.issue(&self.session)
    }

    /// Name of the body field forms must post the token in.
    pub fn csrf_field(&self) -> &str {
        &self.csrf_config.form_field
    }

    /// Revoke every outstanding token, e.g. after a privilege change.
    /// Fails with `SessionExpired` when the session was ended meanwhile.
    pub async fn rotate_csrf_secret(&mut self) -> Result<(), GuardError> {
        if self.store.rotate_csrf_secret(&mut self.session).await? {
            Ok(())
        } else {
            Err(GuardError::SessionExpired)
        }
    }

    /// End the session. Put the returned marker in the response extensions
    /// so the pipeline clears the cookie.
    pub async fn end(mut self) -> Result<SessionEnded, GuardError> {
        self.store.invalidate(&mut self.session).await?;
        Ok(SessionEnded)
    }
}

/// Response extension telling the pipeline the session was ended.
#[derive(Debug, Clone, Copy)]
pub struct SessionEnded;
