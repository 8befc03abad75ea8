//! Failure taxonomy of the guard and its mapping onto HTTP responses.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::security::headers::SecurityHeaders;

/// Body sent for every CSRF rejection, whatever the underlying reason.
pub const FORBIDDEN_BODY: &str = "Forbidden: invalid or missing CSRF token";

/// Errors surfaced by the security pipeline.
#[derive(Debug, Error)]
pub enum GuardError {
    /// The presented session had expired; recovered by issuing a new one.
    #[error("session expired")]
    SessionExpired,

    /// The session backend failed or did not answer in time.
    #[error("session store unavailable: {0}")]
    StoreUnavailable(String),

    /// Mutating request carried no token.
    #[error("CSRF token missing")]
    CsrfMissing,

    /// Token present but does not verify against the session.
    #[error("CSRF token mismatch")]
    CsrfMismatch,

    /// No session existed to validate the token against.
    #[error("no session to validate CSRF token against")]
    CsrfNoSession,

    /// Body exceeded the limit while looking for a form token.
    #[error("request body larger than {0} bytes")]
    PayloadTooLarge(usize),

    /// Body did not arrive within the request timeout.
    #[error("request body not received within {0:?}")]
    RequestTimeout(Duration),
}

impl GuardError {
    /// Stable label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            GuardError::SessionExpired => "session_expired",
            GuardError::StoreUnavailable(_) => "store_unavailable",
            GuardError::CsrfMissing => "missing",
            GuardError::CsrfMismatch => "mismatch",
            GuardError::CsrfNoSession => "no_session",
            GuardError::PayloadTooLarge(_) => "payload_too_large",
            GuardError::RequestTimeout(_) => "request_timeout",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GuardError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GuardError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GuardError::RequestTimeout(_) => StatusCode::REQUEST_TIMEOUT,
            GuardError::SessionExpired
            | GuardError::CsrfMissing
            | GuardError::CsrfMismatch
            | GuardError::CsrfNoSession => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            GuardError::StoreUnavailable(_) => "Service temporarily unavailable",
            GuardError::PayloadTooLarge(_) => "Payload too large",
            GuardError::RequestTimeout(_) => "Request timeout",
            // One body for every CSRF failure so clients cannot tell them apart.
            _ => FORBIDDEN_BODY,
        };

        let mut response = (status, body).into_response();
        SecurityHeaders::apply(response.headers_mut());
        response
    }
}
