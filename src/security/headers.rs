//! Security response headers.
//!
//! # Responsibilities
//! - Stamp every outgoing response with the fixed protective header set
//!
//! # Design Decisions
//! - `insert`, never `append`: a second pass overwrites instead of duplicating
//! - Values are compile-time constants; there is no per-route variation
//! - Applied on rejections too, so no response path escapes the policy

use axum::http::{
    header::{
        CACHE_CONTROL, CONTENT_SECURITY_POLICY, STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS,
        X_FRAME_OPTIONS,
    },
    HeaderMap, HeaderName, HeaderValue,
};

/// Same-origin scripts and styles; inline styles allowed, inline scripts not.
pub const CONTENT_SECURITY_POLICY_VALUE: &str =
    "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline';";
pub const X_FRAME_OPTIONS_VALUE: &str = "DENY";
pub const X_CONTENT_TYPE_OPTIONS_VALUE: &str = "nosniff";
/// One year, subdomains included.
pub const STRICT_TRANSPORT_SECURITY_VALUE: &str = "max-age=31536000; includeSubDomains";
pub const CACHE_CONTROL_VALUE: &str = "no-store";

/// The header policy, in application order.
pub const SECURITY_HEADERS: [(HeaderName, &str); 5] = [
    (CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY_VALUE),
    (X_FRAME_OPTIONS, X_FRAME_OPTIONS_VALUE),
    (X_CONTENT_TYPE_OPTIONS, X_CONTENT_TYPE_OPTIONS_VALUE),
    (STRICT_TRANSPORT_SECURITY, STRICT_TRANSPORT_SECURITY_VALUE),
    (CACHE_CONTROL, CACHE_CONTROL_VALUE),
];

/// Stateless header policy.
pub struct SecurityHeaders;

impl SecurityHeaders {
    /// Set every policy header, replacing whatever value was there.
    pub fn apply(headers: &mut HeaderMap) {
        for (name, value) in SECURITY_HEADERS.iter() {
            headers.insert(name.clone(), HeaderValue::from_static(value));
        }
    }
}
