//! Locating the submitted CSRF token on a request.
//!
//! Headers are checked first, in configured order. Without a header token the
//! body is buffered (up to `max_body_bytes`) and searched for the form field
//! when it is URL-encoded or JSON. The buffered bytes are put back so the
//! handler sees the body unchanged. Buffering is bounded in size and in time,
//! so a body that never finishes cannot hold the request open.

use std::time::Duration;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, HeaderMap, Request},
};

use crate::config::CsrfConfig;
use crate::error::GuardError;
use crate::resilience::{with_deadline, DeadlineError};

/// Token from the first configured header that carries a non-empty value.
pub fn token_from_headers(headers: &HeaderMap, config: &CsrfConfig) -> Option<String> {
    config
        .header_names
        .iter()
        .filter_map(|name| headers.get(name.as_str()))
        .filter_map(|value| value.to_str().ok())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Form,
    Json,
}

fn body_kind(headers: &HeaderMap) -> Option<BodyKind> {
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let essence = content_type.split(';').next()?.trim();
    if essence.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
        Some(BodyKind::Form)
    } else if essence.eq_ignore_ascii_case("application/json") {
        Some(BodyKind::Json)
    } else {
        None
    }
}

/// Token from an already-buffered body.
fn token_from_body(kind: BodyKind, bytes: &[u8], field: &str) -> Option<String> {
    match kind {
        BodyKind::Form => url::form_urlencoded::parse(bytes)
            .find(|(key, _)| key == field)
            .map(|(_, value)| value.into_owned()),
        BodyKind::Json => serde_json::from_slice::<serde_json::Value>(bytes)
            .ok()?
            .get(field)?
            .as_str()
            .map(str::to_string),
    }
}

/// Find the submitted token, handing back the request with its body intact.
pub async fn submitted_token(
    request: Request<Body>,
    config: &CsrfConfig,
    deadline: Duration,
) -> Result<(Request<Body>, Option<String>), GuardError> {
    if let Some(token) = token_from_headers(request.headers(), config) {
        return Ok((request, Some(token)));
    }
    if config.form_field.is_empty() {
        return Ok((request, None));
    }
    let Some(kind) = body_kind(request.headers()) else {
        return Ok((request, None));
    };

    let (parts, body) = request.into_parts();
    let bytes = with_deadline(deadline, axum::body::to_bytes(body, config.max_body_bytes))
        .await
        .map_err(|e| match e {
            DeadlineError::Elapsed(after) => GuardError::RequestTimeout(after),
            DeadlineError::Inner(_) => GuardError::PayloadTooLarge(config.max_body_bytes),
        })?;

    let token = token_from_body(kind, &bytes, &config.form_field);
    Ok((Request::from_parts(parts, Body::from(bytes)), token))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEADLINE: Duration = Duration::from_secs(5);

    fn post(content_type: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/order")
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_string(request: Request<Body>) -> String {
        let bytes = axum::body::to_bytes(request.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_header_token() {
        let config = CsrfConfig::default();
        let request = Request::builder()
            .method("POST")
            .header("x-xsrf-token", "from-header")
            .body(Body::empty())
            .unwrap();

        let (_, token) = submitted_token(request, &config, DEADLINE).await.unwrap();
        assert_eq!(token.as_deref(), Some("from-header"));
    }

    #[tokio::test]
    async fn test_header_wins_over_body() {
        let config = CsrfConfig::default();
        let mut request = post("application/x-www-form-urlencoded", "_csrf=from-body");
        request
            .headers_mut()
            .insert("x-csrf-token", "from-header".parse().unwrap());

        let (request, token) = submitted_token(request, &config, DEADLINE).await.unwrap();
        assert_eq!(token.as_deref(), Some("from-header"));
        assert_eq!(body_string(request).await, "_csrf=from-body");
    }

    #[tokio::test]
    async fn test_form_field_and_body_preserved() {
        let config = CsrfConfig::default();
        let request = post(
            "application/x-www-form-urlencoded; charset=utf-8",
            "product_id=2&_csrf=abc%2Ddef_",
        );

        let (request, token) = submitted_token(request, &config, DEADLINE).await.unwrap();
        assert_eq!(token.as_deref(), Some("abc-def_"));
        assert_eq!(body_string(request).await, "product_id=2&_csrf=abc%2Ddef_");
    }

    #[tokio::test]
    async fn test_json_field() {
        let config = CsrfConfig::default();
        let request = post("application/json", r#"{"_csrf":"tok","qty":1}"#);

        let (_, token) = submitted_token(request, &config, DEADLINE).await.unwrap();
        assert_eq!(token.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_other_content_types_not_read() {
        let config = CsrfConfig::default();
        let request = post("text/plain", "_csrf=nope");

        let (request, token) = submitted_token(request, &config, DEADLINE).await.unwrap();
        assert!(token.is_none());
        assert_eq!(body_string(request).await, "_csrf=nope");
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let config = CsrfConfig {
            max_body_bytes: 8,
            ..Default::default()
        };
        let request = post("application/x-www-form-urlencoded", "_csrf=0123456789");

        let err = submitted_token(request, &config, DEADLINE).await.unwrap_err();
        assert!(matches!(err, GuardError::PayloadTooLarge(8)));
    }

    #[tokio::test]
    async fn test_stalled_body_times_out() {
        let config = CsrfConfig::default();
        let stalled = futures_util::stream::pending::<Result<axum::body::Bytes, std::io::Error>>();
        let request = Request::builder()
            .method("POST")
            .uri("/order")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from_stream(stalled))
            .unwrap();

        let err = submitted_token(request, &config, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::RequestTimeout(_)));
    }

    #[test]
    fn test_empty_header_ignored() {
        let config = CsrfConfig::default();
        let mut headers = HeaderMap::new();
        headers.insert("x-csrf-token", "  ".parse().unwrap());
        headers.insert("csrf-token", "second".parse().unwrap());
        assert_eq!(token_from_headers(&headers, &config).as_deref(), Some("second"));
    }
}
