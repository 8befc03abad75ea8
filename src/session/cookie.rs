//! Session cookie encoding.
//!
//! # Responsibilities
//! - Sign the session id with the configured secret (`<id>.<mac>`)
//! - Read the session cookie back from a request, rejecting forged values
//! - Render `Set-Cookie` headers with the mandatory attributes
//!
//! # Design Decisions
//! - Signature is HMAC-SHA256, compared with `verify_slice` (constant time)
//! - Anything that fails to parse or verify is treated as "no cookie"
//! - `Secure` comes from configuration, never from request inspection

use axum::http::{header::COOKIE, HeaderMap, HeaderValue};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::SessionConfig;
use crate::session::types::SessionId;

type HmacSha256 = Hmac<Sha256>;

/// Cookie attributes plus the signing key.
#[derive(Clone)]
pub struct SessionCookies {
    name: String,
    path: String,
    max_age_ms: u64,
    secure: bool,
    key: Vec<u8>,
}

impl SessionCookies {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            path: config.cookie_path.clone(),
            max_age_ms: config.cookie_max_age_ms,
            secure: config.secure_cookies,
            key: config.secret.as_bytes().to_vec(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length")
    }

    /// Cookie value for a session id.
    pub fn sign(&self, id: &SessionId) -> String {
        let mut mac = self.mac();
        mac.update(id.as_str().as_bytes());
        let tag = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{}.{}", id, tag)
    }

    /// Recover the session id from a cookie value, if the signature holds.
    pub fn unsign(&self, value: &str) -> Option<SessionId> {
        let (raw_id, raw_tag) = value.rsplit_once('.')?;
        let id = SessionId::parse(raw_id)?;
        let tag = URL_SAFE_NO_PAD.decode(raw_tag).ok()?;

        let mut mac = self.mac();
        mac.update(raw_id.as_bytes());
        mac.verify_slice(&tag).ok()?;
        Some(id)
    }

    /// Find and verify the session cookie among the request's `Cookie`
    /// headers. The first correctly signed value wins.
    pub fn session_id(&self, headers: &HeaderMap) -> Option<SessionId> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .filter(|c| c.name() == self.name)
            .find_map(|c| self.unsign(c.value()))
    }

    /// `Set-Cookie` value establishing (or refreshing) a session.
    pub fn set_cookie(&self, id: &SessionId) -> Option<HeaderValue> {
        let cookie = self
            .base(self.sign(id))
            .max_age(CookieDuration::milliseconds(clamp_ms(self.max_age_ms)))
            .build();
        HeaderValue::from_str(&cookie.to_string()).ok()
    }

    /// `Set-Cookie` value telling the browser to forget the session.
    pub fn removal_cookie(&self) -> Option<HeaderValue> {
        let mut cookie = self.base(String::new()).build();
        cookie.make_removal();
        HeaderValue::from_str(&cookie.to_string()).ok()
    }

    fn base(&self, value: String) -> cookie::CookieBuilder<'static> {
        Cookie::build((self.name.clone(), value))
            .path(self.path.clone())
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
    }
}

fn clamp_ms(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}
