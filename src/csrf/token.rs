//! Synchronizer tokens derived from the per-session secret.
//!
//! A token is `base64url(nonce || HMAC-SHA256(secret, DOMAIN || nonce))`.
//! Nothing is stored per token: any number of tokens may be outstanding for
//! a session (one per open form or tab) and all of them verify until the
//! session's secret is rotated or the session expires.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;

use crate::error::GuardError;
use crate::session::types::Session;

type HmacSha256 = Hmac<Sha256>;

const NONCE_LEN: usize = 16;
const TAG_LEN: usize = 32;
/// Keeps CSRF MACs from being confused with any other use of the secret.
const DOMAIN: &[u8] = b"csrf-token:v1";

/// A token handed to the rendering layer.
#[derive(Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CsrfToken(..)")
    }
}

/// Verdict on a submitted token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    /// No token was submitted.
    Missing,
    /// A token was submitted but does not verify.
    Mismatch,
    /// There is no live session to verify against.
    NoSession,
}

impl ValidationResult {
    pub fn is_valid(self) -> bool {
        self == ValidationResult::Valid
    }

    /// Failure as a pipeline error; `None` when valid.
    pub fn into_error(self) -> Option<GuardError> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Missing => Some(GuardError::CsrfMissing),
            ValidationResult::Mismatch => Some(GuardError::CsrfMismatch),
            ValidationResult::NoSession => Some(GuardError::CsrfNoSession),
        }
    }
}

/// Issues and checks CSRF tokens. Stateless apart from the sessions it is
/// handed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsrfTokenManager;

impl CsrfTokenManager {
    pub fn new() -> Self {
        Self
    }

    /// Mint a token for `session`. Each call uses a fresh nonce.
    pub fn issue(&self, session: &Session) -> CsrfToken {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let tag = keyed(session).chain_update(nonce).finalize().into_bytes();

        let mut raw = Vec::with_capacity(NONCE_LEN + TAG_LEN);
        raw.extend_from_slice(&nonce);
        raw.extend_from_slice(&tag);
        CsrfToken(URL_SAFE_NO_PAD.encode(raw))
    }

    /// Check `submitted` against the session's secret.
    ///
    /// Pass `None` for `session` when the request has no pre-existing session;
    /// a session created by the current request can never have issued the
    /// token.
    pub fn validate(&self, session: Option<&Session>, submitted: Option<&str>) -> ValidationResult {
        let session = match session {
            Some(s) if !s.is_expired() => s,
            _ => return ValidationResult::NoSession,
        };
        let submitted = match submitted.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return ValidationResult::Missing,
        };

        let raw = match URL_SAFE_NO_PAD.decode(submitted) {
            Ok(raw) if raw.len() == NONCE_LEN + TAG_LEN => raw,
            _ => return ValidationResult::Mismatch,
        };
        let (nonce, tag) = raw.split_at(NONCE_LEN);

        // verify_slice compares in constant time.
        match keyed(session).chain_update(nonce).verify_slice(tag) {
            Ok(()) => ValidationResult::Valid,
            Err(_) => ValidationResult::Mismatch,
        }
    }
}

fn keyed(session: &Session) -> HmacSha256 {
    HmacSha256::new_from_slice(session.csrf_secret.as_bytes())
        .expect("HMAC accepts keys of any length")
        .chain_update(DOMAIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::CsrfSecret;

    fn session() -> Session {
        Session::new(60_000)
    }

    #[test]
    fn test_issued_token_validates() {
        let csrf = CsrfTokenManager::new();
        let s = session();
        let token = csrf.issue(&s);
        assert_eq!(csrf.validate(Some(&s), Some(token.as_str())), ValidationResult::Valid);
    }

    #[test]
    fn test_token_bound_to_its_session() {
        let csrf = CsrfTokenManager::new();
        let (s1, s2) = (session(), session());
        let token = csrf.issue(&s1);
        assert_eq!(
            csrf.validate(Some(&s2), Some(token.as_str())),
            ValidationResult::Mismatch
        );
    }

    #[test]
    fn test_many_tokens_stay_valid() {
        let csrf = CsrfTokenManager::new();
        let s = session();
        let tokens: Vec<_> = (0..10).map(|_| csrf.issue(&s)).collect();

        // Distinct values, no single-use consumption.
        for (i, a) in tokens.iter().enumerate() {
            for b in &tokens[i + 1..] {
                assert_ne!(a, b);
            }
        }
        for _ in 0..2 {
            for token in &tokens {
                assert!(csrf.validate(Some(&s), Some(token.as_str())).is_valid());
            }
        }
    }

    #[test]
    fn test_rotation_revokes_tokens() {
        let csrf = CsrfTokenManager::new();
        let mut s = session();
        let token = csrf.issue(&s);
        s.csrf_secret = CsrfSecret::generate();
        assert_eq!(
            csrf.validate(Some(&s), Some(token.as_str())),
            ValidationResult::Mismatch
        );
    }

    #[test]
    fn test_expired_session_never_valid() {
        let csrf = CsrfTokenManager::new();
        let mut s = session();
        let token = csrf.issue(&s);
        s.expires_at = 0;
        assert_eq!(
            csrf.validate(Some(&s), Some(token.as_str())),
            ValidationResult::NoSession
        );
    }

    #[test]
    fn test_no_session() {
        let csrf = CsrfTokenManager::new();
        let token = csrf.issue(&session());
        assert_eq!(csrf.validate(None, Some(token.as_str())), ValidationResult::NoSession);
        assert_eq!(csrf.validate(None, None), ValidationResult::NoSession);
    }

    #[test]
    fn test_missing_token() {
        let csrf = CsrfTokenManager::new();
        let s = session();
        assert_eq!(csrf.validate(Some(&s), None), ValidationResult::Missing);
        assert_eq!(csrf.validate(Some(&s), Some("")), ValidationResult::Missing);
        assert_eq!(csrf.validate(Some(&s), Some("   ")), ValidationResult::Missing);
    }

    #[test]
    fn test_flipped_byte_is_mismatch() {
        let csrf = CsrfTokenManager::new();
        let s = session();
        let token = csrf.issue(&s);

        let mut raw = URL_SAFE_NO_PAD.decode(token.as_str()).unwrap();
        for i in [0, NONCE_LEN, raw.len() - 1] {
            raw[i] ^= 0x01;
            let tampered = URL_SAFE_NO_PAD.encode(&raw);
            assert_eq!(
                csrf.validate(Some(&s), Some(&tampered)),
                ValidationResult::Mismatch
            );
            raw[i] ^= 0x01;
        }
    }

    #[test]
    fn test_garbage_is_mismatch() {
        let csrf = CsrfTokenManager::new();
        let s = session();
        let long = "A".repeat(200);
        for junk in ["not base64!", "AAAA", long.as_str()] {
            assert_eq!(csrf.validate(Some(&s), Some(junk)), ValidationResult::Mismatch);
        }
    }

    #[test]
    fn test_into_error_mapping() {
        assert!(ValidationResult::Valid.into_error().is_none());
        assert!(matches!(
            ValidationResult::Missing.into_error(),
            Some(GuardError::CsrfMissing)
        ));
        assert!(matches!(
            ValidationResult::NoSession.into_error(),
            Some(GuardError::CsrfNoSession)
        ));
    }
}
