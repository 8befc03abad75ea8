//! Session record types.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

/// Random bytes behind a session identifier (256 bits).
pub const SESSION_ID_BYTES: usize = 32;
/// Random bytes behind a per-session CSRF secret (256 bits).
pub const CSRF_SECRET_BYTES: usize = 32;

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Opaque, unguessable session identifier (lowercase hex).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Draw a fresh identifier from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Accept an identifier read back from a cookie, if it is well formed.
    pub fn parse(raw: &str) -> Option<Self> {
        let well_formed = raw.len() == SESSION_ID_BYTES * 2
            && raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        well_formed.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Only a prefix is printed; full ids are bearer credentials.
impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({}…)", &self.0[..8.min(self.0.len())])
    }
}

/// Per-session key for CSRF token derivation. Never leaves the server.
#[derive(Clone, Serialize, Deserialize)]
pub struct CsrfSecret([u8; CSRF_SECRET_BYTES]);

impl CsrfSecret {
    pub fn generate() -> Self {
        let mut bytes = [0u8; CSRF_SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for CsrfSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CsrfSecret(<redacted>)")
    }
}

/// A client session as held by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// Creation time (ms since epoch).
    pub created_at: u64,
    /// Expiry time (ms since epoch).
    pub expires_at: u64,
    pub csrf_secret: CsrfSecret,
}

impl Session {
    /// New session with fresh id and secret, valid for `ttl_ms`.
    pub fn new(ttl_ms: u64) -> Self {
        let now = now_millis();
        Self {
            id: SessionId::generate(),
            created_at: now,
            expires_at: now.saturating_add(ttl_ms),
            csrf_secret: CsrfSecret::generate(),
        }
    }

    /// A session is invalid once `now > expires_at`.
    pub fn is_expired_at(&self, now: u64) -> bool {
        now > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_millis())
    }

    /// Milliseconds left before expiry, zero once expired.
    pub fn remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(now_millis())
    }
}
