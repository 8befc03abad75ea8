//! Process-local session backend.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use crate::session::backend::{BackendError, SessionBackend};
use crate::session::types::{Session, SessionId};

/// A thread-safe in-memory session map.
///
/// DashMap shards its locks, so requests for different sessions do not
/// contend and writes to the same id are last-writer-wins.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<DashMap<SessionId, Session>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held, expired ones included.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop every expired record. Expiry is normally lazy; this is for
    /// callers that want to bound memory.
    pub fn purge_expired(&self) -> usize {
        let mut purged = 0;
        self.inner.retain(|_, session| {
            let live = !session.is_expired();
            if !live {
                purged += 1;
            }
            live
        });
        purged
    }
}

#[async_trait]
impl SessionBackend for MemoryBackend {
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, BackendError> {
        Ok(self.inner.get(id).map(|r| r.value().clone()))
    }

    async fn insert_new(&self, session: &Session) -> Result<bool, BackendError> {
        match self.inner.entry(session.id.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(session.clone());
                Ok(true)
            }
        }
    }

    async fn update_existing(&self, session: &Session) -> Result<bool, BackendError> {
        match self.inner.get_mut(&session.id) {
            Some(mut slot) => {
                *slot = session.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, id: &SessionId) -> Result<(), BackendError> {
        self.inner.remove(id);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_operations() {
        let backend = MemoryBackend::new();
        let session = Session::new(60_000);

        assert!(backend.load(&session.id).await.unwrap().is_none());

        assert!(backend.insert_new(&session).await.unwrap());
        let loaded = backend.load(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, session.id);
        assert_eq!(loaded.csrf_secret.as_bytes(), session.csrf_secret.as_bytes());

        backend.remove(&session.id).await.unwrap();
        assert!(backend.load(&session.id).await.unwrap().is_none());

        // Removing twice is fine.
        backend.remove(&session.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_new_refuses_taken_id() {
        let backend = MemoryBackend::new();
        let first = Session::new(60_000);
        assert!(backend.insert_new(&first).await.unwrap());

        let mut impostor = Session::new(60_000);
        impostor.id = first.id.clone();
        assert!(!backend.insert_new(&impostor).await.unwrap());

        let stored = backend.load(&first.id).await.unwrap().unwrap();
        assert_eq!(stored.csrf_secret.as_bytes(), first.csrf_secret.as_bytes());
    }

    #[tokio::test]
    async fn test_update_existing_never_resurrects() {
        let backend = MemoryBackend::new();
        let mut session = Session::new(60_000);
        assert!(!backend.update_existing(&session).await.unwrap());
        assert!(backend.is_empty());

        backend.insert_new(&session).await.unwrap();
        session.expires_at += 1_000;
        assert!(backend.update_existing(&session).await.unwrap());
        assert_eq!(
            backend.load(&session.id).await.unwrap().unwrap().expires_at,
            session.expires_at
        );

        backend.remove(&session.id).await.unwrap();
        assert!(!backend.update_existing(&session).await.unwrap());
        assert!(backend.load(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_while_inserting() {
        let backend = MemoryBackend::new();
        let writer = {
            let backend = backend.clone();
            tokio::spawn(async move {
                for _ in 0..500 {
                    backend.insert_new(&Session::new(60_000)).await.unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };
        for _ in 0..50 {
            let mut dead = Session::new(60_000);
            dead.expires_at = 0;
            backend.insert_new(&dead).await.unwrap();
            assert!(backend.purge_expired() <= 50);
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();
        assert_eq!(backend.purge_expired(), 0);
        assert_eq!(backend.len(), 500);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let backend = MemoryBackend::new();
        let live = Session::new(60_000);
        let mut dead = Session::new(60_000);
        dead.expires_at = 0;

        backend.insert_new(&live).await.unwrap();
        backend.insert_new(&dead).await.unwrap();

        assert_eq!(backend.purge_expired(), 1);
        assert_eq!(backend.len(), 1);
    }
}
