//! In-process session store.
//!
//! Used in development when no Redis URL is configured, and by tests.
//! Entries carry a monotonic deadline; expired entries are hidden from reads
//! straight away and removed by [`SessionStore::purge_expired`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::domain::ports::{SessionStore, SessionStoreError};
use crate::domain::{SessionKey, SessionRecord};

#[derive(Debug, Clone)]
struct Entry {
    record: SessionRecord,
    deadline: Instant,
}

/// Session store backed by a `HashMap` behind a read/write lock.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<SessionKey, Entry>>,
}

impl MemorySessionStore {
    /// Number of entries held, expired ones included until purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries at all.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set(
        &self,
        key: &SessionKey,
        record: &SessionRecord,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        let entry = Entry {
            record: record.clone(),
            deadline: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.clone(), entry);
        Ok(())
    }

    async fn get(&self, key: &SessionKey) -> Result<Option<SessionRecord>, SessionStoreError> {
        let entries = self.entries.read().await;
        let now = Instant::now();
        Ok(entries
            .get(key)
            .filter(|entry| entry.deadline > now)
            .map(|entry| entry.record.clone()))
    }

    async fn delete(&self, key: &SessionKey) -> Result<(), SessionStoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, SessionStoreError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let now = Instant::now();
        entries.retain(|_, entry| entry.deadline > now);
        Ok(before - entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SessionToken;
    use crate::test_support::sample_user;
    use chrono::Utc;
    use rstest::{fixture, rstest};

    #[fixture]
    fn record() -> SessionRecord {
        SessionRecord::new(sample_user(), Utc::now())
    }

    #[rstest]
    #[tokio::test]
    async fn set_then_get_returns_the_record(record: SessionRecord) {
        let store = MemorySessionStore::default();
        let key = SessionToken::generate().key();

        store
            .set(&key, &record, Duration::from_secs(60))
            .await
            .expect("set");

        assert_eq!(store.get(&key).await.expect("get"), Some(record));
    }

    #[rstest]
    #[tokio::test]
    async fn last_write_wins(record: SessionRecord) {
        let store = MemorySessionStore::default();
        let key = SessionToken::generate().key();
        let newer = record.touched(record.created_at() + chrono::TimeDelta::minutes(1));

        store.set(&key, &record, Duration::from_secs(60)).await.expect("set");
        store.set(&key, &newer, Duration::from_secs(60)).await.expect("set");

        assert_eq!(store.get(&key).await.expect("get"), Some(newer));
        assert_eq!(store.len().await, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn delete_is_idempotent(record: SessionRecord) {
        let store = MemorySessionStore::default();
        let key = SessionToken::generate().key();
        store.set(&key, &record, Duration::from_secs(60)).await.expect("set");

        store.delete(&key).await.expect("first delete");
        store.delete(&key).await.expect("second delete");

        assert!(store.get(&key).await.expect("get").is_none());
        assert!(store.is_empty().await);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_hidden_then_purged(record: SessionRecord) {
        let store = MemorySessionStore::default();
        let short = SessionToken::generate().key();
        let long = SessionToken::generate().key();
        store.set(&short, &record, Duration::from_secs(5)).await.expect("set");
        store.set(&long, &record, Duration::from_secs(50)).await.expect("set");

        tokio::time::advance(Duration::from_secs(10)).await;

        assert!(store.get(&short).await.expect("get").is_none());
        assert_eq!(store.len().await, 2);
        assert_eq!(store.purge_expired().await.expect("purge"), 1);
        assert!(store.get(&long).await.expect("get").is_some());
    }
}
