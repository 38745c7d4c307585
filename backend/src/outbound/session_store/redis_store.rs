//! Redis-backed session store.
//!
//! Records are stored as JSON under their namespaced key with a millisecond
//! TTL (`SET key value PX ttl`). Redis expires keys itself, so the periodic
//! purge is a no-op here. The store survives gateway restarts and is shared
//! by every gateway process pointing at the same Redis.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::{Pool, PooledConnection, RunError};
use bb8_redis::redis::{self, RedisError};
use tracing::debug;

use crate::domain::ports::{SessionStore, SessionStoreError};
use crate::domain::{SessionKey, SessionRecord};

/// Default number of pooled Redis connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 8;
/// Default time to wait for a pooled connection.
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings for [`RedisSessionStore`].
///
/// # Examples
/// ```
/// use std::time::Duration;
///
/// use backend::outbound::session_store::RedisStoreConfig;
///
/// let config = RedisStoreConfig::new("redis://127.0.0.1:6379/0")
///     .with_max_connections(4)
///     .with_connection_timeout(Duration::from_secs(2));
/// assert_eq!(config.max_connections(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisStoreConfig {
    url: String,
    max_connections: u32,
    connection_timeout: Duration,
}

impl RedisStoreConfig {
    /// Settings for the Redis server at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
        }
    }

    /// Override the pool size.
    #[must_use]
    pub const fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Override the pool checkout timeout.
    #[must_use]
    pub const fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Redis URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Pool size.
    #[must_use]
    pub const fn max_connections(&self) -> u32 {
        self.max_connections
    }
}

/// Session store over a pooled Redis connection.
#[derive(Clone)]
pub struct RedisSessionStore {
    pool: Pool<RedisConnectionManager>,
}

fn connection_error(err: RunError<RedisError>) -> SessionStoreError {
    SessionStoreError::connection(err.to_string())
}

fn query_error(err: &RedisError) -> SessionStoreError {
    SessionStoreError::query(err.to_string())
}

/// TTL in whole milliseconds, never below one.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

impl RedisSessionStore {
    /// Build the pool. Connections are opened lazily on first use.
    pub fn connect(config: &RedisStoreConfig) -> Result<Self, SessionStoreError> {
        let manager = RedisConnectionManager::new(config.url())
            .map_err(|err| SessionStoreError::connection(err.to_string()))?;
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(config.connection_timeout)
            .build_unchecked(manager);
        Ok(Self { pool })
    }

    async fn connection(
        &self,
    ) -> Result<PooledConnection<'_, RedisConnectionManager>, SessionStoreError> {
        self.pool.get().await.map_err(connection_error)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn set(
        &self,
        key: &SessionKey,
        record: &SessionRecord,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        let payload = serde_json::to_string(record)
            .map_err(|err| SessionStoreError::codec(err.to_string()))?;
        let mut conn = self.connection().await?;
        redis::cmd("SET")
            .arg(key.as_str())
            .arg(payload)
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async::<()>(&mut *conn)
            .await
            .map_err(|err| query_error(&err))
    }

    async fn get(&self, key: &SessionKey) -> Result<Option<SessionRecord>, SessionStoreError> {
        let mut conn = self.connection().await?;
        let payload: Option<String> = redis::cmd("GET")
            .arg(key.as_str())
            .query_async(&mut *conn)
            .await
            .map_err(|err| query_error(&err))?;
        payload
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|err| {
                    debug!(session = key.fingerprint(), error = %err, "stored session unreadable");
                    SessionStoreError::codec(err.to_string())
                })
            })
            .transpose()
    }

    async fn delete(&self, key: &SessionKey) -> Result<(), SessionStoreError> {
        let mut conn = self.connection().await?;
        redis::cmd("DEL")
            .arg(key.as_str())
            .query_async::<()>(&mut *conn)
            .await
            .map_err(|err| query_error(&err))
    }

    async fn purge_expired(&self) -> Result<usize, SessionStoreError> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Duration::from_micros(10), 1)]
    #[case(Duration::from_millis(1500), 1500)]
    #[case(Duration::from_secs(7200), 7_200_000)]
    fn ttl_is_whole_milliseconds(#[case] ttl: Duration, #[case] expected: u64) {
        assert_eq!(ttl_millis(ttl), expected);
    }

    #[rstest]
    fn rejects_malformed_urls() {
        let result = RedisSessionStore::connect(&RedisStoreConfig::new("not a url"));
        assert!(matches!(result, Err(SessionStoreError::Connection { .. })));
    }

    #[rstest]
    #[tokio::test]
    async fn unreachable_server_is_a_connection_error() {
        let config = RedisStoreConfig::new("redis://127.0.0.1:1/0")
            .with_connection_timeout(Duration::from_millis(200));
        let store = RedisSessionStore::connect(&config).expect("pool builds lazily");
        let result = store.get(&crate::domain::SessionToken::generate().key()).await;
        assert!(matches!(result, Err(SessionStoreError::Connection { .. })));
    }
}
