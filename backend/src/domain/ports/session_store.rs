//! Port for keyed session storage.
//!
//! Adapters persist [`SessionRecord`]s under their [`SessionKey`] with a
//! per-entry TTL. Concurrent writers follow last-write-wins; no adapter is
//! expected to provide compare-and-swap.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{SessionKey, SessionRecord};

use super::define_port_error;

define_port_error! {
    /// Errors raised by session store adapters.
    pub enum SessionStoreError {
        /// The backing store could not be reached.
        Connection { message: String } =>
            "session store connection failed: {message}",
        /// A read or write failed during execution.
        Query { message: String } =>
            "session store query failed: {message}",
        /// A stored entry could not be encoded or decoded.
        Codec { message: String } =>
            "session store entry is malformed: {message}",
    }
}

/// Durable session storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert or replace the record under `key`, expiring after `ttl`.
    async fn set(
        &self,
        key: &SessionKey,
        record: &SessionRecord,
        ttl: Duration,
    ) -> Result<(), SessionStoreError>;

    /// Fetch the record under `key`, or `None` when absent or expired.
    async fn get(&self, key: &SessionKey) -> Result<Option<SessionRecord>, SessionStoreError>;

    /// Remove the record under `key`. Removing an absent key succeeds.
    async fn delete(&self, key: &SessionKey) -> Result<(), SessionStoreError>;

    /// Drop entries whose TTL has elapsed and return how many were removed.
    ///
    /// Stores with native expiry return `0`.
    async fn purge_expired(&self) -> Result<usize, SessionStoreError>;
}
