//! Session store adapters.
//!
//! - [`RedisSessionStore`]: durable and shared across processes; used
//!   whenever `REDIS_URL` is set.
//! - [`MemorySessionStore`]: single-process fallback for development and
//!   tests.

mod memory;
mod redis_store;

pub use self::memory::MemorySessionStore;
pub use self::redis_store::{
    DEFAULT_CONNECTION_TIMEOUT, DEFAULT_MAX_CONNECTIONS, RedisSessionStore, RedisStoreConfig,
};
