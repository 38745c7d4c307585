//! Outbound adapters implementing domain ports.
//!
//! - **session_store**: Redis-backed and in-memory session stores.
//! - **credentials**: in-memory credential repository seeded at startup.
//!
//! Adapters translate between domain types and their storage representation
//! and contain no business logic.

pub mod credentials;
pub mod session_store;
