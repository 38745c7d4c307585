//! Session-authenticated HTTP API and realtime gateway.
//!
//! - [`domain`]: sessions, credentials, validation and the envelope pipeline.
//! - [`inbound`]: HTTP handlers and the WebSocket channel adapter.
//! - [`outbound`]: session store and credential adapters.
//! - [`server`]: application assembly.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use domain::TraceId;
pub use middleware::Trace;
