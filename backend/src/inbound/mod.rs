//! Inbound adapters that translate external requests into domain service calls
//! while keeping framework details at the edge.
//!
//! Request/response endpoints live under [`http`]; the session-authenticated
//! realtime channel lives under [`ws`].

pub mod http;
pub mod ws;
