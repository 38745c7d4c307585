//! Shared WebSocket adapter state.
//!
//! Connection tasks depend on the dispatcher and the hub only, so they can be
//! exercised with in-memory services.

use std::sync::Arc;

use super::dispatch::Dispatcher;
use super::hub::ChannelHub;

/// Dependency bundle for WebSocket connections.
#[derive(Clone)]
pub struct WsState {
    /// Routes realtime calls to their handlers.
    pub dispatcher: Dispatcher,
    /// Registry the connection joins for pushed events and revocation.
    pub hub: Arc<ChannelHub>,
}

impl WsState {
    /// Construct state from its parts.
    pub fn new(dispatcher: Dispatcher, hub: Arc<ChannelHub>) -> Self {
        Self { dispatcher, hub }
    }
}
