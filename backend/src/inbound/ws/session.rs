//! Per-connection realtime channel task.
//!
//! Keeps WebSocket framing and heartbeats at the edge. Calls are handed to a
//! per-connection worker that answers them in arrival order through a
//! bounded queue; a client that outruns the worker is closed. Hub
//! signals (pushed events and revocation) are forwarded from the main loop.
//! The public contract pings every 5s and considers a connection idle after
//! 10s without client traffic; tests shorten both.

use std::time::{Duration, Instant};

use actix_web::rt::task::JoinHandle;
use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use realtime_contract::{CallFrame, ServerFrame};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time;
use tracing::{debug, info, warn};

use crate::domain::ChannelIdentity;

use super::dispatch::Dispatcher;
use super::hub::ChannelSignal;
use super::state::WsState;

/// Time between heartbeats to the client (5s in production, shorter in tests).
#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time before disconnecting the client (10s in production, shorter in tests).
#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

/// Calls a channel may have waiting for its worker.
const CALL_QUEUE_DEPTH: usize = 32;

/// Run the channel authorised as `identity` until it closes.
pub(super) async fn run_channel(
    state: WsState,
    identity: ChannelIdentity,
    session: Session,
    stream: MessageStream,
) {
    let signals = state.hub.register(&identity);
    let (calls, worker) = spawn_worker(state.dispatcher.clone(), identity.clone(), session.clone());
    info!(
        connection_id = %identity.connection_id(),
        user_id = %identity.user().id(),
        "realtime channel opened"
    );

    let channel = Channel { calls, signals };
    let reason = channel.run(session, stream).await;

    worker.abort();
    state.hub.unregister(identity.connection_id());
    info!(
        connection_id = %identity.connection_id(),
        reason,
        "realtime channel closed"
    );
}

fn spawn_worker(
    dispatcher: Dispatcher,
    identity: ChannelIdentity,
    mut session: Session,
) -> (mpsc::Sender<CallFrame>, JoinHandle<()>) {
    let (sender, mut calls) = mpsc::channel::<CallFrame>(CALL_QUEUE_DEPTH);
    let worker = actix_web::rt::spawn(async move {
        while let Some(call) = calls.recv().await {
            let reply = dispatcher.dispatch(&identity, call).await;
            if send_frame(&mut session, &reply).await.is_err() {
                break;
            }
        }
    });
    (sender, worker)
}

fn enqueue(calls: &mpsc::Sender<CallFrame>, call: CallFrame) -> Result<(), ChannelError> {
    calls.try_send(call).map_err(|error| match error {
        TrySendError::Full(_) => ChannelError::Overloaded,
        TrySendError::Closed(_) => ChannelError::WorkerGone,
    })
}

async fn send_frame(session: &mut Session, frame: &ServerFrame) -> Result<(), Closed> {
    match serde_json::to_string(frame) {
        Ok(body) => session.text(body).await,
        Err(error) => {
            warn!(error = %error, "failed to serialise realtime frame");
            Ok(())
        }
    }
}

enum ChannelError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    InvalidPayload,
    Overloaded,
    Revoked,
    WorkerGone,
    Network(Closed),
}

impl ChannelError {
    fn label(&self) -> &'static str {
        match self {
            Self::ClientClosed(_) => "client_closed",
            Self::StreamClosed => "stream_closed",
            Self::HeartbeatTimeout => "heartbeat_timeout",
            Self::Protocol(_) => "protocol_error",
            Self::InvalidPayload => "invalid_payload",
            Self::Overloaded => "call_queue_full",
            Self::Revoked => "session_revoked",
            Self::WorkerGone => "worker_stopped",
            Self::Network(_) => "send_failed",
        }
    }

    fn close_reason(&self) -> Option<Option<CloseReason>> {
        let reason = |code, description: &str| {
            Some(Some(CloseReason {
                code,
                description: Some(description.to_owned()),
            }))
        };
        match self {
            Self::HeartbeatTimeout => reason(CloseCode::Normal, "heartbeat timeout"),
            Self::Protocol(_) => reason(CloseCode::Protocol, "protocol error"),
            Self::InvalidPayload => reason(CloseCode::Policy, "invalid payload"),
            Self::Overloaded => reason(CloseCode::Policy, "too many pending calls"),
            Self::Revoked => reason(CloseCode::Policy, "session revoked"),
            Self::WorkerGone => reason(CloseCode::Error, "internal error"),
            Self::ClientClosed(reason) => Some(reason.clone()),
            Self::StreamClosed | Self::Network(_) => None,
        }
    }
}

struct Channel {
    calls: mpsc::Sender<CallFrame>,
    signals: mpsc::UnboundedReceiver<ChannelSignal>,
}

impl Channel {
    async fn run(mut self, mut session: Session, mut stream: MessageStream) -> &'static str {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    Self::handle_heartbeat_tick(&mut session, &last_heartbeat).await
                }
                message = stream.recv() => {
                    self.handle_stream_message(&mut session, &mut last_heartbeat, message).await
                }
                Some(signal) = self.signals.recv() => {
                    Self::handle_signal(&mut session, signal).await
                }
            };

            if let Err(error) = result {
                Self::log_shutdown_reason(&error);
                if let Some(reason) = error.close_reason() {
                    if let Err(close_error) = session.close(reason).await {
                        debug!(error = %close_error, "WebSocket already closed");
                    }
                }
                return error.label();
            }
        }
    }

    async fn handle_heartbeat_tick(
        session: &mut Session,
        last_heartbeat: &Instant,
    ) -> Result<(), ChannelError> {
        if Instant::now().duration_since(*last_heartbeat) > CLIENT_TIMEOUT {
            return Err(ChannelError::HeartbeatTimeout);
        }

        session.ping(b"").await.map_err(ChannelError::Network)
    }

    async fn handle_stream_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), ChannelError> {
        let Some(message) = message else {
            return Err(ChannelError::StreamClosed);
        };
        let message = message.map_err(ChannelError::Protocol)?;

        *last_heartbeat = Instant::now();
        match message {
            Message::Ping(payload) => session.pong(&payload).await.map_err(ChannelError::Network),
            Message::Text(text) => self.handle_text_message(text.as_ref()),
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => Ok(()),
            Message::Close(reason) => Err(ChannelError::ClientClosed(reason)),
        }
    }

    fn handle_text_message(&self, text: &str) -> Result<(), ChannelError> {
        let call = serde_json::from_str::<CallFrame>(text).map_err(|error| {
            warn!(error = %error, "rejected malformed realtime frame");
            ChannelError::InvalidPayload
        })?;
        enqueue(&self.calls, call)
    }

    async fn handle_signal(session: &mut Session, signal: ChannelSignal) -> Result<(), ChannelError> {
        match signal {
            ChannelSignal::Push(frame) => send_frame(session, &frame)
                .await
                .map_err(ChannelError::Network),
            ChannelSignal::Revoke => Err(ChannelError::Revoked),
        }
    }

    fn log_shutdown_reason(error: &ChannelError) {
        match error {
            ChannelError::HeartbeatTimeout => {
                warn!("WebSocket heartbeat timeout; closing connection");
            }
            ChannelError::Protocol(error) => {
                warn!(error = %error, "WebSocket protocol error");
            }
            ChannelError::Network(error) => {
                warn!(error = %error, "WebSocket send failed; closing connection");
            }
            ChannelError::Overloaded => {
                warn!(depth = CALL_QUEUE_DEPTH, "realtime call queue full; closing connection");
            }
            ChannelError::WorkerGone => {
                warn!("realtime worker stopped; closing connection");
            }
            ChannelError::Revoked => {
                info!("session revoked; closing connection");
            }
            ChannelError::InvalidPayload
            | ChannelError::ClientClosed(_)
            | ChannelError::StreamClosed => {}
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
