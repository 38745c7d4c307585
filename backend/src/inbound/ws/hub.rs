//! Registry of live realtime channels.
//!
//! Each authorised connection registers once and receives an unbounded
//! signal queue. Domain services reach channels through the
//! [`ChannelRegistry`] port; the hub never blocks on a slow client because
//! delivery only enqueues.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use realtime_contract::{Progress, ProgressEvent, ServerFrame, event_frame};
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::domain::ports::ChannelRegistry;
use crate::domain::{ChannelIdentity, ConnectionId, SessionKey, UserId};

/// Instruction delivered to one connection task.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelSignal {
    /// Send this frame to the client.
    Push(ServerFrame),
    /// The session was revoked; close the channel.
    Revoke,
}

struct Registration {
    user: UserId,
    session: SessionKey,
    sender: mpsc::UnboundedSender<ChannelSignal>,
}

/// Live channels keyed by connection.
#[derive(Default)]
pub struct ChannelHub {
    channels: Mutex<HashMap<ConnectionId, Registration>>,
}

impl ChannelHub {
    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionId, Registration>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register the channel described by `identity` and return its signal
    /// queue.
    pub fn register(&self, identity: &ChannelIdentity) -> mpsc::UnboundedReceiver<ChannelSignal> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.lock().insert(
            identity.connection_id(),
            Registration {
                user: identity.user().id().clone(),
                session: identity.session_key().clone(),
                sender,
            },
        );
        receiver
    }

    /// Forget a channel; returns whether it was registered.
    pub fn unregister(&self, connection: ConnectionId) -> bool {
        self.lock().remove(&connection).is_some()
    }

    /// Number of registered channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no channel is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn signal_where(
        &self,
        matches: impl Fn(&Registration) -> bool,
        signal: &ChannelSignal,
    ) -> usize {
        self.lock()
            .values()
            .filter(|registration| matches(registration))
            .filter(|registration| registration.sender.send(signal.clone()).is_ok())
            .count()
    }
}

impl ChannelRegistry for ChannelHub {
    fn publish_progress(&self, user: &UserId, progress: &Progress) -> usize {
        let frame = match event_frame::<ProgressEvent>(progress) {
            Ok(frame) => frame,
            Err(err) => {
                error!(error = %err, "progress event failed to encode");
                return 0;
            }
        };
        self.signal_where(|registration| &registration.user == user, &ChannelSignal::Push(frame))
    }

    fn revoke_session(&self, session: &SessionKey) -> usize {
        let revoked = self.signal_where(
            |registration| &registration.session == session,
            &ChannelSignal::Revoke,
        );
        debug!(session = session.fingerprint(), revoked, "channels revoked");
        revoked
    }
}
