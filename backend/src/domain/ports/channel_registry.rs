//! Port for reaching live realtime channels from domain services.

use realtime_contract::Progress;

use crate::domain::{SessionKey, UserId};

/// Fan-out to the realtime channels currently open.
///
/// Delivery is best effort: a channel that closed concurrently is skipped.
#[cfg_attr(test, mockall::automock)]
pub trait ChannelRegistry: Send + Sync {
    /// Push a progress event to every channel owned by `user`; returns the
    /// number of channels reached.
    fn publish_progress(&self, user: &UserId, progress: &Progress) -> usize;

    /// Close every channel authorised with `session`; returns the number of
    /// channels closed.
    fn revoke_session(&self, session: &SessionKey) -> usize;
}

/// Registry with no channels, for services exercised without a realtime
/// adapter.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoChannels;

impl ChannelRegistry for NoChannels {
    fn publish_progress(&self, _user: &UserId, _progress: &Progress) -> usize {
        0
    }

    fn revoke_session(&self, _session: &SessionKey) -> usize {
        0
    }
}
