//! Session lifecycle: open at login, resolve per request or handshake, close
//! at logout, sweep on a timer.
//!
//! The service is the only component that talks to the [`SessionStore`].
//! Expiry is enforced here against the injected clock, whatever the store
//! does with its TTLs, so a lagging store can never extend a session.

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, error, info};

use super::ports::{ChannelRegistry, NoChannels, SessionStore, SessionStoreError};
use super::{
    ChannelIdentity, Error, ExpiryPolicy, SessionKey, SessionRecord, SessionToken, User,
};

/// A session that resolved and has not expired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSession {
    /// Store key of the session.
    pub key: SessionKey,
    /// Stored record at resolution time.
    pub record: SessionRecord,
}

/// Session lifecycle service.
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    policy: ExpiryPolicy,
    channels: Arc<dyn ChannelRegistry>,
    revoke_channels_on_logout: bool,
}

fn store_failure(err: &SessionStoreError) -> Error {
    error!(error = %err, "session store failure");
    Error::internal(format!("session store failure: {err}"))
}

impl SessionService {
    /// Build a service over `store`, reading time from `clock`.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use backend::domain::{ExpiryPolicy, SessionService};
    /// use backend::outbound::session_store::MemorySessionStore;
    /// use mockable::DefaultClock;
    ///
    /// let service = SessionService::new(
    ///     Arc::new(MemorySessionStore::default()),
    ///     Arc::new(DefaultClock),
    ///     ExpiryPolicy::default(),
    /// );
    /// # let _ = service;
    /// ```
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>, policy: ExpiryPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
            channels: Arc::new(NoChannels),
            revoke_channels_on_logout: false,
        }
    }

    /// Close channels authorised with a session when it is closed.
    ///
    /// Without this, a channel outlives the logout that ended its session.
    #[must_use]
    pub fn with_channel_revocation(mut self, channels: Arc<dyn ChannelRegistry>) -> Self {
        self.channels = channels;
        self.revoke_channels_on_logout = true;
        self
    }

    /// Expiry policy in force.
    #[must_use]
    pub const fn policy(&self) -> ExpiryPolicy {
        self.policy
    }

    /// Open a session for `user` and return the cookie token.
    pub async fn open(&self, user: User) -> Result<SessionToken, Error> {
        let now = self.clock.utc();
        let token = SessionToken::generate();
        let key = token.key();
        let record = SessionRecord::new(user, now);
        let ttl = self
            .policy
            .remaining(&record, now)
            .ok_or_else(|| Error::internal("new session expired on creation"))?;
        self.store
            .set(&key, &record, ttl)
            .await
            .map_err(|err| store_failure(&err))?;
        info!(
            session = key.fingerprint(),
            user_id = %record.user().id(),
            "session opened"
        );
        Ok(token)
    }

    /// Look up `token` without modifying the session.
    ///
    /// Returns `None` when the session is unknown or expired. The realtime
    /// handshake uses this so that opening a channel never extends a session.
    pub async fn resolve(&self, token: &SessionToken) -> Result<Option<ResolvedSession>, Error> {
        let key = token.key();
        let Some(record) = self
            .store
            .get(&key)
            .await
            .map_err(|err| store_failure(&err))?
        else {
            debug!(session = key.fingerprint(), "session not found");
            return Ok(None);
        };
        if self.policy.is_expired(&record, self.clock.utc()) {
            debug!(session = key.fingerprint(), "session expired");
            return Ok(None);
        }
        Ok(Some(ResolvedSession { key, record }))
    }

    /// Look up `token` and slide its idle window.
    ///
    /// Authenticated HTTP requests go through here.
    pub async fn resolve_and_touch(
        &self,
        token: &SessionToken,
    ) -> Result<Option<ResolvedSession>, Error> {
        let Some(resolved) = self.resolve(token).await? else {
            return Ok(None);
        };
        let now = self.clock.utc();
        let touched = resolved.record.touched(now);
        let Some(ttl) = self.policy.remaining(&touched, now) else {
            return Ok(None);
        };
        self.store
            .set(&resolved.key, &touched, ttl)
            .await
            .map_err(|err| store_failure(&err))?;
        Ok(Some(ResolvedSession {
            key: resolved.key,
            record: touched,
        }))
    }

    /// Resolve `token` read-only and snapshot it for a new realtime channel.
    ///
    /// Returns `None` when the handshake must be refused.
    pub async fn authorize_channel(
        &self,
        token: &SessionToken,
    ) -> Result<Option<ChannelIdentity>, Error> {
        let resolved = self.resolve(token).await?;
        Ok(resolved.map(|session| {
            ChannelIdentity::authorize(session.key, &session.record, self.clock.utc())
        }))
    }

    /// Delete the session behind `token`.
    ///
    /// With channel revocation enabled, channels authorised with the session
    /// are closed too; otherwise they stay open until they disconnect.
    pub async fn close(&self, token: &SessionToken) -> Result<(), Error> {
        let key = token.key();
        self.store
            .delete(&key)
            .await
            .map_err(|err| store_failure(&err))?;
        let revoked = if self.revoke_channels_on_logout {
            self.channels.revoke_session(&key)
        } else {
            0
        };
        info!(session = key.fingerprint(), revoked, "session closed");
        Ok(())
    }

    /// Purge expired entries from the store.
    pub async fn sweep(&self) -> Result<usize, Error> {
        let purged = self
            .store
            .purge_expired()
            .await
            .map_err(|err| store_failure(&err))?;
        if purged > 0 {
            debug!(purged, "expired sessions purged");
        }
        Ok(purged)
    }
}

#[cfg(test)]
#[path = "session_service_tests.rs"]
mod tests;
