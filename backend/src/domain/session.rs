//! Session primitives: the cookie token, its storage key, the stored record,
//! the expiry policy and the identity snapshot bound to a realtime channel.
//!
//! The token only ever travels in the cookie. Stores index sessions by the
//! SHA-256 digest of the token, namespaced as `session:v1:<hex>`, so a dump
//! of the store cannot be replayed as cookies.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::User;

const TOKEN_BYTES: usize = 32;
const TOKEN_HEX_LEN: usize = TOKEN_BYTES * 2;
const KEY_PREFIX: &str = "session:v1:";

/// Reasons a cookie value is not a session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionTokenError {
    /// Wrong number of characters.
    #[error("session token must be 64 characters")]
    Length,
    /// Characters outside lowercase hex.
    #[error("session token must be lowercase hex")]
    Alphabet,
}

/// Opaque bearer token stored in the session cookie.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Draw a new token from the operating system RNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0_u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Parse a cookie value.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::SessionToken;
    ///
    /// assert!(SessionToken::parse("abc").is_err());
    /// let token = SessionToken::generate();
    /// assert_eq!(SessionToken::parse(token.as_str()), Ok(token));
    /// ```
    pub fn parse(raw: &str) -> Result<Self, SessionTokenError> {
        if raw.len() != TOKEN_HEX_LEN {
            return Err(SessionTokenError::Length);
        }
        if !raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(SessionTokenError::Alphabet);
        }
        Ok(Self(raw.to_owned()))
    }

    /// Cookie value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Storage key derived from this token.
    #[must_use]
    pub fn key(&self) -> SessionKey {
        let digest = Sha256::digest(self.0.as_bytes());
        SessionKey(format!("{KEY_PREFIX}{}", hex::encode(digest)))
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Store key for a session; safe to log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey(String);

impl SessionKey {
    /// Namespaced key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Short prefix of the digest for log fields.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        let digest = self.0.strip_prefix(KEY_PREFIX).unwrap_or(&self.0);
        digest.get(..8).unwrap_or(digest)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session state held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    user: User,
    created_at: DateTime<Utc>,
    last_touched_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Record for a session opened at `now`.
    #[must_use]
    pub const fn new(user: User, now: DateTime<Utc>) -> Self {
        Self {
            user,
            created_at: now,
            last_touched_at: now,
        }
    }

    /// Authenticated user.
    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    /// When the session was opened.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last authenticated HTTP request.
    #[must_use]
    pub const fn last_touched_at(&self) -> DateTime<Utc> {
        self.last_touched_at
    }

    /// Copy of the record with `last_touched_at` moved to `now`.
    #[must_use]
    pub fn touched(&self, now: DateTime<Utc>) -> Self {
        Self {
            last_touched_at: now.max(self.last_touched_at),
            ..self.clone()
        }
    }
}

/// Errors raised by [`ExpiryPolicy::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExpiryPolicyError {
    /// A window was zero.
    #[error("session expiry windows must be non-zero")]
    Zero,
    /// A window exceeds [`ExpiryPolicy::MAX_WINDOW`].
    #[error("session expiry window is out of range")]
    OutOfRange,
    /// The idle window exceeds the absolute lifetime.
    #[error("idle timeout must not exceed the absolute lifetime")]
    IdleExceedsAbsolute,
}

/// Sliding idle timeout capped by an absolute lifetime.
///
/// A session expires at `min(last_touched_at + idle, created_at + absolute)`.
/// Authenticated HTTP requests slide the idle window; realtime channels do
/// not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    idle: TimeDelta,
    absolute: TimeDelta,
}

impl ExpiryPolicy {
    /// Default idle timeout.
    pub const DEFAULT_IDLE: Duration = Duration::from_secs(2 * 60 * 60);
    /// Default absolute lifetime.
    pub const DEFAULT_ABSOLUTE: Duration = Duration::from_secs(24 * 60 * 60);
    /// Longest accepted window (five 365-day years).
    pub const MAX_WINDOW: Duration = Duration::from_secs(5 * 365 * 24 * 60 * 60);

    /// Validate and build a policy.
    pub fn new(idle: Duration, absolute: Duration) -> Result<Self, ExpiryPolicyError> {
        if idle.is_zero() || absolute.is_zero() {
            return Err(ExpiryPolicyError::Zero);
        }
        if idle > absolute {
            return Err(ExpiryPolicyError::IdleExceedsAbsolute);
        }
        if absolute > Self::MAX_WINDOW {
            return Err(ExpiryPolicyError::OutOfRange);
        }
        let to_delta = |value| TimeDelta::from_std(value).map_err(|_| ExpiryPolicyError::OutOfRange);
        Ok(Self {
            idle: to_delta(idle)?,
            absolute: to_delta(absolute)?,
        })
    }

    /// Idle timeout.
    #[must_use]
    pub fn idle(&self) -> Duration {
        self.idle.to_std().unwrap_or_default()
    }

    /// Absolute lifetime.
    #[must_use]
    pub fn absolute(&self) -> Duration {
        self.absolute.to_std().unwrap_or_default()
    }

    /// Instant at which `record` stops resolving.
    #[must_use]
    pub fn expires_at(&self, record: &SessionRecord) -> DateTime<Utc> {
        let end = |start: DateTime<Utc>, window| {
            start
                .checked_add_signed(window)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        };
        end(record.last_touched_at, self.idle).min(end(record.created_at, self.absolute))
    }

    /// Whether `record` has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, record: &SessionRecord, now: DateTime<Utc>) -> bool {
        now >= self.expires_at(record)
    }

    /// Remaining lifetime of `record` at `now`, or `None` once expired.
    ///
    /// Stores use this as the per-key TTL.
    #[must_use]
    pub fn remaining(&self, record: &SessionRecord, now: DateTime<Utc>) -> Option<Duration> {
        (self.expires_at(record) - now)
            .to_std()
            .ok()
            .filter(|ttl| !ttl.is_zero())
    }
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            idle: TimeDelta::hours(2),
            absolute: TimeDelta::hours(24),
        }
    }
}

/// Identifier of one realtime connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Allocate a fresh connection identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity bound to a realtime channel at handshake time.
///
/// A snapshot: later changes to the session do not alter it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelIdentity {
    connection_id: ConnectionId,
    session_key: SessionKey,
    user: User,
    authorized_at: DateTime<Utc>,
}

impl ChannelIdentity {
    /// Snapshot `record` for a new connection.
    #[must_use]
    pub fn authorize(session_key: SessionKey, record: &SessionRecord, now: DateTime<Utc>) -> Self {
        Self {
            connection_id: ConnectionId::generate(),
            session_key,
            user: record.user().clone(),
            authorized_at: now,
        }
    }

    /// Connection this identity belongs to.
    #[must_use]
    pub const fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Session the channel was authorised with.
    #[must_use]
    pub const fn session_key(&self) -> &SessionKey {
        &self.session_key
    }

    /// User snapshot.
    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    /// Handshake time.
    #[must_use]
    pub const fn authorized_at(&self) -> DateTime<Utc> {
        self.authorized_at
    }
}
