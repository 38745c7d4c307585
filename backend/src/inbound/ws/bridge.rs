//! Handshake-time session bridge.
//!
//! Every upgrade request passes through here before any application code
//! runs. The bridge reads the session cookie, resolves it read-only against
//! the session store and either returns the channel identity or a rejection.
//! Resolution never slides the idle window.

use std::fmt;

use actix_web::cookie::Cookie;
use tracing::{debug, info, warn};

use crate::domain::{ChannelIdentity, SessionService, SessionToken};

/// Why a handshake was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeRejection {
    /// No session cookie on the upgrade request.
    MissingCookie,
    /// The cookie is not a session token.
    MalformedCookie,
    /// The session is unknown or expired.
    UnknownSession,
    /// The session store could not be reached.
    StoreUnavailable,
}

impl HandshakeRejection {
    /// Stable label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingCookie => "missing_cookie",
            Self::MalformedCookie => "malformed_cookie",
            Self::UnknownSession => "unknown_session",
            Self::StoreUnavailable => "store_unavailable",
        }
    }
}

impl fmt::Display for HandshakeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves upgrade requests to channel identities.
#[derive(Clone)]
pub struct SessionBridge {
    sessions: SessionService,
}

impl SessionBridge {
    /// Bridge over the shared session service.
    pub fn new(sessions: SessionService) -> Self {
        Self { sessions }
    }

    /// Authorise a handshake carrying `cookie`.
    pub async fn authorize(
        &self,
        cookie: Option<Cookie<'_>>,
    ) -> Result<ChannelIdentity, HandshakeRejection> {
        debug!(phase = "handshake_received", "realtime handshake");
        let result = self.resolve(cookie).await;
        match &result {
            Ok(identity) => info!(
                phase = "authorized",
                connection_id = %identity.connection_id(),
                user_id = %identity.user().id(),
                session = identity.session_key().fingerprint(),
                "realtime handshake accepted"
            ),
            Err(rejection) => warn!(
                phase = "rejected",
                reason = rejection.as_str(),
                "realtime handshake refused"
            ),
        }
        result
    }

    async fn resolve(
        &self,
        cookie: Option<Cookie<'_>>,
    ) -> Result<ChannelIdentity, HandshakeRejection> {
        let cookie = cookie.ok_or(HandshakeRejection::MissingCookie)?;
        let token =
            SessionToken::parse(cookie.value()).map_err(|_| HandshakeRejection::MalformedCookie)?;
        debug!(
            phase = "session_resolution",
            session = token.key().fingerprint(),
            "resolving handshake session"
        );
        self.sessions
            .authorize_channel(&token)
            .await
            .map_err(|_| HandshakeRejection::StoreUnavailable)?
            .ok_or(HandshakeRejection::UnknownSession)
    }
}
