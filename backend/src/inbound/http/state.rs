//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::LoginService;
use crate::domain::{ProgressService, SessionService};

use super::session_config::SessionSettings;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Credential check used by the login endpoint.
    pub login: Arc<dyn LoginService>,
    /// Session lifecycle shared with the realtime bridge.
    pub sessions: SessionService,
    /// Progress fan-out shared with the realtime operations.
    pub progress: ProgressService,
    /// Cookie attributes.
    pub settings: SessionSettings,
}

impl HttpState {
    /// Construct state from its services.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use backend::domain::ports::NoChannels;
    /// use backend::domain::{CredentialLoginService, ProgressService, SessionService};
    /// use backend::inbound::http::session_config::{BuildMode, session_settings_from_env};
    /// use backend::inbound::http::state::HttpState;
    /// use backend::outbound::credentials::MemoryCredentialRepository;
    /// use backend::outbound::session_store::MemorySessionStore;
    /// use mockable::{DefaultClock, DefaultEnv};
    ///
    /// let settings = session_settings_from_env(&DefaultEnv::new(), BuildMode::Debug)
    ///     .expect("debug defaults");
    /// let sessions = SessionService::new(
    ///     Arc::new(MemorySessionStore::default()),
    ///     Arc::new(DefaultClock),
    ///     settings.policy,
    /// );
    /// let state = HttpState::new(
    ///     Arc::new(CredentialLoginService::new(Arc::new(
    ///         MemoryCredentialRepository::default(),
    ///     ))),
    ///     sessions,
    ///     ProgressService::new(Arc::new(NoChannels)),
    ///     settings,
    /// );
    /// let _login = state.login.clone();
    /// ```
    pub fn new(
        login: Arc<dyn LoginService>,
        sessions: SessionService,
        progress: ProgressService,
        settings: SessionSettings,
    ) -> Self {
        Self {
            login,
            sessions,
            progress,
            settings,
        }
    }
}
