//! Server construction and middleware wiring.
//!
//! [`GatewayState`] assembles the domain services around one channel hub so
//! HTTP handlers, the realtime bridge and the operation handlers share the
//! same session service. [`build_app`] mounts every route on top of it and
//! [`create_server`] adds the process concerns: the store adapter, the seed
//! account, the expiry sweep and the listener.

mod config;

pub use config::{DEFAULT_BIND_ADDR, SeedAccount, ServerConfig, ServerConfigError};

use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::Trace;
use crate::domain::ports::{LoginService, SessionStore};
use crate::domain::{CredentialLoginService, ProgressService, SessionService};
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::session_config::SessionSettings;
use crate::inbound::http::state::HttpState;
use crate::inbound::http;
use crate::inbound::ws::{self, bridge::SessionBridge, hub::ChannelHub};
use crate::inbound::ws::{dispatch::MissingHandlers, operations::gateway_dispatcher, state::WsState};
use crate::outbound::credentials::{
    DEVELOPMENT_PASSWORD, MemoryCredentialRepository, development_user,
};
use crate::outbound::session_store::{MemorySessionStore, RedisSessionStore, RedisStoreConfig};

/// How often expired sessions are purged from stores without native expiry.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Services shared by every worker.
#[derive(Clone)]
pub struct GatewayState {
    /// Readiness and liveness flags.
    pub health: web::Data<HealthState>,
    /// HTTP handler dependencies.
    pub http: web::Data<HttpState>,
    /// WebSocket connection dependencies.
    pub ws: web::Data<WsState>,
    /// Handshake-time session resolution for `/ws`.
    pub bridge: SessionBridge,
    /// Registry of open realtime channels.
    pub hub: Arc<ChannelHub>,
}

impl GatewayState {
    /// Wire the services over `store`, `clock` and `login`.
    ///
    /// When `settings.revoke_channels_on_logout` is set, closing a session
    /// also closes the channels authorised with it.
    ///
    /// # Errors
    /// Returns [`MissingHandlers`] if a contract operation has no handler.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use actix_web::cookie::SameSite;
    /// use backend::domain::{CredentialLoginService, ExpiryPolicy};
    /// use backend::inbound::http::session_config::SessionSettings;
    /// use backend::outbound::credentials::MemoryCredentialRepository;
    /// use backend::outbound::session_store::MemorySessionStore;
    /// use backend::server::GatewayState;
    /// use mockable::DefaultClock;
    ///
    /// let state = GatewayState::assemble(
    ///     Arc::new(CredentialLoginService::new(Arc::new(
    ///         MemoryCredentialRepository::default(),
    ///     ))),
    ///     Arc::new(MemorySessionStore::default()),
    ///     Arc::new(DefaultClock),
    ///     SessionSettings {
    ///         cookie_secure: true,
    ///         same_site: SameSite::Strict,
    ///         policy: ExpiryPolicy::default(),
    ///         revoke_channels_on_logout: true,
    ///     },
    /// )
    /// .expect("every operation has a handler");
    /// assert!(state.hub.is_empty());
    /// ```
    pub fn assemble(
        login: Arc<dyn LoginService>,
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        settings: SessionSettings,
    ) -> Result<Self, MissingHandlers> {
        let hub = Arc::new(ChannelHub::default());
        let progress = ProgressService::new(hub.clone());
        let mut sessions = SessionService::new(store, clock, settings.policy);
        if settings.revoke_channels_on_logout {
            sessions = sessions.with_channel_revocation(hub.clone());
        }
        let dispatcher = gateway_dispatcher(progress.clone())?;

        Ok(Self {
            health: web::Data::new(HealthState::new()),
            http: web::Data::new(HttpState::new(login, sessions.clone(), progress, settings)),
            ws: web::Data::new(WsState::new(dispatcher, hub.clone())),
            bridge: SessionBridge::new(sessions),
            hub,
        })
    }

    /// Session lifecycle shared by HTTP and the bridge.
    #[must_use]
    pub fn sessions(&self) -> &SessionService {
        &self.http.sessions
    }
}

/// Mount the API, the gated realtime endpoint and the probes.
pub fn build_app(
    state: GatewayState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let GatewayState {
        health,
        http: http_state,
        ws: ws_state,
        bridge,
        ..
    } = state;

    App::new()
        .app_data(health)
        .app_data(http_state)
        .app_data(ws_state)
        .wrap(Trace)
        .configure(http::configure)
        .configure(move |cfg| ws::configure(cfg, bridge))
        .service(ready)
        .service(live)
}

fn build_store(config: &ServerConfig) -> std::io::Result<Arc<dyn SessionStore>> {
    match config.redis_url() {
        Some(url) => {
            let store = RedisSessionStore::connect(&RedisStoreConfig::new(url))
                .map_err(|e| std::io::Error::other(format!("session store setup failed: {e}")))?;
            info!("using Redis session store");
            Ok(Arc::new(store))
        }
        None => {
            warn!("using in-memory session store (single process only)");
            Ok(Arc::new(MemorySessionStore::default()))
        }
    }
}

async fn build_login(config: &ServerConfig) -> std::io::Result<Arc<dyn LoginService>> {
    let (user, password) = match config.seed() {
        Some(seed) => (seed.user().clone(), seed.password()),
        None => {
            let user = development_user().map_err(std::io::Error::other)?;
            warn!(username = %user.username(), "registering the development account");
            (user, Zeroizing::new(DEVELOPMENT_PASSWORD.to_owned()))
        }
    };
    let user_id = user.id().clone();
    let credentials = MemoryCredentialRepository::default()
        .with_account(user, password)
        .await
        .map_err(|e| std::io::Error::other(format!("seed account hashing failed: {e}")))?;
    info!(user_id = %user_id, "seed account registered");
    Ok(Arc::new(CredentialLoginService::new(Arc::new(credentials))))
}

fn spawn_sweep(sessions: SessionService) {
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = sessions.sweep().await {
                warn!(error = %e, "session sweep failed");
            }
        }
    });
}

/// Construct the gateway server from `config`.
///
/// # Returns
/// A [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when the store, seed account or listener
/// cannot be set up.
pub async fn create_server(config: ServerConfig) -> std::io::Result<Server> {
    let store = build_store(&config)?;
    let login = build_login(&config).await?;
    let state = GatewayState::assemble(login, store, Arc::new(DefaultClock), config.settings())
        .map_err(std::io::Error::other)?;
    spawn_sweep(state.sessions().clone());

    let health = state.health.clone();
    let server_state = state.clone();
    let server = HttpServer::new(move || build_app(server_state.clone()))
        .bind(config.bind_addr())?
        .run();

    health.mark_ready();
    info!(bind_addr = %config.bind_addr(), "gateway listening");
    Ok(server)
}
