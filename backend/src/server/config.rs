//! Process-level gateway configuration.
//!
//! Wraps the session settings with the listener address, the session store
//! location and the seed account. Everything is read through
//! [`mockable::Env`] so startup rules are testable with `MockEnv`.

use std::net::SocketAddr;

use mockable::Env;
use tracing::warn;
use zeroize::Zeroizing;

use crate::domain::{DisplayName, User, UserId, UserValidationError, Username};
use crate::inbound::http::session_config::{
    BuildMode, SessionConfigError, SessionSettings, session_settings_from_env,
};

pub(crate) const BIND_ADDR_ENV: &str = "GATEWAY_BIND_ADDR";
pub(crate) const REDIS_URL_ENV: &str = "REDIS_URL";
pub(crate) const SEED_USERNAME_ENV: &str = "GATEWAY_SEED_USERNAME";
pub(crate) const SEED_PASSWORD_ENV: &str = "GATEWAY_SEED_PASSWORD";
pub(crate) const SEED_DISPLAY_NAME_ENV: &str = "GATEWAY_SEED_DISPLAY_NAME";

/// Listener address used when `GATEWAY_BIND_ADDR` is unset.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Errors raised while reading the gateway configuration.
#[derive(Debug, thiserror::Error)]
pub enum ServerConfigError {
    /// Cookie or expiry settings are invalid.
    #[error(transparent)]
    Session(#[from] SessionConfigError),
    /// The listener address does not parse.
    #[error("invalid value for {BIND_ADDR_ENV}='{value}'; expected host:port")]
    InvalidBindAddr { value: String },
    /// A release build was started without a required variable.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// Only one half of the seed account was provided.
    #[error("{SEED_USERNAME_ENV} and {SEED_PASSWORD_ENV} must be set together")]
    IncompleteSeed,
    /// The seed account does not form a valid user.
    #[error("invalid seed account: {0}")]
    InvalidSeed(#[from] UserValidationError),
}

/// Account registered in the credential repository at startup.
pub struct SeedAccount {
    user: User,
    password: Zeroizing<String>,
}

impl SeedAccount {
    /// User the account authenticates as.
    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    /// Plaintext password, hashed once at startup.
    #[must_use]
    pub fn password(&self) -> Zeroizing<String> {
        self.password.clone()
    }
}

impl std::fmt::Debug for SeedAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedAccount")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything `create_server` needs to start the gateway.
#[derive(Debug)]
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) redis_url: Option<String>,
    pub(crate) seed: Option<SeedAccount>,
    pub(crate) settings: SessionSettings,
}

impl ServerConfig {
    /// Read the configuration from `env`.
    ///
    /// Debug builds fall back to an in-memory store and the development
    /// account when `REDIS_URL` or the seed account are missing; release builds
    /// refuse to start without them.
    ///
    /// # Examples
    /// ```
    /// use backend::inbound::http::session_config::BuildMode;
    /// use backend::server::ServerConfig;
    /// use mockable::MockEnv;
    ///
    /// let mut env = MockEnv::new();
    /// env.expect_string().returning(|name| match name {
    ///     "GATEWAY_BIND_ADDR" => Some("127.0.0.1:9000".to_owned()),
    ///     _ => None,
    /// });
    ///
    /// let config = ServerConfig::from_env(&env, BuildMode::Debug).unwrap();
    /// assert_eq!(config.bind_addr().port(), 9000);
    /// assert!(config.redis_url().is_none());
    /// ```
    pub fn from_env<E: Env>(env: &E, mode: BuildMode) -> Result<Self, ServerConfigError> {
        let settings = session_settings_from_env(env, mode)?;
        let bind_addr = parse_bind_addr(env)?;
        let redis_url = non_empty(env, REDIS_URL_ENV);
        if redis_url.is_none() {
            require_in_release(mode, REDIS_URL_ENV, || {
                warn!("{REDIS_URL_ENV} not set; sessions are kept in process memory");
            })?;
        }
        let seed = parse_seed(env)?;
        if seed.is_none() {
            require_in_release(mode, SEED_USERNAME_ENV, || {
                warn!("seed account not set; using the development account (dev only)");
            })?;
        }
        Ok(Self {
            bind_addr,
            redis_url,
            seed,
            settings,
        })
    }

    /// Socket address the server binds to.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Redis URL of the durable session store, if configured.
    #[must_use]
    pub fn redis_url(&self) -> Option<&str> {
        self.redis_url.as_deref()
    }

    /// Account seeded into the credential repository, if configured.
    #[must_use]
    pub const fn seed(&self) -> Option<&SeedAccount> {
        self.seed.as_ref()
    }

    /// Cookie and expiry settings.
    #[must_use]
    pub const fn settings(&self) -> SessionSettings {
        self.settings
    }
}

fn non_empty<E: Env>(env: &E, name: &str) -> Option<String> {
    env.string(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn require_in_release(
    mode: BuildMode,
    name: &'static str,
    warn_debug: impl FnOnce(),
) -> Result<(), ServerConfigError> {
    if mode.is_debug() {
        warn_debug();
        Ok(())
    } else {
        Err(ServerConfigError::MissingEnv { name })
    }
}

fn parse_bind_addr<E: Env>(env: &E) -> Result<SocketAddr, ServerConfigError> {
    let value = non_empty(env, BIND_ADDR_ENV).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
    value
        .parse()
        .map_err(|_| ServerConfigError::InvalidBindAddr { value })
}

fn parse_seed<E: Env>(env: &E) -> Result<Option<SeedAccount>, ServerConfigError> {
    let username = non_empty(env, SEED_USERNAME_ENV);
    let password = env
        .string(SEED_PASSWORD_ENV)
        .filter(|value| !value.is_empty())
        .map(Zeroizing::new);
    let (username, password) = match (username, password) {
        (Some(username), Some(password)) => (username, password),
        (None, None) => return Ok(None),
        _ => return Err(ServerConfigError::IncompleteSeed),
    };
    let display_name = non_empty(env, SEED_DISPLAY_NAME_ENV).unwrap_or_else(|| username.clone());
    let user = User::new(
        UserId::random(),
        Username::new(&username)?,
        DisplayName::new(display_name)?,
    );
    Ok(Some(SeedAccount { user, password }))
}
