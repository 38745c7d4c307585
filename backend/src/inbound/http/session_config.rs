//! Session configuration parsing and validation.
//!
//! Centralises the environment-driven cookie and expiry settings so they are
//! validated consistently and can be tested in isolation with `MockEnv`.
//! Debug builds fall back to defaults with a warning; release builds refuse
//! to start on a missing cookie toggle or any malformed value.

use actix_web::cookie::SameSite;
use mockable::Env;
use tracing::warn;

use crate::domain::{ExpiryPolicy, ExpiryPolicyError};

mod parsing;

use parsing::{BoolEnvConfig, parse_bool_env, parse_same_site_value, parse_secs_env};

pub(crate) const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
pub(crate) const SAMESITE_ENV: &str = "SESSION_SAMESITE";
pub(crate) const IDLE_TIMEOUT_ENV: &str = "SESSION_IDLE_TIMEOUT_SECS";
pub(crate) const ABSOLUTE_LIFETIME_ENV: &str = "SESSION_ABSOLUTE_LIFETIME_SECS";
pub(crate) const REVOKE_CHANNELS_ENV: &str = "SESSION_REVOKE_CHANNELS_ON_LOGOUT";

/// Build mode for session configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate defaults and emit warnings for missing toggles.
    Debug,
    /// Release builds require explicit, valid session toggles.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use backend::inbound::http::session_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// if cfg!(debug_assertions) {
    ///     assert_eq!(mode, BuildMode::Debug);
    /// } else {
    ///     assert_eq!(mode, BuildMode::Release);
    /// }
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    pub(crate) fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Session settings derived from configuration toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Whether session cookies are marked `Secure`.
    pub cookie_secure: bool,
    /// Configured `SameSite` policy for session cookies.
    pub same_site: SameSite,
    /// Idle timeout and absolute lifetime of sessions.
    pub policy: ExpiryPolicy,
    /// Whether logout closes realtime channels opened with the session.
    pub revoke_channels_on_logout: bool,
}

#[cfg(any(test, feature = "test-support"))]
impl SessionSettings {
    /// Settings for local HTTP tests: plain cookies, default expiry.
    #[must_use]
    pub fn insecure_for_tests() -> Self {
        Self {
            cookie_secure: false,
            same_site: SameSite::Lax,
            policy: ExpiryPolicy::default(),
            revoke_channels_on_logout: false,
        }
    }
}

/// Errors raised while validating session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// `SameSite=None` requires a secure cookie setting in release builds.
    #[error("SESSION_SAMESITE=None requires SESSION_COOKIE_SECURE=1")]
    InsecureSameSiteNone,
    /// The idle timeout and absolute lifetime do not form a valid policy.
    #[error("invalid session expiry: {0}")]
    InvalidExpiry(#[from] ExpiryPolicyError),
}

/// Build session settings from environment variables and build mode.
///
/// # Examples
///
/// ```rust
/// use backend::inbound::http::session_config::{BuildMode, session_settings_from_env};
/// use mockable::MockEnv;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|name| match name {
///     "SESSION_COOKIE_SECURE" => Some("1".to_string()),
///     "SESSION_SAMESITE" => Some("Strict".to_string()),
///     "SESSION_IDLE_TIMEOUT_SECS" => Some("900".to_string()),
///     _ => None,
/// });
///
/// let settings = session_settings_from_env(&env, BuildMode::Release)?;
/// assert!(settings.cookie_secure);
/// assert_eq!(settings.policy.idle().as_secs(), 900);
/// assert!(!settings.revoke_channels_on_logout);
/// # Ok(())
/// # }
/// ```
pub fn session_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let cookie_secure = parse_bool_env(
        env,
        mode,
        BoolEnvConfig::required(COOKIE_SECURE_ENV, true),
    )?;
    let same_site = same_site_from_env(env, mode, cookie_secure)?;
    let policy = policy_from_env(env, mode)?;
    let revoke_channels_on_logout = parse_bool_env(
        env,
        mode,
        BoolEnvConfig::optional(REVOKE_CHANNELS_ENV, false),
    )?;

    Ok(SessionSettings {
        cookie_secure,
        same_site,
        policy,
        revoke_channels_on_logout,
    })
}

fn same_site_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
    cookie_secure: bool,
) -> Result<SameSite, SessionConfigError> {
    let default_same_site = if mode.is_debug() {
        SameSite::Lax
    } else {
        SameSite::Strict
    };

    match env.string(SAMESITE_ENV) {
        Some(value) => parse_same_site_value(value, mode, cookie_secure, default_same_site),
        None => parsing::debug_warn_or_error(
            mode,
            default_same_site,
            SessionConfigError::MissingEnv { name: SAMESITE_ENV },
            || warn!("SESSION_SAMESITE not set; using default"),
        ),
    }
}

fn policy_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<ExpiryPolicy, SessionConfigError> {
    let idle = parse_secs_env(env, mode, IDLE_TIMEOUT_ENV, ExpiryPolicy::DEFAULT_IDLE)?;
    let absolute = parse_secs_env(
        env,
        mode,
        ABSOLUTE_LIFETIME_ENV,
        ExpiryPolicy::DEFAULT_ABSOLUTE,
    )?;
    Ok(ExpiryPolicy::new(idle, absolute)?)
}

#[cfg(test)]
mod tests;
