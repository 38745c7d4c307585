//! Driving port for the login use case.
//!
//! Inbound adapters authenticate through this trait without knowing where
//! credentials live.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, User};

/// Message returned for every failed login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Domain use-case port for authentication.
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the authenticated user.
    ///
    /// Unknown usernames and wrong passwords fail identically with
    /// [`INVALID_CREDENTIALS`].
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error>;
}
