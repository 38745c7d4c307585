//! Credential-backed implementation of the [`LoginService`] port.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};
use zeroize::Zeroizing;

use super::ports::{CredentialRepository, INVALID_CREDENTIALS, LoginService};
use super::{Error, LoginCredentials, User, equalising_digest, verify_password_offloaded};

/// Authenticates against stored bcrypt digests.
///
/// Unknown usernames are checked against an equalising digest so both
/// failure paths do the same hashing work and return the same error.
#[derive(Clone)]
pub struct CredentialLoginService {
    credentials: Arc<dyn CredentialRepository>,
}

impl CredentialLoginService {
    /// Build the service over a credential repository.
    pub fn new(credentials: Arc<dyn CredentialRepository>) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl LoginService for CredentialLoginService {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        let record = self
            .credentials
            .find_by_username(credentials.username())
            .await
            .map_err(|err| {
                error!(error = %err, "credential lookup failed");
                Error::internal(format!("credential lookup failed: {err}"))
            })?;
        let password = Zeroizing::new(credentials.password().to_owned());

        let Some(record) = record else {
            if let Some(digest) = equalising_digest() {
                let _ = verify_password_offloaded(password, digest.clone()).await;
            }
            warn!("login rejected");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };

        if verify_password_offloaded(password, record.digest().clone()).await {
            info!(user_id = %record.user().id(), "login accepted");
            Ok(record.user().clone())
        } else {
            warn!(user_id = %record.user().id(), "login rejected");
            Err(Error::unauthorized(INVALID_CREDENTIALS))
        }
    }
}
