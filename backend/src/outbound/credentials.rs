//! In-memory credential repository.
//!
//! Accounts are registered at startup (from the seed account settings, or
//! the development account in debug builds) or by tests. Database-backed
//! credential storage is out of scope for the gateway; any adapter
//! implementing [`CredentialRepository`] can replace this one.

use std::collections::HashMap;

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::ports::{CredentialRepository, CredentialRepositoryError};
use crate::domain::{
    CredentialError, CredentialRecord, User, UserValidationError, hash_password,
    hash_password_offloaded,
};

/// Identifier of the development account.
pub const DEVELOPMENT_USER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";
/// Username of the development account.
pub const DEVELOPMENT_USERNAME: &str = "admin";
/// Password of the development account.
pub const DEVELOPMENT_PASSWORD: &str = "password";

/// The user the development account authenticates as.
///
/// # Errors
/// Never in practice: the literals satisfy every user invariant.
pub fn development_user() -> Result<User, UserValidationError> {
    User::try_from_strings(DEVELOPMENT_USER_ID, DEVELOPMENT_USERNAME, "Admin")
}

/// Failure to register a built-in account.
#[derive(Debug, thiserror::Error)]
pub enum AccountSetupError {
    /// The account does not form a valid user.
    #[error(transparent)]
    User(#[from] UserValidationError),
    /// The password could not be hashed.
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

/// Credential records keyed by username.
#[derive(Debug, Default, Clone)]
pub struct MemoryCredentialRepository {
    records: HashMap<String, CredentialRecord>,
}

impl MemoryCredentialRepository {
    /// Add a record, replacing any previous record for the same username.
    #[must_use]
    pub fn with_record(mut self, record: CredentialRecord) -> Self {
        self.records
            .insert(record.user().username().to_string(), record);
        self
    }

    /// Hash `password` and register it for `user`.
    pub async fn with_account(
        self,
        user: User,
        password: Zeroizing<String>,
    ) -> Result<Self, CredentialError> {
        let digest = hash_password_offloaded(password).await?;
        Ok(self.with_record(CredentialRecord::new(user, digest)))
    }

    /// Register the development account, hashed like any other.
    ///
    /// Hashes on the calling thread; use [`Self::with_account`] from async
    /// startup code.
    ///
    /// # Examples
    /// ```
    /// use backend::outbound::credentials::MemoryCredentialRepository;
    ///
    /// let repo = MemoryCredentialRepository::default()
    ///     .with_development_account()
    ///     .unwrap();
    /// assert_eq!(repo.len(), 1);
    /// ```
    pub fn with_development_account(self) -> Result<Self, AccountSetupError> {
        let user = development_user()?;
        let digest = hash_password(DEVELOPMENT_PASSWORD)?;
        Ok(self.with_record(CredentialRecord::new(user, digest)))
    }

    /// Number of registered accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no account is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl CredentialRepository for MemoryCredentialRepository {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<CredentialRecord>, CredentialRepositoryError> {
        Ok(self.records.get(username).cloned())
    }
}
