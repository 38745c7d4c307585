//! Port for looking up stored credentials.

use async_trait::async_trait;

use crate::domain::CredentialRecord;

use super::define_port_error;

define_port_error! {
    /// Errors raised by credential repository adapters.
    pub enum CredentialRepositoryError {
        /// The backing store could not be reached.
        Connection { message: String } =>
            "credential repository connection failed: {message}",
        /// A lookup failed during execution.
        Query { message: String } =>
            "credential repository query failed: {message}",
    }
}

/// Read access to credential records keyed by username.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Find the credential for `username` (already trimmed).
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<CredentialRecord>, CredentialRepositoryError>;
}
