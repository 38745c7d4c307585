//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod channel_registry;
mod credential_repository;
mod login_service;
mod session_store;

#[cfg(test)]
pub use channel_registry::MockChannelRegistry;
pub use channel_registry::{ChannelRegistry, NoChannels};
#[cfg(test)]
pub use credential_repository::MockCredentialRepository;
pub use credential_repository::{CredentialRepository, CredentialRepositoryError};
pub use login_service::{INVALID_CREDENTIALS, LoginService};
#[cfg(test)]
pub use session_store::MockSessionStore;
pub use session_store::{SessionStore, SessionStoreError};
