//! Password hashing and verification.
//!
//! Passwords are stored as bcrypt digests. Verification never reports why a
//! comparison failed: a malformed digest and a wrong password both yield
//! `false`. The async helpers move the work onto the blocking pool so a slow
//! hash does not stall other connections on the same worker.

use std::sync::OnceLock;

use tracing::error;
use zeroize::Zeroizing;

use super::User;

/// bcrypt work factor. Tests use the minimum so suites stay fast.
#[cfg(not(any(test, feature = "test-support")))]
pub const BCRYPT_COST: u32 = 10;
/// bcrypt work factor. Tests use the minimum so suites stay fast.
#[cfg(any(test, feature = "test-support"))]
pub const BCRYPT_COST: u32 = 4;

/// Errors raised while producing a digest.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// The hashing primitive failed.
    #[error("password hashing failed: {message}")]
    Hash {
        /// Primitive error description.
        message: String,
    },
    /// The blocking task running the primitive did not complete.
    #[error("password hashing task failed: {message}")]
    Worker {
        /// Join error description.
        message: String,
    },
}

/// Encoded bcrypt digest (`$2b$<cost>$<salt+hash>`).
///
/// The value is not validated on construction; a malformed digest simply
/// never verifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Wrap an encoded digest read from storage.
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encoded form suitable for storage.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Hash `plaintext` with a fresh salt.
///
/// # Examples
/// ```
/// use backend::domain::{hash_password, verify_password};
///
/// let digest = hash_password("s3cret").unwrap();
/// assert!(verify_password("s3cret", &digest));
/// assert!(!verify_password("guess", &digest));
/// ```
pub fn hash_password(plaintext: &str) -> Result<PasswordDigest, CredentialError> {
    bcrypt::hash(plaintext, BCRYPT_COST)
        .map(PasswordDigest)
        .map_err(|err| CredentialError::Hash {
            message: err.to_string(),
        })
}

/// Compare `plaintext` with `digest`.
///
/// Returns `false` for mismatches and for digests bcrypt cannot parse.
#[must_use]
pub fn verify_password(plaintext: &str, digest: &PasswordDigest) -> bool {
    bcrypt::verify(plaintext, digest.as_str()).unwrap_or(false)
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_offloaded(
    plaintext: Zeroizing<String>,
) -> Result<PasswordDigest, CredentialError> {
    tokio::task::spawn_blocking(move || hash_password(plaintext.as_str()))
        .await
        .map_err(|err| CredentialError::Worker {
            message: err.to_string(),
        })?
}

/// [`verify_password`] on the blocking pool.
///
/// A panicked or cancelled worker counts as a failed comparison.
pub async fn verify_password_offloaded(plaintext: Zeroizing<String>, digest: PasswordDigest) -> bool {
    match tokio::task::spawn_blocking(move || verify_password(plaintext.as_str(), &digest)).await {
        Ok(matched) => matched,
        Err(err) => {
            error!(error = %err, "password verification task failed");
            false
        }
    }
}

/// Digest compared against when the username is unknown, so that path costs
/// the same as a wrong password.
///
/// `None` only when the primitive failed at first use.
pub fn equalising_digest() -> Option<&'static PasswordDigest> {
    static DIGEST: OnceLock<Option<PasswordDigest>> = OnceLock::new();
    DIGEST
        .get_or_init(|| match hash_password("equalising-digest") {
            Ok(digest) => Some(digest),
            Err(err) => {
                error!(error = %err, "could not prepare equalising digest");
                None
            }
        })
        .as_ref()
}

/// Stored credential: the public user plus the password digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    user: User,
    digest: PasswordDigest,
}

impl CredentialRecord {
    /// Pair a user with its digest.
    #[must_use]
    pub const fn new(user: User, digest: PasswordDigest) -> Self {
        Self { user, digest }
    }

    /// Public user the credential authenticates.
    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    /// Stored password digest.
    #[must_use]
    pub const fn digest(&self) -> &PasswordDigest {
        &self.digest
    }
}
