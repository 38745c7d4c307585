//! Domain primitives and services.
//!
//! Purpose: keep session, credential and validation rules independent of
//! HTTP and WebSocket plumbing. Inbound adapters call the services here and
//! render their results through [`outcome_envelope`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure with a stable code.
//! - User and its validated parts: identity carried by sessions.
//! - SessionToken / SessionKey / SessionRecord / ExpiryPolicy: session data.
//! - ChannelIdentity: identity snapshot bound to one realtime channel.
//! - SessionService / CredentialLoginService / ProgressService: use cases.
//! - parse_payload / outcome_envelope: validation and envelope pipeline.

pub mod auth;
pub mod credentials;
pub mod envelope;
pub mod error;
pub mod login_service;
pub mod ports;
pub mod progress_service;
pub mod session;
pub mod session_service;
pub mod trace_id;
pub mod user;
pub mod validation;

pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::credentials::{
    BCRYPT_COST, CredentialError, CredentialRecord, PasswordDigest, equalising_digest,
    hash_password, hash_password_offloaded, verify_password, verify_password_offloaded,
};
pub use self::envelope::{error_envelope, outcome_envelope};
pub use self::error::{
    Error, ErrorCode, ErrorValidationError, INTERNAL_ERROR_MESSAGE, TRACE_ID_HEADER,
};
pub use self::login_service::CredentialLoginService;
pub use self::progress_service::ProgressService;
pub use self::session::{
    ChannelIdentity, ConnectionId, ExpiryPolicy, ExpiryPolicyError, SessionKey, SessionRecord,
    SessionToken, SessionTokenError,
};
pub use self::session_service::{ResolvedSession, SessionService};
pub use self::trace_id::TraceId;
pub use self::user::{DisplayName, User, UserId, UserValidationError, Username};
pub use self::validation::{parse_payload, violation_error};
