//! Payload types and the operations, events and HTTP endpoints built on them.

use serde::{Deserialize, Serialize};

use crate::operation::{Event, define_operations};
use crate::schema::{FieldRule, Schema, Validated};

/// Longest accepted job/run identifier.
pub const PROGRESS_ID_MAX_LEN: usize = 128;
/// Longest accepted username.
pub const USERNAME_MAX_LEN: usize = 64;
/// Longest accepted password in bytes; bcrypt ignores input past 72 bytes.
pub const PASSWORD_MAX_BYTES: usize = 72;

/// Empty argument object for operations that take no input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoArgs {}

impl Validated for NoArgs {
    fn schema() -> Schema {
        Schema::object()
    }
}

/// Public view of the user bound to a session. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProfile {
    /// Stable user identifier (UUID).
    pub user_id: String,
    /// Login name.
    pub username: String,
    /// Name shown to other users.
    pub display_name: String,
}

/// Progress report for a long-running job or run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Job or run identifier.
    pub id: String,
    /// Completion between 0 and 100 inclusive.
    pub progress_percent: u8,
}

impl Validated for Progress {
    fn schema() -> Schema {
        Schema::object()
            .field(
                FieldRule::string("id")
                    .trimmed()
                    .max_len(PROGRESS_ID_MAX_LEN),
            )
            .field(FieldRule::integer("progress_percent").range(0, 100))
    }
}

/// Login request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Login name; surrounding whitespace is ignored.
    pub username: String,
    /// Plaintext password, compared as provided.
    pub password: String,
}

impl Validated for LoginRequest {
    fn schema() -> Schema {
        Schema::object()
            .field(
                FieldRule::string("username")
                    .trimmed()
                    .max_len(USERNAME_MAX_LEN),
            )
            .field(FieldRule::string("password").max_bytes(PASSWORD_MAX_BYTES))
    }
}

define_operations! {
    /// Return the profile bound to the calling channel.
    Whoami => "whoami" {
        args: NoArgs,
        output: SessionProfile,
        message: "Session resolved",
    },
    /// Report progress; the update is echoed back and pushed to every channel
    /// of the same user as a [`ProgressEvent`].
    ReportProgress => "reportProgress" {
        args: Progress,
        output: Progress,
        message: "Progress reported",
    },
}

/// Pushed whenever a job or run reports progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressEvent;

impl Event for ProgressEvent {
    const NAME: &'static str = "progress";
    const MESSAGE: &'static str = "Progress updated";
    type Payload = Progress;
}

/// HTTP method of an [`Endpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

/// An HTTP route whose body and envelope payload types are shared.
pub trait Endpoint {
    /// HTTP method.
    const METHOD: Method;
    /// Absolute request path.
    const PATH: &'static str;
    /// Message carried by the success envelope.
    const SUCCESS_MESSAGE: &'static str;
    /// Request body type; [`NoArgs`] for bodiless requests.
    type Request;
    /// Payload of the success envelope.
    type Response;
}

/// `POST /api/v1/login`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Login;

impl Endpoint for Login {
    const METHOD: Method = Method::Post;
    const PATH: &'static str = "/api/v1/login";
    const SUCCESS_MESSAGE: &'static str = "Logged in";
    type Request = LoginRequest;
    type Response = SessionProfile;
}

/// `POST /api/v1/logout`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Logout;

impl Endpoint for Logout {
    const METHOD: Method = Method::Post;
    const PATH: &'static str = "/api/v1/logout";
    const SUCCESS_MESSAGE: &'static str = "Logged out";
    type Request = NoArgs;
    type Response = NoArgs;
}

/// `GET /api/v1/session`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CurrentSession;

impl Endpoint for CurrentSession {
    const METHOD: Method = Method::Get;
    const PATH: &'static str = "/api/v1/session";
    const SUCCESS_MESSAGE: &'static str = "Session active";
    type Request = NoArgs;
    type Response = SessionProfile;
}

/// `POST /api/v1/progress`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishProgress;

impl Endpoint for PublishProgress {
    const METHOD: Method = Method::Post;
    const PATH: &'static str = "/api/v1/progress";
    const SUCCESS_MESSAGE: &'static str = "Progress published";
    type Request = Progress;
    type Response = Progress;
}

/// Method and path of every [`Endpoint`], in declaration order.
pub const ENDPOINTS: &[(Method, &str)] = &[
    (Login::METHOD, Login::PATH),
    (Logout::METHOD, Logout::PATH),
    (CurrentSession::METHOD, CurrentSession::PATH),
    (PublishProgress::METHOD, PublishProgress::PATH),
];
