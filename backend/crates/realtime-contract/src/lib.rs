//! Shared contract between the realtime gateway and its clients.
//!
//! Both sides import this crate instead of copying shapes from one another:
//!
//! - [`Envelope`] is the single success/error wrapper for every result.
//! - [`Schema`] and [`Validated`] declare how payloads are checked.
//! - [`Operation`], [`Event`] and [`Endpoint`] map wire names to argument and
//!   result types; [`encode_call`] and [`decode_reply`] keep client call sites
//!   statically tied to those types.

mod envelope;
mod frame;
mod operation;
mod operations;
mod schema;

pub use envelope::Envelope;
pub use frame::{
    CallFrame, ContractError, ServerFrame, decode_event, decode_reply, encode_call, event_frame,
};
pub use operation::{Event, Operation};
pub use operations::{
    CurrentSession, ENDPOINTS, Endpoint, Login, LoginRequest, Logout, Method, NoArgs, OPERATION_NAMES,
    PASSWORD_MAX_BYTES, PROGRESS_ID_MAX_LEN, Progress, ProgressEvent, PublishProgress,
    ReportProgress, SessionProfile, USERNAME_MAX_LEN, Whoami,
};
pub use schema::{FieldRule, Schema, Validated, Violation, ViolationCode};
