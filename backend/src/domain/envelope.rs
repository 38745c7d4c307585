//! Outcome envelope codec.
//!
//! Every result that leaves the process, over HTTP or a realtime channel, is
//! rendered here. Error envelopes take the error's message; internal errors
//! are logged in full and replaced by the generic message.

use realtime_contract::Envelope;
use tracing::error;

use super::{Error, ErrorCode};

/// Wrap a handler outcome.
///
/// # Examples
/// ```
/// use backend::domain::{Error, outcome_envelope};
///
/// let ok = outcome_envelope(Ok::<_, Error>(5), "Counted");
/// assert_eq!(ok.data(), Some(&5));
///
/// let failed = outcome_envelope(Err::<u8, _>(Error::internal("db down")), "Counted");
/// assert_eq!(failed.message(), "Internal server error");
/// ```
pub fn outcome_envelope<T>(result: Result<T, Error>, success_message: &str) -> Envelope<T> {
    match result {
        Ok(data) => Envelope::success(data, success_message),
        Err(err) => error_envelope(&err),
    }
}

/// Render `err` as an error envelope.
#[must_use]
pub fn error_envelope<T>(err: &Error) -> Envelope<T> {
    if matches!(err.code(), ErrorCode::InternalError) {
        error!(
            trace_id = err.trace_id().unwrap_or("-"),
            error = %err,
            "internal error redacted from client response"
        );
    }
    Envelope::error(err.redacted().message())
}
