//! Operation outcome envelope.
//!
//! Every externally observable result, whether an HTTP response body, a reply
//! to a realtime call or a pushed event, is one of two tagged shapes:
//!
//! ```text
//! {"state":"success","data":<T>,"message":"..."}
//! {"state":"error","message":"..."}
//! ```
//!
//! `data` exists only on the success variant, so the "data present iff
//! success" invariant is carried by the type rather than checked at runtime.

use serde::{Deserialize, Serialize};

/// Tagged success/error wrapper around an operation result.
///
/// # Examples
/// ```
/// use realtime_contract::Envelope;
///
/// let ok = Envelope::success(42_u8, "done");
/// assert!(ok.is_success());
/// assert_eq!(ok.data(), Some(&42));
///
/// let failed: Envelope<u8> = Envelope::error("nope");
/// assert_eq!(failed.message(), "nope");
/// assert!(failed.data().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Envelope<T> {
    /// The operation completed and produced `data`.
    Success {
        /// Operation result.
        data: T,
        /// Human-readable summary of the outcome.
        message: String,
    },
    /// The operation failed; `message` is safe to show to end users.
    Error {
        /// Human-readable failure description.
        message: String,
    },
}

impl<T> Envelope<T> {
    /// Wrap a successful result.
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self::Success {
            data,
            message: message.into(),
        }
    }

    /// Wrap a failure message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Whether the envelope carries a successful outcome.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Message attached to either variant.
    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. } | Self::Error { message } => message.as_str(),
        }
    }

    /// Borrow the payload of a successful outcome.
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Error { .. } => None,
        }
    }

    /// Transform the success payload, leaving errors untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        match self {
            Self::Success { data, message } => Envelope::Success {
                data: f(data),
                message,
            },
            Self::Error { message } => Envelope::Error { message },
        }
    }

    /// Fallibly transform the success payload.
    ///
    /// Used by clients to turn a loosely typed `Envelope<Value>` into the
    /// concrete output type of an operation.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Envelope<U>, E> {
        match self {
            Self::Success { data, message } => Ok(Envelope::Success {
                data: f(data)?,
                message,
            }),
            Self::Error { message } => Ok(Envelope::Error { message }),
        }
    }

    /// Convert into a `Result`, yielding the error message on failure.
    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Success { data, .. } => Ok(data),
            Self::Error { message } => Err(message),
        }
    }
}
