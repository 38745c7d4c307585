//! Realtime wire frames and typed client helpers.
//!
//! ```text
//! client → {"request_id":"r1","op":"reportProgress","args":{...}}
//! server → {"kind":"reply","request_id":"r1","op":"reportProgress","payload":<envelope>}
//! server → {"kind":"event","event":"progress","payload":<envelope>}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::Envelope;
use crate::operation::{Event, Operation};

/// Client call frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallFrame {
    /// Client-chosen correlation id echoed in the reply.
    pub request_id: String,
    /// Operation wire name.
    pub op: String,
    /// Raw arguments; absent arguments decode as an empty object.
    #[serde(default = "empty_args")]
    pub args: Value,
}

fn empty_args() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Server frame: a reply to a call or a pushed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ServerFrame {
    /// Outcome of a [`CallFrame`].
    Reply {
        /// Correlation id copied from the call.
        request_id: String,
        /// Operation wire name copied from the call.
        op: String,
        /// Outcome envelope.
        payload: Envelope<Value>,
    },
    /// Server-initiated event.
    Event {
        /// Event wire name.
        event: String,
        /// Event envelope.
        payload: Envelope<Value>,
    },
}

/// Errors raised by the typed client helpers.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// A payload could not be encoded or decoded.
    #[error("payload codec failed: {0}")]
    Codec(#[from] serde_json::Error),
    /// The frame answers a different operation or event.
    #[error("expected frame for `{expected}`, got `{actual}`")]
    NameMismatch {
        /// Name the caller asked for.
        expected: &'static str,
        /// Name found in the frame.
        actual: String,
    },
    /// A reply was expected but an event arrived, or vice versa.
    #[error("unexpected frame kind")]
    UnexpectedKind,
}

/// Encode a call to `O` as a text frame.
///
/// # Examples
/// ```
/// use realtime_contract::{Progress, ReportProgress, encode_call};
///
/// let text = encode_call::<ReportProgress>(
///     "r1",
///     &Progress { id: "123".into(), progress_percent: 42 },
/// )
/// .unwrap();
/// assert!(text.contains("\"op\":\"reportProgress\""));
/// ```
pub fn encode_call<O: Operation>(request_id: &str, args: &O::Args) -> Result<String, ContractError> {
    let frame = CallFrame {
        request_id: request_id.to_owned(),
        op: O::NAME.to_owned(),
        args: serde_json::to_value(args)?,
    };
    Ok(serde_json::to_string(&frame)?)
}

/// Decode a reply frame for `O`, returning its correlation id and typed envelope.
pub fn decode_reply<O: Operation>(
    frame: ServerFrame,
) -> Result<(String, Envelope<O::Output>), ContractError> {
    match frame {
        ServerFrame::Reply {
            request_id,
            op,
            payload,
        } => {
            if op != O::NAME {
                return Err(ContractError::NameMismatch {
                    expected: O::NAME,
                    actual: op,
                });
            }
            let envelope = payload.try_map(serde_json::from_value)?;
            Ok((request_id, envelope))
        }
        ServerFrame::Event { .. } => Err(ContractError::UnexpectedKind),
    }
}

/// Decode an event frame for `E`.
pub fn decode_event<E: Event>(frame: ServerFrame) -> Result<Envelope<E::Payload>, ContractError> {
    match frame {
        ServerFrame::Event { event, payload } => {
            if event != E::NAME {
                return Err(ContractError::NameMismatch {
                    expected: E::NAME,
                    actual: event,
                });
            }
            Ok(payload.try_map(serde_json::from_value)?)
        }
        ServerFrame::Reply { .. } => Err(ContractError::UnexpectedKind),
    }
}

/// Build the event frame a server pushes for `E`.
pub fn event_frame<E: Event>(payload: &E::Payload) -> Result<ServerFrame, ContractError> {
    Ok(ServerFrame::Event {
        event: E::NAME.to_owned(),
        payload: Envelope::success(serde_json::to_value(payload)?, E::MESSAGE),
    })
}
