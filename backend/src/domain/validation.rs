//! Validation pipeline shared by HTTP handlers and realtime operations.
//!
//! A raw JSON value is checked against the payload type's declared schema,
//! then deserialised from the normalised form. Whatever fails first becomes
//! a single [`ErrorCode::InvalidRequest`](super::ErrorCode::InvalidRequest)
//! error whose message names the offending field. The field and violation
//! code are logged, never returned.

use realtime_contract::{Validated, Violation};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::Error;

/// Turn a schema violation into the normalised domain error.
#[must_use]
pub fn violation_error(violation: &Violation) -> Error {
    debug!(
        field = ?violation.field(),
        code = violation.code().as_str(),
        "payload rejected"
    );
    Error::invalid_request(violation.message())
}

/// Check `input` against `T`'s schema and deserialise it.
///
/// # Examples
/// ```
/// use backend::domain::{ErrorCode, parse_payload};
/// use realtime_contract::Progress;
/// use serde_json::json;
///
/// let progress: Progress =
///     parse_payload(json!({ "id": " 123 ", "progress_percent": 42 })).unwrap();
/// assert_eq!(progress.id, "123");
///
/// let err = parse_payload::<Progress>(json!({ "id": 123 })).unwrap_err();
/// assert_eq!(err.code(), ErrorCode::InvalidRequest);
/// ```
pub fn parse_payload<T>(input: Value) -> Result<T, Error>
where
    T: Validated + DeserializeOwned,
{
    let normalised = T::schema()
        .check(&input)
        .map_err(|violation| violation_error(&violation))?;
    serde_json::from_value(normalised).map_err(|err| {
        debug!(error = %err, "normalised payload failed to deserialise");
        Error::invalid_request(format!("payload is malformed: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use realtime_contract::{FieldRule, LoginRequest, Progress, Schema};
    use rstest::rstest;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Single {
        x: String,
    }

    impl Validated for Single {
        fn schema() -> Schema {
            Schema::object().field(FieldRule::string("x"))
        }
    }

    #[rstest]
    fn string_field_rejects_numbers_with_one_error() {
        let err = parse_payload::<Single>(json!({ "x": 123 })).expect_err("invalid");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err, Error::invalid_request("x must be a string"));
    }

    #[rstest]
    fn string_field_accepts_strings_unchanged() {
        let parsed = parse_payload::<Single>(json!({ "x": "ok" })).expect("valid");
        assert_eq!(parsed, Single { x: "ok".to_owned() });
    }

    #[rstest]
    fn first_violation_wins() {
        let err = parse_payload::<Progress>(json!({ "id": 7, "progress_percent": 900 }))
            .expect_err("invalid");
        assert_eq!(err, Error::invalid_request("id must be a string"));
    }

    #[rstest]
    #[case(
        json!({ "id": "123", "progress_percent": 101 }),
        "progress_percent must be between 0 and 100"
    )]
    #[case(json!({ "id": "   ", "progress_percent": 1 }), "id must not be empty")]
    #[case(json!({ "id": "123" }), "missing required field: progress_percent")]
    fn progress_violations_name_their_field(#[case] input: Value, #[case] message: &str) {
        let err = parse_payload::<Progress>(input).expect_err("invalid");
        assert_eq!(err, Error::invalid_request(message));
    }

    #[rstest]
    fn non_objects_have_no_field() {
        let err = parse_payload::<LoginRequest>(json!(["admin"])).expect_err("invalid");
        assert_eq!(err, Error::invalid_request("payload must be a JSON object"));
    }

    #[rstest]
    fn unknown_fields_are_dropped() {
        let parsed = parse_payload::<Progress>(
            json!({ "id": "run-1", "progress_percent": 5, "admin": true }),
        )
        .expect("valid");
        assert_eq!(parsed.id, "run-1");
    }
}
