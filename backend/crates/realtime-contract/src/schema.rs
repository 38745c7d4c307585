//! Declarative payload schemas shared by server and client.
//!
//! A [`Schema`] is an ordered list of field rules for a JSON object. Checking
//! a value walks the rules in declaration order and stops at the first
//! violation, so callers always receive exactly one [`Violation`]. On success
//! the returned object contains only declared fields, with strings trimmed
//! when their rule asks for it.

use std::fmt;

use serde_json::{Map, Value};

/// Machine-readable reason for a schema violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationCode {
    /// The payload was not a JSON object.
    NotAnObject,
    /// A required field was absent or `null`.
    MissingField,
    /// A field had the wrong JSON type.
    InvalidType,
    /// A string field was empty after normalisation.
    Empty,
    /// A string field exceeded its maximum length.
    TooLong,
    /// A numeric field fell outside its allowed range.
    OutOfRange,
}

impl ViolationCode {
    /// Stable snake_case identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotAnObject => "not_an_object",
            Self::MissingField => "missing_field",
            Self::InvalidType => "invalid_type",
            Self::Empty => "empty",
            Self::TooLong => "too_long",
            Self::OutOfRange => "out_of_range",
        }
    }
}

/// The first rule a payload failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    field: Option<&'static str>,
    code: ViolationCode,
    message: String,
}

impl Violation {
    fn new(field: Option<&'static str>, code: ViolationCode, message: String) -> Self {
        Self {
            field,
            code,
            message,
        }
    }

    /// Offending field, or `None` when the payload as a whole is wrong.
    pub fn field(&self) -> Option<&'static str> {
        self.field
    }

    /// Violation category.
    pub fn code(&self) -> ViolationCode {
        self.code
    }

    /// Human-readable description naming the field.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Violation {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct StringRule {
    trim: bool,
    allow_empty: bool,
    max_len: Option<usize>,
    max_bytes: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FieldKind {
    String(StringRule),
    Integer {
        min: Option<i64>,
        max: Option<i64>,
    },
    Boolean,
}

/// Rule for a single object field.
///
/// # Examples
/// ```
/// use realtime_contract::FieldRule;
///
/// let rule = FieldRule::string("username").trimmed().max_len(64);
/// assert_eq!(rule.name(), "username");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    name: &'static str,
    required: bool,
    kind: FieldKind,
}

impl FieldRule {
    /// Required, non-empty string field.
    pub fn string(name: &'static str) -> Self {
        Self {
            name,
            required: true,
            kind: FieldKind::String(StringRule::default()),
        }
    }

    /// Required integer field.
    pub fn integer(name: &'static str) -> Self {
        Self {
            name,
            required: true,
            kind: FieldKind::Integer {
                min: None,
                max: None,
            },
        }
    }

    /// Required boolean field.
    pub fn boolean(name: &'static str) -> Self {
        Self {
            name,
            required: true,
            kind: FieldKind::Boolean,
        }
    }

    /// Field name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Allow the field to be absent or `null`.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Trim surrounding whitespace before other string checks.
    #[must_use]
    pub fn trimmed(mut self) -> Self {
        if let FieldKind::String(rule) = &mut self.kind {
            rule.trim = true;
        }
        self
    }

    /// Accept empty strings.
    #[must_use]
    pub fn allow_empty(mut self) -> Self {
        if let FieldKind::String(rule) = &mut self.kind {
            rule.allow_empty = true;
        }
        self
    }

    /// Maximum string length in characters.
    #[must_use]
    pub fn max_len(mut self, limit: usize) -> Self {
        if let FieldKind::String(rule) = &mut self.kind {
            rule.max_len = Some(limit);
        }
        self
    }

    /// Maximum string length in UTF-8 bytes.
    #[must_use]
    pub fn max_bytes(mut self, limit: usize) -> Self {
        if let FieldKind::String(rule) = &mut self.kind {
            rule.max_bytes = Some(limit);
        }
        self
    }

    /// Inclusive integer bounds.
    #[must_use]
    pub fn range(mut self, lower: i64, upper: i64) -> Self {
        if let FieldKind::Integer { min, max } = &mut self.kind {
            *min = Some(lower);
            *max = Some(upper);
        }
        self
    }

    fn check(&self, value: Option<&Value>) -> Result<Option<Value>, Violation> {
        let value = match value {
            None | Some(Value::Null) if self.required => {
                return Err(self.violation(
                    ViolationCode::MissingField,
                    format!("missing required field: {}", self.name),
                ));
            }
            None | Some(Value::Null) => return Ok(None),
            Some(value) => value,
        };

        match &self.kind {
            FieldKind::String(rule) => self.check_string(value, *rule),
            FieldKind::Integer { min, max } => self.check_integer(value, *min, *max),
            FieldKind::Boolean => match value {
                Value::Bool(_) => Ok(Some(value.clone())),
                _ => Err(self.type_violation("a boolean")),
            },
        }
    }

    fn check_string(&self, value: &Value, rule: StringRule) -> Result<Option<Value>, Violation> {
        let Value::String(raw) = value else {
            return Err(self.type_violation("a string"));
        };
        let normalised = if rule.trim { raw.trim() } else { raw.as_str() };
        if !rule.allow_empty && normalised.trim().is_empty() {
            return Err(self.violation(
                ViolationCode::Empty,
                format!("{} must not be empty", self.name),
            ));
        }
        if let Some(limit) = rule.max_len {
            if normalised.chars().count() > limit {
                return Err(self.violation(
                    ViolationCode::TooLong,
                    format!("{} must be at most {limit} characters", self.name),
                ));
            }
        }
        if let Some(limit) = rule.max_bytes {
            if normalised.len() > limit {
                return Err(self.violation(
                    ViolationCode::TooLong,
                    format!("{} must be at most {limit} bytes", self.name),
                ));
            }
        }
        Ok(Some(Value::String(normalised.to_owned())))
    }

    fn check_integer(
        &self,
        value: &Value,
        min: Option<i64>,
        max: Option<i64>,
    ) -> Result<Option<Value>, Violation> {
        let Some(number) = value.as_i64() else {
            return Err(self.type_violation("an integer"));
        };
        let below = min.is_some_and(|lower| number < lower);
        let above = max.is_some_and(|upper| number > upper);
        if below || above {
            let message = match (min, max) {
                (Some(lower), Some(upper)) => {
                    format!("{} must be between {lower} and {upper}", self.name)
                }
                (Some(lower), None) => format!("{} must be at least {lower}", self.name),
                (None, _) => format!("{} is out of range", self.name),
            };
            return Err(self.violation(ViolationCode::OutOfRange, message));
        }
        Ok(Some(Value::from(number)))
    }

    fn type_violation(&self, expected: &str) -> Violation {
        self.violation(
            ViolationCode::InvalidType,
            format!("{} must be {expected}", self.name),
        )
    }

    fn violation(&self, code: ViolationCode, message: String) -> Violation {
        Violation::new(Some(self.name), code, message)
    }
}

/// Ordered set of field rules describing a JSON object payload.
///
/// # Examples
/// ```
/// use realtime_contract::{FieldRule, Schema, ViolationCode};
/// use serde_json::json;
///
/// let schema = Schema::object().field(FieldRule::string("x"));
/// assert_eq!(schema.check(&json!({"x": "ok"})).unwrap(), json!({"x": "ok"}));
///
/// let violation = schema.check(&json!({"x": 123})).unwrap_err();
/// assert_eq!(violation.field(), Some("x"));
/// assert_eq!(violation.code(), ViolationCode::InvalidType);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldRule>,
}

impl Schema {
    /// Start an object schema with no fields.
    pub fn object() -> Self {
        Self::default()
    }

    /// Append a field rule; rules are checked in the order they are added.
    #[must_use]
    pub fn field(mut self, rule: FieldRule) -> Self {
        self.fields.push(rule);
        self
    }

    /// Declared field rules in check order.
    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }

    /// Check `input` and return its normalised form or the first violation.
    pub fn check(&self, input: &Value) -> Result<Value, Violation> {
        let Value::Object(object) = input else {
            return Err(Violation::new(
                None,
                ViolationCode::NotAnObject,
                "payload must be a JSON object".to_owned(),
            ));
        };

        let mut normalised = Map::new();
        for rule in &self.fields {
            if let Some(value) = rule.check(object.get(rule.name))? {
                normalised.insert(rule.name.to_owned(), value);
            }
        }
        Ok(Value::Object(normalised))
    }
}

/// Types whose JSON form is described by a [`Schema`].
pub trait Validated {
    /// Schema the JSON form must satisfy before deserialisation.
    fn schema() -> Schema;
}
