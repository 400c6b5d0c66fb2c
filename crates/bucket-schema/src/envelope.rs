//! # Response Envelope
//!
//! Every response body is wrapped in one of two closed shapes:
//!
//! ```json
//! { "ok": true,  "data": <T> }
//! { "ok": false, "error": "<non-empty message>" }
//! ```
//!
//! `ok` is the discriminant. [`EnvelopeSchema::validate`] reads it first and
//! validates against the selected branch only, so the violations reported
//! for a malformed success body never mention the error branch and vice
//! versa.
//!
//! [`ApiResponse`] is the typed mirror used by handlers and clients.

use std::fmt;

use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::shape::{ObjectShape, Shape};
use crate::validate::{
    parse, CompiledSchema, Contract, SchemaValidationError, Violation, ViolationKind,
};

/// Name of the discriminant key.
pub const DISCRIMINANT: &str = "ok";

/// Shape of `{ok: true, data: <data>}`.
pub fn success_shape(data: Shape) -> Shape {
    Shape::object(
        ObjectShape::new()
            .required(DISCRIMINANT, Shape::literal(true))
            .required("data", data),
    )
}

/// Shape of `{ok: false, error: <non-empty string>}`.
pub fn error_shape() -> Shape {
    Shape::object(
        ObjectShape::new()
            .required(DISCRIMINANT, Shape::literal(false))
            .required("error", Shape::text_min(1)),
    )
}

/// Compile the success branch for `data`.
///
/// # Errors
///
/// Returns [`SchemaValidationError::ValidatorBuildError`] if compilation fails.
pub fn success_schema(
    name: impl Into<String>,
    data: Shape,
) -> Result<CompiledSchema, SchemaValidationError> {
    CompiledSchema::compile(name, success_shape(data))
}

/// Compile the fixed error branch.
///
/// # Errors
///
/// Returns [`SchemaValidationError::ValidatorBuildError`] if compilation fails.
pub fn error_schema(name: impl Into<String>) -> Result<CompiledSchema, SchemaValidationError> {
    CompiledSchema::compile(name, error_shape())
}

/// Compile the full discriminated envelope for `data`.
///
/// # Errors
///
/// Returns [`SchemaValidationError::ValidatorBuildError`] if either branch
/// fails to compile.
pub fn envelope_schema(
    name: impl Into<String>,
    data: Shape,
) -> Result<EnvelopeSchema, SchemaValidationError> {
    let name = name.into();
    Ok(EnvelopeSchema {
        success: success_schema(format!("{name}#success"), data)?,
        error: error_schema(format!("{name}#error"))?,
        name,
    })
}

/// The discriminated union of a success branch and the error branch.
#[derive(Debug)]
pub struct EnvelopeSchema {
    name: String,
    success: CompiledSchema,
    error: CompiledSchema,
}

impl EnvelopeSchema {
    /// The success branch.
    pub fn success(&self) -> &CompiledSchema {
        &self.success
    }

    /// The error branch.
    pub fn error(&self) -> &CompiledSchema {
        &self.error
    }

    /// Validate and deserialize into `ApiResponse<T>` (or any other `T`).
    ///
    /// # Errors
    ///
    /// See [`crate::validate::parse`].
    pub fn parse<T: DeserializeOwned>(&self, instance: &Value) -> Result<T, SchemaValidationError> {
        parse(self, instance)
    }

    fn reject(&self, violation: Violation) -> SchemaValidationError {
        SchemaValidationError::ValidationFailed {
            schema_name: self.name.clone(),
            violations: vec![violation].into(),
        }
    }
}

impl Contract for EnvelopeSchema {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, instance: &Value) -> Result<Value, SchemaValidationError> {
        let Value::Object(map) = instance else {
            return Err(self.reject(Violation::new(
                ViolationKind::WrongType,
                "",
                "/oneOf",
                format!("{instance} is not an object"),
            )));
        };

        let branch = match map.get(DISCRIMINANT) {
            Some(Value::Bool(true)) => &self.success,
            Some(Value::Bool(false)) => &self.error,
            Some(other) => {
                return Err(self.reject(Violation::new(
                    ViolationKind::InvalidDiscriminant,
                    "/ok",
                    "/oneOf",
                    format!("{other} is neither true nor false"),
                )))
            }
            None => {
                return Err(self.reject(Violation::new(
                    ViolationKind::Missing,
                    "/ok",
                    "/oneOf",
                    "missing required field \"ok\"",
                )))
            }
        };

        branch.validate(instance).map_err(|e| match e {
            SchemaValidationError::ValidationFailed { violations, .. } => {
                SchemaValidationError::ValidationFailed {
                    schema_name: self.name.clone(),
                    violations,
                }
            }
            other => other,
        })
    }

    fn json_schema(&self) -> Value {
        json!({ "oneOf": [self.success.json_schema(), self.error.json_schema()] })
    }
}

/// Typed response envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    /// `{ok: true, data}`
    Success(T),
    /// `{ok: false, error}`
    Error(String),
}

impl<T> ApiResponse<T> {
    /// Wrap a payload.
    pub fn success(data: T) -> Self {
        ApiResponse::Success(data)
    }

    /// Wrap an error message.
    pub fn error(message: impl Into<String>) -> Self {
        ApiResponse::Error(message.into())
    }

    /// Returns `true` for the success branch.
    pub fn is_ok(&self) -> bool {
        matches!(self, ApiResponse::Success(_))
    }

    /// Convert into a `Result`.
    pub fn into_result(self) -> Result<T, String> {
        match self {
            ApiResponse::Success(data) => Ok(data),
            ApiResponse::Error(message) => Err(message),
        }
    }
}

impl<T: Serialize> Serialize for ApiResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ApiResponse", 2)?;
        match self {
            ApiResponse::Success(data) => {
                state.serialize_field(DISCRIMINANT, &true)?;
                state.serialize_field("data", data)?;
            }
            ApiResponse::Error(message) => {
                state.serialize_field(DISCRIMINANT, &false)?;
                state.serialize_field("error", message)?;
            }
        }
        state.end()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEnvelope<T> {
    ok: bool,
    #[serde(default = "Option::default")]
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ApiResponse<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawEnvelope::<T>::deserialize(deserializer)?;
        match (raw.ok, raw.data, raw.error) {
            (true, Some(data), None) => Ok(ApiResponse::Success(data)),
            (false, None, Some(error)) if !error.is_empty() => Ok(ApiResponse::Error(error)),
            (false, None, Some(_)) => Err(D::Error::custom("error message must not be empty")),
            (true, _, _) => Err(D::Error::custom("success envelope requires exactly `ok` and `data`")),
            (false, _, _) => Err(D::Error::custom("error envelope requires exactly `ok` and `error`")),
        }
    }
}

impl<T: fmt::Display> fmt::Display for ApiResponse<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiResponse::Success(data) => write!(f, "ok: {data}"),
            ApiResponse::Error(message) => write!(f, "error: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ValidationViolations;

    fn url_object() -> Shape {
        Shape::object(ObjectShape::new().required("url", Shape::Url))
    }

    fn violations(result: Result<Value, SchemaValidationError>) -> ValidationViolations {
        match result {
            Err(SchemaValidationError::ValidationFailed { violations, .. }) => violations,
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn success_schema_accepts_valid_payload() {
        let schema = success_schema("s", url_object()).unwrap();
        let doc = json!({ "ok": true, "data": { "url": "https://github.com" } });
        assert_eq!(schema.validate(&doc).unwrap(), doc);
    }

    #[test]
    fn success_schema_rejects_wrong_envelope() {
        let schema = success_schema("s", Shape::text()).unwrap();
        let v = violations(schema.validate(&json!({ "badReq": "" })));
        assert!(v.contains(ViolationKind::Missing, "/ok"));
        assert!(v.contains(ViolationKind::Missing, "/data"));
        assert!(v.contains(ViolationKind::UnknownKey, "/badReq"));
    }

    #[test]
    fn success_schema_rejects_invalid_payload() {
        let schema = success_schema("s", url_object()).unwrap();
        let v = violations(schema.validate(&json!({ "ok": true, "data": { "url": 1 } })));
        assert!(v.contains(ViolationKind::WrongType, "/data/url"));
    }

    #[test]
    fn error_schema_accepts_message() {
        let schema = error_schema("e").unwrap();
        let doc = json!({ "ok": false, "error": "There was an error" });
        assert_eq!(schema.validate(&doc).unwrap(), doc);
    }

    #[test]
    fn error_schema_rejects_bad_shapes() {
        let schema = error_schema("e").unwrap();
        assert!(schema.validate(&json!({ "badReq": "" })).is_err());
        let v = violations(schema.validate(&json!({ "ok": false, "error": 1 })));
        assert!(v.contains(ViolationKind::WrongType, "/error"));
        let v = violations(schema.validate(&json!({ "ok": false, "error": "" })));
        assert!(v.contains(ViolationKind::TooShort, "/error"));
    }

    #[test]
    fn envelope_dispatches_on_true() {
        let schema = envelope_schema("env", url_object()).unwrap();
        let doc = json!({ "ok": true, "data": { "url": "https://github.com" } });
        assert_eq!(schema.validate(&doc).unwrap(), doc);
    }

    #[test]
    fn envelope_dispatches_on_false() {
        let schema = envelope_schema("env", url_object()).unwrap();
        let doc = json!({ "ok": false, "error": "There was an error" });
        assert_eq!(schema.validate(&doc).unwrap(), doc);
    }

    #[test]
    fn envelope_true_branch_with_wrong_key() {
        let schema = envelope_schema("env", Shape::text()).unwrap();
        let v = violations(schema.validate(&json!({ "ok": true, "message": "Hi" })));
        assert!(v.contains(ViolationKind::Missing, "/data"));
        assert!(v.contains(ViolationKind::UnknownKey, "/message"));
        assert!(!v.contains(ViolationKind::Missing, "/error"));
    }

    #[test]
    fn envelope_false_branch_with_wrong_key() {
        let schema = envelope_schema("env", Shape::text()).unwrap();
        let v = violations(schema.validate(&json!({ "ok": false, "message": "Hi" })));
        assert!(v.contains(ViolationKind::Missing, "/error"));
        assert!(v.contains(ViolationKind::UnknownKey, "/message"));
    }

    #[test]
    fn envelope_missing_discriminant() {
        let schema = envelope_schema("env", Shape::text()).unwrap();
        let v = violations(schema.validate(&json!({ "data": "x" })));
        assert_eq!(v.len(), 1);
        assert!(v.contains(ViolationKind::Missing, "/ok"));
    }

    #[test]
    fn envelope_non_boolean_discriminant() {
        let schema = envelope_schema("env", Shape::text()).unwrap();
        let v = violations(schema.validate(&json!({ "ok": "true", "data": "x" })));
        assert!(v.contains(ViolationKind::InvalidDiscriminant, "/ok"));
    }

    #[test]
    fn envelope_rejects_non_object() {
        let schema = envelope_schema("env", Shape::text()).unwrap();
        let v = violations(schema.validate(&json!([true])));
        assert!(v.contains(ViolationKind::WrongType, ""));
    }

    #[test]
    fn envelope_errors_carry_envelope_name() {
        let schema = envelope_schema("thumbnails.get.response", Shape::text()).unwrap();
        let err = schema.validate(&json!({ "ok": true })).unwrap_err();
        assert!(err.to_string().contains("'thumbnails.get.response'"));
    }

    #[test]
    fn envelope_json_schema_is_one_of_two_closed_branches() {
        let schema = envelope_schema("env", Shape::text()).unwrap();
        let doc = schema.json_schema();
        let branches = doc["oneOf"].as_array().unwrap();
        assert_eq!(branches.len(), 2);
        for branch in branches {
            assert_eq!(branch["additionalProperties"], json!(false));
        }
    }

    #[test]
    fn envelope_branches_are_reachable_by_name() {
        let schema = envelope_schema("env", url_object()).unwrap();
        assert_eq!(schema.success().name(), "env#success");
        assert_eq!(schema.error().name(), "env#error");
        assert!(schema.error().validate(&json!({ "ok": false, "error": "x" })).is_ok());
        let v = violations(schema.success().validate(&json!({ "ok": false, "error": "x" })));
        assert!(v.contains(ViolationKind::Missing, "/data"));
    }

    #[test]
    fn api_response_serializes_both_branches() {
        let ok: ApiResponse<u32> = ApiResponse::success(1);
        assert!(ok.is_ok());
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({ "ok": true, "data": 1 }));
        let err: ApiResponse<u32> = ApiResponse::error("Hy");
        assert!(!err.is_ok());
        assert_eq!(serde_json::to_value(&err).unwrap(), json!({ "ok": false, "error": "Hy" }));
    }

    #[test]
    fn api_response_deserializes_both_branches() {
        let ok: ApiResponse<String> =
            serde_json::from_value(json!({ "ok": true, "data": "x" })).unwrap();
        assert_eq!(ok.into_result(), Ok("x".to_string()));
        let err: ApiResponse<String> =
            serde_json::from_value(json!({ "ok": false, "error": "boom" })).unwrap();
        assert_eq!(err.into_result(), Err("boom".to_string()));
    }

    #[test]
    fn api_response_rejects_mixed_or_extra_keys() {
        for doc in [
            json!({ "ok": true }),
            json!({ "ok": false }),
            json!({ "ok": false, "error": "" }),
            json!({ "ok": true, "data": "x", "error": "y" }),
            json!({ "ok": true, "data": "x", "hey": 1 }),
            json!({ "data": "x" }),
        ] {
            assert!(
                serde_json::from_value::<ApiResponse<String>>(doc.clone()).is_err(),
                "{doc} should not deserialize"
            );
        }
    }

    #[test]
    fn envelope_parse_into_api_response() {
        let schema = envelope_schema("env", url_object()).unwrap();
        #[derive(Debug, Deserialize, PartialEq)]
        struct Link {
            url: String,
        }
        let parsed: ApiResponse<Link> = schema
            .parse(&json!({ "ok": true, "data": { "url": "https://github.com" } }))
            .unwrap();
        assert_eq!(
            parsed,
            ApiResponse::Success(Link {
                url: "https://github.com".to_string()
            })
        );
    }
}
