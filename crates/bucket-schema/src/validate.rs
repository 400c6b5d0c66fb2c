//! # Schema Validation
//!
//! Runtime validation of JSON values against compiled [`Shape`]s.
//!
//! ## Trust Boundary
//!
//! Every request part and every response envelope crossing the HTTP layer
//! is validated here. Documents that fail are rejected with structured
//! violations naming the offending field pointer and the broken rule. The
//! validator never repairs or defaults a value; the only transformation is
//! the declared numeric coercion.
//!
//! ## Pipeline
//!
//! 1. **Coercion pre-pass.** The shape tree is walked alongside the value;
//!    numeric strings under `coerce` numbers become JSON numbers. Strings
//!    that do not look like numbers produce a `NonCoercible` violation and
//!    suppress any further violation at the same pointer.
//! 2. **JSON Schema pass.** The shape's Draft 2020-12 document, compiled
//!    once by the `jsonschema` crate with the custom `url` and `timestamp`
//!    formats, checks types, bounds, required keys and unknown keys. All
//!    errors are collected, not just the first.
//!
//! Compiled schemas hold no mutable state and are `Send + Sync`.

use std::fmt;

use jsonschema::error::ValidationErrorKind;
use jsonschema::Validator;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Number, Value};
use thiserror::Error;

use bucket_core::{is_absolute_url, Timestamp};

use crate::shape::{Shape, TIMESTAMP_FORMAT, URL_FORMAT};

/// Error raised by the contract layer.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// The document did not conform to the contract.
    #[error("validation failed against schema '{schema_name}':\n{violations}")]
    ValidationFailed {
        /// Name of the contract that was validated against.
        schema_name: String,
        /// Structured list of individual violations.
        violations: ValidationViolations,
    },

    /// The compiled validator could not be built (e.g., invalid schema).
    #[error("validator build error for schema '{schema_name}': {reason}")]
    ValidatorBuildError {
        /// Contract name.
        schema_name: String,
        /// Reason the validator could not be built.
        reason: String,
    },

    /// A contract configuration file could not be read or parsed.
    #[error("config load error for '{path}': {reason}")]
    ConfigLoadError {
        /// Path of the configuration file.
        path: String,
        /// Reason the file could not be loaded.
        reason: String,
    },

    /// A contract configuration parsed but is inconsistent.
    #[error("invalid contract config: {reason}")]
    ConfigInvalid {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// The document file could not be loaded or parsed.
    #[error("document load error for '{path}': {reason}")]
    DocumentLoadError {
        /// Path to the document that failed to load.
        path: String,
        /// Reason the document could not be loaded.
        reason: String,
    },

    /// No contract is registered for the requested route part.
    #[error("no contract for {resource} {route} {part}")]
    UnknownContract {
        /// Resource name.
        resource: String,
        /// Route kind.
        route: String,
        /// Route part.
        part: String,
    },

    /// The document validated but does not fit the requested Rust type.
    #[error("schema '{schema_name}' accepted the document but it does not deserialize: {reason}")]
    Deserialize {
        /// Contract name.
        schema_name: String,
        /// serde error text.
        reason: String,
    },

    /// IO error reading a configuration or document.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaValidationError {
    /// The violations of a `ValidationFailed` error, if that is what this is.
    pub fn violations(&self) -> Option<&ValidationViolations> {
        match self {
            SchemaValidationError::ValidationFailed { violations, .. } => Some(violations),
            _ => None,
        }
    }
}

/// The rule a [`Violation`] broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A required key is absent.
    Missing,
    /// The value has the wrong JSON type or literal.
    WrongType,
    /// A number is below its minimum.
    OutOfRange,
    /// A string is shorter than allowed or blank.
    TooShort,
    /// The object has a key the contract does not declare.
    UnknownKey,
    /// A string is not an absolute URL.
    MalformedUrl,
    /// A string is not an RFC 3339 timestamp.
    MalformedTimestamp,
    /// A string under a coerced number does not look like a number.
    NonCoercible,
    /// The envelope `ok` tag is neither `true` nor `false`.
    InvalidDiscriminant,
    /// Any other JSON Schema keyword failure.
    Other,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViolationKind::Missing => "missing",
            ViolationKind::WrongType => "wrong_type",
            ViolationKind::OutOfRange => "out_of_range",
            ViolationKind::TooShort => "too_short",
            ViolationKind::UnknownKey => "unknown_key",
            ViolationKind::MalformedUrl => "malformed_url",
            ViolationKind::MalformedTimestamp => "malformed_timestamp",
            ViolationKind::NonCoercible => "non_coercible",
            ViolationKind::InvalidDiscriminant => "invalid_discriminant",
            ViolationKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// JSON Pointer to the offending field. For missing and unknown keys
    /// this points at the key itself, not its parent object.
    pub instance_path: String,
    /// JSON Pointer within the emitted schema that triggered the error.
    pub schema_path: String,
    /// The broken rule.
    pub kind: ViolationKind,
    /// Human-readable description of the violation.
    pub message: String,
}

impl Violation {
    /// Construct a violation.
    pub fn new(
        kind: ViolationKind,
        instance_path: impl Into<String>,
        schema_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            instance_path: instance_path.into(),
            schema_path: schema_path.into(),
            kind,
            message: message.into(),
        }
    }

    /// The last segment of the instance pointer, unescaped. Empty for the
    /// document root.
    pub fn field(&self) -> String {
        self.instance_path
            .rsplit('/')
            .next()
            .unwrap_or("")
            .replace("~1", "/")
            .replace("~0", "~")
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {} [{}]", self.message, self.kind)
        } else {
            write!(f, "  {}: {} [{}]", self.instance_path, self.message, self.kind)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Returns true if some violation of `kind` points at `instance_path`.
    pub fn contains(&self, kind: ViolationKind, instance_path: &str) -> bool {
        self.violations
            .iter()
            .any(|v| v.kind == kind && v.instance_path == instance_path)
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl From<Vec<Violation>> for ValidationViolations {
    fn from(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// A validator for one route part or envelope.
pub trait Contract: fmt::Debug + Send + Sync {
    /// Contract name used in error messages, e.g. `thumbnails.get.response`.
    fn name(&self) -> &str;

    /// Validate `instance`, returning it with declared coercions applied.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaValidationError::ValidationFailed`] listing every
    /// violation.
    fn validate(&self, instance: &Value) -> Result<Value, SchemaValidationError>;

    /// The JSON Schema document describing this contract.
    fn json_schema(&self) -> Value;
}

/// Validate `instance` with `contract` and deserialize the result into `T`.
///
/// # Errors
///
/// Validation errors as for [`Contract::validate`]; a
/// [`SchemaValidationError::Deserialize`] when the accepted value does not
/// fit `T` (e.g. a fractional id into `u64`).
pub fn parse<T, C>(contract: &C, instance: &Value) -> Result<T, SchemaValidationError>
where
    T: DeserializeOwned,
    C: Contract + ?Sized,
{
    let value = contract.validate(instance)?;
    serde_json::from_value(value).map_err(|e| SchemaValidationError::Deserialize {
        schema_name: contract.name().to_string(),
        reason: e.to_string(),
    })
}

/// A [`Shape`] compiled to a `jsonschema` validator.
pub struct CompiledSchema {
    name: String,
    shape: Shape,
    document: Value,
    coerces: bool,
    validator: Validator,
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

impl CompiledSchema {
    /// Compile `shape` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaValidationError::ValidatorBuildError`] if the emitted
    /// document is rejected by `jsonschema`.
    pub fn compile(name: impl Into<String>, shape: Shape) -> Result<Self, SchemaValidationError> {
        let name = name.into();
        let document = shape.to_json_schema();

        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012)
            .should_validate_formats(true)
            .with_format(URL_FORMAT, is_absolute_url)
            .with_format(TIMESTAMP_FORMAT, Timestamp::is_valid);

        let validator = opts
            .build(&document)
            .map_err(|e| SchemaValidationError::ValidatorBuildError {
                schema_name: name.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            coerces: shape.has_coercion(),
            name,
            shape,
            document,
            validator,
        })
    }

    /// The shape this schema was compiled from.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Validate and deserialize into `T`.
    ///
    /// # Errors
    ///
    /// See [`parse`].
    pub fn parse<T: DeserializeOwned>(&self, instance: &Value) -> Result<T, SchemaValidationError> {
        parse(self, instance)
    }
}

impl Contract for CompiledSchema {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, instance: &Value) -> Result<Value, SchemaValidationError> {
        let mut value = instance.clone();
        let mut violations = Vec::new();

        if self.coerces {
            coerce(&self.shape, &mut value, "", &mut violations);
        }
        let coerced_paths: Vec<String> =
            violations.iter().map(|v| v.instance_path.clone()).collect();

        let schema_violations: Vec<Violation> = self
            .validator
            .iter_errors(&value)
            .flat_map(|e| violations_from(&e))
            .filter(|v| !coerced_paths.contains(&v.instance_path))
            .collect();
        violations.extend(schema_violations);

        if violations.is_empty() {
            Ok(value)
        } else {
            Err(SchemaValidationError::ValidationFailed {
                schema_name: self.name.clone(),
                violations: violations.into(),
            })
        }
    }

    fn json_schema(&self) -> Value {
        self.document.clone()
    }
}

/// Append an RFC 6901 reference token to a JSON Pointer.
pub(crate) fn pointer_push(base: &str, token: &str) -> String {
    format!("{base}/{}", token.replace('~', "~0").replace('/', "~1"))
}

/// Walk `shape` alongside `value`, converting numeric strings in place.
fn coerce(shape: &Shape, value: &mut Value, path: &str, violations: &mut Vec<Violation>) {
    match (shape, value) {
        (Shape::Number { coerce: true, .. }, value) if value.is_string() => {
            match value.as_str().and_then(coerce_number) {
                Some(number) => *value = Value::Number(number),
                None => violations.push(Violation::new(
                    ViolationKind::NonCoercible,
                    path,
                    "",
                    format!("{value} cannot be coerced to a number"),
                )),
            }
        }
        (Shape::Object { fields }, Value::Object(map)) => {
            for field in fields.iter() {
                if let Some(child) = map.get_mut(&field.name) {
                    let child_path = pointer_push(path, &field.name);
                    coerce(&field.shape, child, &child_path, violations);
                }
            }
        }
        (Shape::Array { items }, Value::Array(elements)) => {
            for (i, element) in elements.iter_mut().enumerate() {
                let child_path = pointer_push(path, &i.to_string());
                coerce(items, element, &child_path, violations);
            }
        }
        _ => {}
    }
}

/// Parse a numeric-looking string. Surrounding whitespace is ignored;
/// empty, non-finite and non-decimal inputs are rejected. Integral results
/// become JSON integers so `"5"` coerces to `5`, not `5.0`.
///
/// Stricter than JavaScript `Number()`: `""`, `"  "` and `"0x10"` do not
/// become `0` or `16` here.
fn coerce_number(text: &str) -> Option<Number> {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed: f64 = trimmed.parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }
    if parsed.fract() == 0.0 && parsed.abs() <= MAX_SAFE_INTEGER {
        return Some(Number::from(parsed as i64));
    }
    Number::from_f64(parsed)
}

/// Map one `jsonschema` error to violations. `additionalProperties`
/// failures expand to one violation per unexpected key.
fn violations_from(error: &jsonschema::ValidationError<'_>) -> Vec<Violation> {
    let base = error.instance_path.to_string();
    let schema_path = error.schema_path.to_string();

    let kind = match &error.kind {
        ValidationErrorKind::Required { property } => {
            let name = property
                .as_str()
                .map(str::to_owned)
                .unwrap_or_else(|| property.to_string());
            return vec![Violation::new(
                ViolationKind::Missing,
                pointer_push(&base, &name),
                schema_path,
                format!("missing required field \"{name}\""),
            )];
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            return unexpected
                .iter()
                .map(|key| {
                    Violation::new(
                        ViolationKind::UnknownKey,
                        pointer_push(&base, key),
                        schema_path.clone(),
                        format!("unknown key \"{key}\" is not allowed"),
                    )
                })
                .collect();
        }
        ValidationErrorKind::Type { .. } | ValidationErrorKind::Constant { .. } => {
            ViolationKind::WrongType
        }
        ValidationErrorKind::Minimum { .. } => ViolationKind::OutOfRange,
        ValidationErrorKind::MinLength { .. } | ValidationErrorKind::Pattern { .. } => {
            ViolationKind::TooShort
        }
        ValidationErrorKind::Format { format } if format == URL_FORMAT => {
            ViolationKind::MalformedUrl
        }
        ValidationErrorKind::Format { format } if format == TIMESTAMP_FORMAT => {
            ViolationKind::MalformedTimestamp
        }
        _ => ViolationKind::Other,
    };

    vec![Violation::new(kind, base, schema_path, error.to_string())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ObjectShape;
    use serde_json::json;

    fn compile(shape: ObjectShape) -> CompiledSchema {
        CompiledSchema::compile("test", Shape::object(shape)).unwrap()
    }

    fn violations_of(schema: &CompiledSchema, value: Value) -> ValidationViolations {
        match schema.validate(&value) {
            Err(SchemaValidationError::ValidationFailed { violations, .. }) => violations,
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    fn id_params() -> CompiledSchema {
        compile(ObjectShape::new().required("id", Shape::coerced_min(1)))
    }

    #[test]
    fn test_valid_value_is_returned_unchanged() {
        let schema = compile(
            ObjectShape::new()
                .required("id", Shape::number_min(0))
                .required("url", Shape::Url)
                .required("name", Shape::text_min(1)),
        );
        let doc = json!({ "id": 1, "url": "http://x.com", "name": "Hello" });
        assert_eq!(schema.validate(&doc).unwrap(), doc);
    }

    #[test]
    fn test_unknown_key_rejected_and_named() {
        let schema = compile(ObjectShape::new().required("id", Shape::number()));
        let violations = violations_of(&schema, json!({ "id": 1, "hey": 1 }));
        assert!(violations.contains(ViolationKind::UnknownKey, "/hey"));
    }

    #[test]
    fn test_all_unknown_keys_reported() {
        let schema = compile(ObjectShape::new().optional("skip", Shape::number()));
        let violations = violations_of(&schema, json!({ "a": 1, "b": 2 }));
        assert!(violations.contains(ViolationKind::UnknownKey, "/a"));
        assert!(violations.contains(ViolationKind::UnknownKey, "/b"));
    }

    #[test]
    fn test_missing_and_unknown_surface_together() {
        let violations = violations_of(&id_params(), json!({ "a": 1 }));
        assert!(violations.contains(ViolationKind::Missing, "/id"));
        assert!(violations.contains(ViolationKind::UnknownKey, "/a"));
    }

    #[test]
    fn test_optional_field_may_be_absent() {
        let schema = compile(
            ObjectShape::new()
                .optional("skip", Shape::number())
                .optional("take", Shape::number()),
        );
        assert_eq!(schema.validate(&json!({})).unwrap(), json!({}));
    }

    #[test]
    fn test_wrong_type_named() {
        let violations = violations_of(&id_params(), json!({ "id": {} }));
        assert!(violations.contains(ViolationKind::WrongType, "/id"));
    }

    #[test]
    fn test_coerces_numeric_string() {
        let value = id_params().validate(&json!({ "id": "5" })).unwrap();
        assert_eq!(value, json!({ "id": 5 }));
    }

    #[test]
    fn test_coerces_padded_and_fractional_strings() {
        let schema = compile(ObjectShape::new().required("n", Shape::coerced()));
        assert_eq!(schema.validate(&json!({ "n": " 7 " })).unwrap(), json!({ "n": 7 }));
        assert_eq!(schema.validate(&json!({ "n": "2.5" })).unwrap(), json!({ "n": 2.5 }));
    }

    #[test]
    fn test_coerced_value_below_minimum_rejected() {
        let violations = violations_of(&id_params(), json!({ "id": "0" }));
        assert!(violations.contains(ViolationKind::OutOfRange, "/id"));
    }

    #[test]
    fn test_violations_unwrap_into_owned_list() {
        let schema = compile(ObjectShape::new().required("id", Shape::number()));
        let mut paths: Vec<String> = violations_of(&schema, json!({ "b": 1, "a": 2 }))
            .into_inner()
            .into_iter()
            .map(|v| v.instance_path)
            .collect();
        paths.sort();
        assert_eq!(paths, ["/a", "/b", "/id"]);
    }

    #[test]
    fn test_non_numeric_string_is_non_coercible_only() {
        let violations = violations_of(&id_params(), json!({ "id": "abc" }));
        assert_eq!(violations.len(), 1);
        assert!(violations.contains(ViolationKind::NonCoercible, "/id"));
    }

    #[test]
    fn test_empty_and_non_finite_strings_not_coercible() {
        for raw in ["", "   ", "NaN", "inf", "0x10"] {
            let violations = violations_of(&id_params(), json!({ "id": raw }));
            assert!(
                violations.contains(ViolationKind::NonCoercible, "/id"),
                "{raw:?} should not coerce"
            );
        }
    }

    #[test]
    fn test_uncoerced_number_rejects_string() {
        let schema = compile(ObjectShape::new().required("skip", Shape::number()));
        let violations = violations_of(&schema, json!({ "skip": "1" }));
        assert!(violations.contains(ViolationKind::WrongType, "/skip"));
    }

    #[test]
    fn test_coercion_inside_arrays() {
        let entity = ObjectShape::new().required("reference_pack_id", Shape::coerced_min(0));
        let schema =
            CompiledSchema::compile("list", Shape::array(Shape::object(entity))).unwrap();
        let value = schema
            .validate(&json!([{ "reference_pack_id": "3" }]))
            .unwrap();
        assert_eq!(value, json!([{ "reference_pack_id": 3 }]));
    }

    #[test]
    fn test_malformed_url() {
        let schema = compile(ObjectShape::new().required("url", Shape::Url));
        for raw in ["http://", "github.com", "not a url"] {
            let violations = violations_of(&schema, json!({ "url": raw }));
            assert!(
                violations.contains(ViolationKind::MalformedUrl, "/url"),
                "{raw:?} should be a malformed url"
            );
        }
    }

    #[test]
    fn test_malformed_timestamp() {
        let schema = compile(ObjectShape::new().required("createdAt", Shape::Timestamp));
        let violations = violations_of(&schema, json!({ "createdAt": "yesterday" }));
        assert!(violations.contains(ViolationKind::MalformedTimestamp, "/createdAt"));
        assert!(schema
            .validate(&json!({ "createdAt": "2024-07-24T10:49:01.854Z" }))
            .is_ok());
    }

    #[test]
    fn test_min_length_and_blank() {
        let schema = compile(
            ObjectShape::new()
                .required("error", Shape::text_min(1))
                .required("name", Shape::NonBlank),
        );
        let violations = violations_of(&schema, json!({ "error": "", "name": "   " }));
        assert!(violations.contains(ViolationKind::TooShort, "/error"));
        assert!(violations.contains(ViolationKind::TooShort, "/name"));
    }

    #[test]
    fn test_nested_pointer_paths() {
        let inner = ObjectShape::new().required("size", Shape::number_min(0));
        let schema = compile(ObjectShape::new().required("file", Shape::object(inner)));
        let violations = violations_of(&schema, json!({ "file": { "size": -1, "x/y": 1 } }));
        assert!(violations.contains(ViolationKind::OutOfRange, "/file/size"));
        assert!(violations.contains(ViolationKind::UnknownKey, "/file/x~1y"));
    }

    #[test]
    fn test_non_object_rejected() {
        let violations = violations_of(&id_params(), json!("id"));
        assert!(violations.contains(ViolationKind::WrongType, ""));
    }

    #[test]
    fn test_violation_field_unescapes() {
        let v = Violation::new(ViolationKind::UnknownKey, "/file/x~1y", "", "x");
        assert_eq!(v.field(), "x/y");
    }

    #[test]
    fn test_violation_display_format() {
        let v = Violation::new(
            ViolationKind::UnknownKey,
            "/data/0/hey",
            "/properties/data/items/additionalProperties",
            "unknown key \"hey\" is not allowed",
        );
        let display = v.to_string();
        assert!(display.contains("/data/0/hey"));
        assert!(display.contains("unknown_key"));
    }

    #[test]
    fn test_violation_display_root() {
        let v = Violation::new(ViolationKind::WrongType, "", "/type", "expected an object");
        assert!(v.to_string().contains("(root)"));
    }

    #[test]
    fn test_error_display_names_schema() {
        let err = id_params().validate(&json!({})).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'test'"));
        assert!(msg.contains("/id"));
    }

    #[test]
    fn test_parse_into_typed_value() {
        #[derive(serde::Deserialize)]
        struct IdParams {
            id: u64,
        }
        let params: IdParams = id_params().parse(&json!({ "id": "12" })).unwrap();
        assert_eq!(params.id, 12);
    }

    #[test]
    fn test_parse_reports_deserialize_mismatch() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct IdParams {
            id: u64,
        }
        let err = id_params().parse::<IdParams>(&json!({ "id": 1.5 })).unwrap_err();
        assert!(matches!(err, SchemaValidationError::Deserialize { .. }));
    }

    #[test]
    fn test_compiled_schema_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompiledSchema>();
    }
}
