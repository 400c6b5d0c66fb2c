//! # Shapes
//!
//! The declarative model every contract is built from. A [`Shape`] is the
//! type of one JSON value; an [`ObjectShape`] is an ordered, closed list of
//! [`Field`]s.
//!
//! Shapes are plain data: they derive `Serialize`/`Deserialize` so that a
//! deployment can declare its field lists in YAML (see
//! [`crate::config::ContractConfig`]). They are turned into Draft 2020-12
//! JSON Schema documents by [`Shape::to_json_schema`] and compiled by
//! [`crate::validate::CompiledSchema`].
//!
//! ## Closed Objects
//!
//! Every object emitted by this module carries `additionalProperties: false`.
//! There is no way to declare an open object. [`crate::audit`] verifies the
//! emitted documents independently.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Custom `format` name checked with the WHATWG URL parser.
pub const URL_FORMAT: &str = "url";

/// Custom `format` name checked as RFC 3339.
pub const TIMESTAMP_FORMAT: &str = "timestamp";

/// Pattern requiring at least one non-whitespace character.
const NON_BLANK_PATTERN: &str = "\\S";

/// The declared type of a single JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum Shape {
    /// A JSON number, optionally bounded below. With `coerce`, strings that
    /// look like numbers are converted before the bound is checked.
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<i64>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        coerce: bool,
    },
    /// A string with an optional minimum length.
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<u64>,
    },
    /// A string containing at least one non-whitespace character.
    NonBlank,
    /// An absolute URL string.
    Url,
    /// An RFC 3339 / ISO-8601 timestamp string.
    Timestamp,
    /// `true` or `false`.
    Boolean,
    /// Exactly this JSON value.
    Literal { value: Value },
    /// A closed record.
    Object { fields: ObjectShape },
    /// A homogeneous array.
    Array { items: Box<Shape> },
}

impl Shape {
    /// An unbounded number.
    pub fn number() -> Self {
        Shape::Number {
            minimum: None,
            coerce: false,
        }
    }

    /// A number `>= minimum`.
    pub fn number_min(minimum: i64) -> Self {
        Shape::Number {
            minimum: Some(minimum),
            coerce: false,
        }
    }

    /// A number `>= minimum` that also accepts numeric strings.
    pub fn coerced_min(minimum: i64) -> Self {
        Shape::Number {
            minimum: Some(minimum),
            coerce: true,
        }
    }

    /// An unbounded number that also accepts numeric strings.
    pub fn coerced() -> Self {
        Shape::Number {
            minimum: None,
            coerce: true,
        }
    }

    /// Any string.
    pub fn text() -> Self {
        Shape::Text { min_length: None }
    }

    /// A string of at least `min_length` characters.
    pub fn text_min(min_length: u64) -> Self {
        Shape::Text {
            min_length: Some(min_length),
        }
    }

    /// Exactly `value`.
    pub fn literal(value: impl Into<Value>) -> Self {
        Shape::Literal {
            value: value.into(),
        }
    }

    /// A closed record with the given fields.
    pub fn object(fields: ObjectShape) -> Self {
        Shape::Object { fields }
    }

    /// An array of `items`.
    pub fn array(items: Shape) -> Self {
        Shape::Array {
            items: Box::new(items),
        }
    }

    /// Render this shape as a JSON Schema fragment.
    pub fn to_json_schema(&self) -> Value {
        match self {
            Shape::Number { minimum, .. } => {
                let mut schema = json!({ "type": "number" });
                if let Some(min) = minimum {
                    schema["minimum"] = json!(min);
                }
                schema
            }
            Shape::Text { min_length } => {
                let mut schema = json!({ "type": "string" });
                if let Some(min) = min_length {
                    schema["minLength"] = json!(min);
                }
                schema
            }
            Shape::NonBlank => json!({ "type": "string", "pattern": NON_BLANK_PATTERN }),
            Shape::Url => json!({ "type": "string", "format": URL_FORMAT }),
            Shape::Timestamp => json!({ "type": "string", "format": TIMESTAMP_FORMAT }),
            Shape::Boolean => json!({ "type": "boolean" }),
            Shape::Literal { value } => json!({ "const": value }),
            Shape::Object { fields } => fields.to_json_schema(),
            Shape::Array { items } => json!({
                "type": "array",
                "items": items.to_json_schema(),
            }),
        }
    }

    /// Returns `true` if this shape, or anything nested in it, coerces.
    pub fn has_coercion(&self) -> bool {
        match self {
            Shape::Number { coerce, .. } => *coerce,
            Shape::Object { fields } => fields.iter().any(|f| f.shape.has_coercion()),
            Shape::Array { items } => items.has_coercion(),
            _ => false,
        }
    }
}

/// One declared key of an [`ObjectShape`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Field {
    /// Key name in the JSON object.
    pub name: String,
    /// Type of the value under that key.
    pub shape: Shape,
    /// When `true`, the key may be absent.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl Field {
    /// A key that must be present.
    pub fn required(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
            optional: false,
        }
    }

    /// A key that may be absent.
    pub fn optional(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
            optional: true,
        }
    }
}

/// An ordered list of fields describing a closed JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectShape {
    fields: Vec<Field>,
}

impl ObjectShape {
    /// An object with no keys. Only `{}` satisfies it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required key.
    pub fn required(self, name: impl Into<String>, shape: Shape) -> Self {
        self.with(Field::required(name, shape))
    }

    /// Add an optional key.
    pub fn optional(self, name: impl Into<String>, shape: Shape) -> Self {
        self.with(Field::optional(name, shape))
    }

    /// Add a field, replacing an existing field with the same name in place.
    pub fn with(mut self, field: Field) -> Self {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    /// Combine two shapes. Fields of `other` replace same-named fields of
    /// `self`; new fields are appended in `other`'s order.
    pub fn merge(self, other: &ObjectShape) -> Self {
        other.fields.iter().cloned().fold(self, ObjectShape::with)
    }

    /// Drop the named fields. Unknown names are ignored.
    pub fn omit(mut self, names: &[impl AsRef<str>]) -> Self {
        self.fields
            .retain(|f| !names.iter().any(|n| n.as_ref() == f.name));
        self
    }

    /// Make every field optional. The shape stays closed.
    pub fn partial(mut self) -> Self {
        for field in &mut self.fields {
            field.optional = true;
        }
        self
    }

    /// Iterate the declared fields in order.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns `true` if the key is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of declared keys.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no key is declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names that appear more than once. Shapes built through [`with`]
    /// never contain duplicates; deserialized ones can.
    ///
    /// [`with`]: ObjectShape::with
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        let mut dupes: Vec<&str> = Vec::new();
        for field in &self.fields {
            let name = field.name.as_str();
            if seen.contains(&name) {
                if !dupes.contains(&name) {
                    dupes.push(name);
                }
            } else {
                seen.push(name);
            }
        }
        dupes
    }

    /// Render as a closed JSON Schema object.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &self.fields {
            properties.insert(field.name.clone(), field.shape.to_json_schema());
            if !field.optional {
                required.push(Value::String(field.name.clone()));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}

impl From<Vec<Field>> for ObjectShape {
    fn from(fields: Vec<Field>) -> Self {
        fields.into_iter().fold(ObjectShape::new(), ObjectShape::with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ObjectShape {
        ObjectShape::new()
            .required("id", Shape::number_min(0))
            .required("url", Shape::Url)
            .optional("note", Shape::text())
    }

    #[test]
    fn object_schema_is_closed() {
        let schema = sample().to_json_schema();
        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(schema["type"], "object");
    }

    #[test]
    fn required_list_excludes_optional_fields() {
        let schema = sample().to_json_schema();
        assert_eq!(schema["required"], json!(["id", "url"]));
    }

    #[test]
    fn number_minimum_is_emitted() {
        assert_eq!(
            Shape::coerced_min(1).to_json_schema(),
            json!({ "type": "number", "minimum": 1 })
        );
    }

    #[test]
    fn url_and_timestamp_use_custom_formats() {
        assert_eq!(Shape::Url.to_json_schema()["format"], URL_FORMAT);
        assert_eq!(Shape::Timestamp.to_json_schema()["format"], TIMESTAMP_FORMAT);
    }

    #[test]
    fn nested_objects_are_closed() {
        let shape = Shape::array(Shape::object(sample()));
        let schema = shape.to_json_schema();
        assert_eq!(schema["items"]["additionalProperties"], json!(false));
    }

    #[test]
    fn merge_replaces_and_appends() {
        let other = ObjectShape::new()
            .required("id", Shape::number_min(1))
            .required("size", Shape::number_min(0));
        let merged = sample().merge(&other);
        let names: Vec<&str> = merged.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["id", "url", "note", "size"]);
        assert_eq!(merged.get("id").unwrap().shape, Shape::number_min(1));
    }

    #[test]
    fn omit_removes_fields() {
        let shape = sample().omit(&["url"]);
        assert!(!shape.contains("url"));
        assert_eq!(shape.len(), 2);
    }

    #[test]
    fn partial_makes_every_field_optional_and_stays_closed() {
        let schema = sample().partial().to_json_schema();
        assert_eq!(schema["required"], json!([]));
        assert_eq!(schema["additionalProperties"], json!(false));
    }

    #[test]
    fn has_coercion_looks_through_arrays() {
        let inner = ObjectShape::new().required("ref", Shape::coerced_min(0));
        assert!(Shape::array(Shape::object(inner)).has_coercion());
        assert!(!Shape::array(Shape::Url).has_coercion());
    }

    #[test]
    fn duplicate_names_detected_in_deserialized_shapes() {
        let shape: ObjectShape = serde_yaml::from_str(
            "- { name: id, shape: { type: number } }\n- { name: id, shape: { type: url } }\n",
        )
        .unwrap();
        assert_eq!(shape.duplicate_names(), ["id"]);
    }

    #[test]
    fn shapes_deserialize_from_yaml() {
        let yaml = r#"
- name: reference_pack_id
  shape: { type: number, minimum: 0, coerce: true }
- name: note
  shape: { type: text }
  optional: true
- name: tags
  shape: { type: array, items: { type: non_blank } }
"#;
        let shape: ObjectShape = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(shape.get("reference_pack_id").unwrap().shape, Shape::coerced_min(0));
        assert!(shape.get("note").unwrap().optional);
        assert_eq!(
            shape.get("tags").unwrap().shape,
            Shape::array(Shape::NonBlank)
        );
    }
}
