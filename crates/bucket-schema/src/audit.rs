//! # Closed-Shape Audit
//!
//! Walks an emitted JSON Schema and reports every object schema that would
//! accept keys it does not declare. The contracts built by this crate are
//! closed by construction, so any finding means a hand-edited or foreign
//! schema slipped in.
//!
//! The walk follows `properties/*`, `items` and `oneOf/*`.

use serde_json::Value;

use crate::validate::pointer_push;

/// An object schema whose `additionalProperties` is not `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenShapeFinding {
    /// JSON Pointer to the offending `additionalProperties` keyword.
    pub json_path: String,
    /// Current value, or a note that the keyword is absent.
    pub current_value: String,
    /// Recommended action.
    pub recommendation: String,
}

impl std::fmt::Display for OpenShapeFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "  {}: {} -> {}",
            self.json_path, self.current_value, self.recommendation
        )
    }
}

/// Audit a schema document. Returns findings in document order.
pub fn audit_closed_shapes(schema: &Value) -> Vec<OpenShapeFinding> {
    let mut findings = Vec::new();
    walk(schema, "", &mut findings);
    findings
}

fn walk(schema: &Value, path: &str, findings: &mut Vec<OpenShapeFinding>) {
    if is_object_schema(schema) {
        check_closed(schema, path, findings);
    }

    if let Some(Value::Object(properties)) = schema.get("properties") {
        let base = pointer_push(path, "properties");
        for (name, property) in properties {
            walk(property, &pointer_push(&base, name), findings);
        }
    }

    if let Some(items) = schema.get("items") {
        walk(items, &pointer_push(path, "items"), findings);
    }

    if let Some(Value::Array(variants)) = schema.get("oneOf") {
        let base = pointer_push(path, "oneOf");
        for (i, variant) in variants.iter().enumerate() {
            walk(variant, &pointer_push(&base, &i.to_string()), findings);
        }
    }
}

fn is_object_schema(schema: &Value) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("object")
        || schema.get("properties").is_some()
        || schema.get("required").is_some()
}

fn check_closed(schema: &Value, path: &str, findings: &mut Vec<OpenShapeFinding>) {
    let current_value = match schema.get("additionalProperties") {
        Some(Value::Bool(false)) => return,
        Some(other) => other.to_string(),
        None => "(absent, defaults to true)".to_string(),
    };
    findings.push(OpenShapeFinding {
        json_path: pointer_push(path, "additionalProperties"),
        current_value,
        recommendation: "Set to false; contracts reject undeclared keys".to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::envelope_schema;
    use crate::shape::{ObjectShape, Shape};
    use crate::validate::Contract;
    use serde_json::json;

    #[test]
    fn closed_schema_has_no_findings() {
        let schema = json!({
            "type": "object",
            "properties": { "a": { "type": "number" } },
            "required": [],
            "additionalProperties": false
        });
        assert!(audit_closed_shapes(&schema).is_empty());
    }

    #[test]
    fn absent_keyword_is_reported() {
        let findings = audit_closed_shapes(&json!({ "type": "object" }));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].json_path, "/additionalProperties");
        assert!(findings[0].current_value.contains("absent"));
    }

    #[test]
    fn nested_open_shapes_are_located() {
        let schema = json!({
            "oneOf": [
                {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "data": {
                            "type": "array",
                            "items": { "type": "object", "additionalProperties": true }
                        }
                    }
                },
                { "type": "object", "additionalProperties": { "type": "string" } }
            ]
        });
        let findings = audit_closed_shapes(&schema);
        let paths: Vec<&str> = findings.iter().map(|f| f.json_path.as_str()).collect();
        assert_eq!(
            paths,
            [
                "/oneOf/0/properties/data/items/additionalProperties",
                "/oneOf/1/additionalProperties",
            ]
        );
        assert_eq!(findings[0].current_value, "true");
    }

    #[test]
    fn envelopes_are_closed() {
        let data = Shape::array(Shape::object(
            ObjectShape::new().required("id", Shape::number_min(1)),
        ));
        let envelope = envelope_schema("things.list.response", data).unwrap();
        assert!(audit_closed_shapes(&envelope.json_schema()).is_empty());
    }

    #[test]
    fn display_shows_path_and_recommendation() {
        let finding = &audit_closed_shapes(&json!({ "required": ["a"] }))[0];
        let text = finding.to_string();
        assert!(text.starts_with("  /additionalProperties:"));
        assert!(text.contains("Set to false"));
    }
}
