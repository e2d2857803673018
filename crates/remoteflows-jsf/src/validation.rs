//! Schema validation of form values, reported per field path.

use jsonschema::error::ValidationErrorKind;
use jsonschema::{JSONSchema, ValidationError};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::JsfError;
use crate::field::Field;
use crate::schema::SchemaDocument;
use crate::transform::{prune_empty, FieldTransformer, FieldValues};

/// Message used for missing required fields
pub const REQUIRED_MESSAGE: &str = "Required field";

/// Validate `values` against `schema`.
///
/// Values are transformed to their API shape first (money in minor units,
/// conditionally hidden fields dropped, empty entries removed), so the schema
/// sees exactly what would be submitted. Only the first error per path is kept.
pub fn validate_values(
    schema: &SchemaDocument,
    fields: &[Field],
    values: &FieldValues,
) -> Result<BTreeMap<String, String>, JsfError> {
    let payload = FieldTransformer::new(fields).to_api_payload(values);
    let instance = Value::Object(prune_empty(&payload));

    let compiled = JSONSchema::compile(schema.as_value())
        .map_err(|e| JsfError::Compilation(e.to_string()))?;

    let mut errors = BTreeMap::new();
    if let Err(failures) = compiled.validate(&instance) {
        for failure in failures {
            let (path, message) = describe(&failure);
            errors.entry(path).or_insert(message);
        }
    }

    debug!(error_count = errors.len(), "Validated form values");
    Ok(errors)
}

fn describe(error: &ValidationError<'_>) -> (String, String) {
    let base = pointer_to_path(&error.instance_path.to_string());
    match &error.kind {
        ValidationErrorKind::Required { property } => {
            let name = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            let path = if base.is_empty() {
                name
            } else {
                format!("{}.{}", base, name)
            };
            (path, REQUIRED_MESSAGE.to_string())
        }
        _ => (base, error.to_string()),
    }
}

/// `/address/city` to `address.city`
fn pointer_to_path(pointer: &str) -> String {
    pointer
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pointer_to_path() {
        assert_eq!(pointer_to_path(""), "");
        assert_eq!(pointer_to_path("/address/city"), "address.city");
        assert_eq!(pointer_to_path("/a~1b"), "a/b");
    }

    #[test]
    fn test_required_errors_use_property_path() {
        let schema = SchemaDocument::from_value(json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "address": {
                    "type": "object",
                    "properties": { "city": { "type": "string" } },
                    "required": ["city"]
                }
            },
            "required": ["name"]
        }))
        .unwrap();
        let values: FieldValues =
            serde_json::from_value(json!({ "name": "", "address": {} })).unwrap();

        let errors = validate_values(&schema, &[], &values).unwrap();

        assert_eq!(errors.get("name").map(String::as_str), Some(REQUIRED_MESSAGE));
        assert_eq!(
            errors.get("address.city").map(String::as_str),
            Some(REQUIRED_MESSAGE)
        );
    }

    #[test]
    fn test_type_errors_are_keyed_by_instance_path() {
        let schema = SchemaDocument::from_value(json!({
            "type": "object",
            "properties": { "age": { "type": "integer", "minimum": 18 } }
        }))
        .unwrap();
        let values: FieldValues = serde_json::from_value(json!({ "age": 3 })).unwrap();

        let errors = validate_values(&schema, &[], &values).unwrap();

        assert_eq!(errors.len(), 1);
        assert!(errors["age"].contains("18"));
    }

    #[test]
    fn test_uncompilable_schema() {
        let schema = SchemaDocument::from_value(json!({
            "type": "object",
            "properties": { "a": { "type": "not-a-type" } }
        }))
        .unwrap();

        let result = validate_values(&schema, &[], &FieldValues::new());
        assert!(matches!(result, Err(JsfError::Compilation(_))));
    }
}
