//! Normalization of API error bodies into field-level errors.
//!
//! Mutations fail with one of a few body shapes. They are decoded once into
//! an [`ErrorShape`] at the boundary; everything downstream works with
//! [`NormalizedFieldError`] lists and never re-inspects raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Message used when no message can be found in an error body
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Message used when only field errors are present
pub const FIELD_ERRORS_MESSAGE: &str = "Please review the highlighted fields.";

/// What a normalized error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    /// A specific field failed validation
    Validation,
    /// The form as a whole failed; the path is empty
    Form,
}

/// One error attached to a dot-joined field path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedFieldError {
    /// Dot-joined field path, empty for form level errors
    pub path: String,
    /// Error kind
    pub kind: FieldErrorKind,
    /// Human readable message
    pub message: String,
}

impl NormalizedFieldError {
    pub fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: FieldErrorKind::Validation,
            message: message.into(),
        }
    }

    pub fn form(message: impl Into<String>) -> Self {
        Self {
            path: String::new(),
            kind: FieldErrorKind::Form,
            message: message.into(),
        }
    }
}

/// The error delivered to a flow's `on_error` callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationError {
    /// Form level message
    pub message: String,
    /// Per-field details, possibly empty
    pub field_errors: Vec<NormalizedFieldError>,
}

impl MutationError {
    /// An error without field details
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_errors: Vec::new(),
        }
    }

    /// Errors for one path
    pub fn errors_for<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a NormalizedFieldError> {
        self.field_errors.iter().filter(move |e| e.path == path)
    }
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Known error body shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorShape {
    /// `{"error": {"error": {"message": ...}}}`
    Nested {
        message: String,
        fields: Vec<(String, String)>,
    },
    /// `{"error": {"message": ...}}`, `{"error": "..."}` or a bare string
    Flat {
        message: String,
        fields: Vec<(String, String)>,
    },
    /// `{"field": "message", ...}` or `{"message": ..., "errors": {...}}`
    FieldMap {
        message: Option<String>,
        fields: Vec<(String, String)>,
    },
    /// Anything else
    Unrecognized,
}

impl ErrorShape {
    /// Decode a raw body. Never fails.
    pub fn decode(raw: &Value) -> Self {
        if let Some(inner) = raw.get("error").and_then(|e| e.get("error")) {
            if let Some(message) = inner.get("message").and_then(Value::as_str) {
                let mut fields = field_details(inner);
                fields.extend(field_details(&raw["error"]));
                return ErrorShape::Nested {
                    message: message.to_string(),
                    fields,
                };
            }
        }

        match raw.get("error") {
            Some(error) if error.get("message").and_then(Value::as_str).is_some() => {
                let message = error["message"].as_str().unwrap_or_default().to_string();
                let mut fields = field_details(error);
                fields.extend(field_details(raw));
                return ErrorShape::Flat { message, fields };
            }
            Some(Value::String(message)) => {
                return ErrorShape::Flat {
                    message: message.clone(),
                    fields: field_details(raw),
                };
            }
            _ => {}
        }

        match raw {
            Value::String(message) if !message.is_empty() => ErrorShape::Flat {
                message: message.clone(),
                fields: Vec::new(),
            },
            Value::Object(map) => {
                let message = map.get("message").and_then(Value::as_str).map(str::to_string);
                let fields = match map.get("errors") {
                    Some(errors) => flatten(errors),
                    None => flatten_map(map, &["message", "error", "errors", "status", "code"]),
                };
                if message.is_none() && fields.is_empty() {
                    ErrorShape::Unrecognized
                } else {
                    ErrorShape::FieldMap { message, fields }
                }
            }
            _ => ErrorShape::Unrecognized,
        }
    }

    /// Form level message, if the shape carries one
    pub fn message(&self) -> Option<&str> {
        match self {
            ErrorShape::Nested { message, .. } | ErrorShape::Flat { message, .. } => Some(message),
            ErrorShape::FieldMap { message, .. } => message.as_deref(),
            ErrorShape::Unrecognized => None,
        }
    }

    /// Field level errors, or a single form level entry when there are none
    pub fn field_errors(&self) -> Vec<NormalizedFieldError> {
        let (message, fields) = match self {
            ErrorShape::Nested { message, fields } | ErrorShape::Flat { message, fields } => {
                (Some(message.as_str()), fields)
            }
            ErrorShape::FieldMap { message, fields } => (message.as_deref(), fields),
            ErrorShape::Unrecognized => return Vec::new(),
        };

        if fields.is_empty() {
            return message
                .map(|m| vec![NormalizedFieldError::form(m)])
                .unwrap_or_default();
        }

        fields
            .iter()
            .map(|(path, message)| NormalizedFieldError::validation(path.clone(), message.clone()))
            .collect()
    }
}

/// Field errors for a raw error body
pub fn normalize(raw: &Value) -> Vec<NormalizedFieldError> {
    ErrorShape::decode(raw).field_errors()
}

/// Message plus field errors for a raw error body
pub fn normalize_error(raw: &Value) -> MutationError {
    let shape = ErrorShape::decode(raw);
    let field_errors = shape.field_errors();
    let message = match shape.message() {
        Some(message) => message.to_string(),
        None if !field_errors.is_empty() => FIELD_ERRORS_MESSAGE.to_string(),
        None => GENERIC_ERROR_MESSAGE.to_string(),
    };
    MutationError {
        message,
        field_errors,
    }
}

/// Field details living next to a message: `errors` or `fields`
fn field_details(container: &Value) -> Vec<(String, String)> {
    ["errors", "fields"]
        .iter()
        .filter_map(|key| container.get(*key))
        .flat_map(flatten)
        .collect()
}

fn flatten(value: &Value) -> Vec<(String, String)> {
    let mut out = Vec::new();
    match value {
        Value::Object(map) => out.extend(flatten_map(map, &[])),
        Value::Array(items) => {
            // `[{"field": "x", "message": "y"}]` style lists
            for item in items {
                let field = item
                    .get("field")
                    .or_else(|| item.get("path"))
                    .and_then(Value::as_str);
                let message = item.get("message").and_then(Value::as_str);
                if let (Some(field), Some(message)) = (field, message) {
                    out.push((field.to_string(), message.to_string()));
                }
            }
        }
        _ => {}
    }
    out
}

fn flatten_map(map: &Map<String, Value>, skip: &[&str]) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for (key, value) in map {
        if skip.contains(&key.as_str()) {
            continue;
        }
        collect(key, value, &mut out);
    }
    out
}

fn collect(path: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::String(message) => out.push((path.to_string(), message.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                match item {
                    Value::String(message) => out.push((path.to_string(), message.clone())),
                    Value::Object(_) => collect(&format!("{}.{}", path, index), item, out),
                    _ => {}
                }
            }
        }
        Value::Object(map) => {
            for (key, nested) in map {
                collect(&format!("{}.{}", path, key), nested, out);
            }
        }
        _ => {}
    }
}
