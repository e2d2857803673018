//! Immutable JSON-Schema documents with the `x-jsf-*` vendor extensions.
//!
//! A [`SchemaDocument`] is never mutated in place. Patching (see
//! [`crate::modify`]) and concatenation always produce a new document.

use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::error::JsfError;

/// Vendor key carrying presentation hints (input type, currency, options...)
pub const X_JSF_PRESENTATION: &str = "x-jsf-presentation";

/// Vendor key carrying the explicit property order of an object schema
pub const X_JSF_ORDER: &str = "x-jsf-order";

/// A JSON-Schema-like document describing one form.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    root: Arc<Value>,
}

impl SchemaDocument {
    /// Wrap a raw JSON value, checking the shape the adapter relies on.
    pub fn from_value(value: Value) -> Result<Self, JsfError> {
        let map = value
            .as_object()
            .ok_or_else(|| JsfError::InvalidSchema("schema root must be an object".to_string()))?;

        if let Some(properties) = map.get("properties") {
            if !properties.is_object() {
                return Err(JsfError::InvalidSchema(
                    "`properties` must be an object".to_string(),
                ));
            }
        }

        if let Some(required) = map.get("required") {
            if !required.is_array() {
                return Err(JsfError::InvalidSchema(
                    "`required` must be an array".to_string(),
                ));
            }
        }

        Ok(Self {
            root: Arc::new(value),
        })
    }

    /// An object schema without properties
    pub fn empty() -> Self {
        Self {
            root: Arc::new(json!({ "type": "object", "properties": {} })),
        }
    }

    /// Get the raw JSON value
    #[inline]
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Take the raw JSON value, cloning only when the document is shared
    pub fn into_value(self) -> Value {
        Arc::try_unwrap(self.root).unwrap_or_else(|shared| (*shared).clone())
    }

    /// Root level properties
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.root.get("properties").and_then(Value::as_object)
    }

    /// Look up a property by dot-joined path (`address.city`)
    pub fn property_at(&self, path: &str) -> Option<&Value> {
        let mut current: &Value = &self.root;
        for segment in path.split('.') {
            current = current.get("properties")?.get(segment)?;
        }
        Some(current)
    }

    /// Names listed in the root `required` array
    pub fn required(&self) -> Vec<String> {
        required_of(&self.root)
    }

    /// Root property names in presentation order
    pub fn order(&self) -> Vec<String> {
        object_order(&self.root)
    }

    /// True when the document declares no properties at all
    pub fn is_empty(&self) -> bool {
        self.properties().map_or(true, Map::is_empty)
    }

    /// Concatenate several documents into one object schema.
    ///
    /// Properties, `required`, `x-jsf-order` and conditionals are merged in
    /// the order the parts are given. A later part wins on duplicate keys.
    pub fn concat(parts: &[SchemaDocument]) -> SchemaDocument {
        let mut properties = Map::new();
        let mut required: Vec<Value> = Vec::new();
        let mut order: Vec<Value> = Vec::new();
        let mut all_of: Vec<Value> = Vec::new();

        for part in parts {
            if let Some(props) = part.properties() {
                for (name, schema) in props {
                    properties.insert(name.clone(), schema.clone());
                }
            }
            for name in part.required() {
                let name = Value::String(name);
                if !required.contains(&name) {
                    required.push(name);
                }
            }
            for name in part.order() {
                let name = Value::String(name);
                if !order.contains(&name) {
                    order.push(name);
                }
            }
            if let Some(items) = part.root.get("allOf").and_then(Value::as_array) {
                all_of.extend(items.iter().cloned());
            }
            if let Some(condition) = conditional_of(&part.root) {
                all_of.push(condition);
            }
        }

        let mut root = Map::new();
        root.insert("type".to_string(), json!("object"));
        root.insert("properties".to_string(), Value::Object(properties));
        root.insert("required".to_string(), Value::Array(required));
        root.insert(X_JSF_ORDER.to_string(), Value::Array(order));
        if !all_of.is_empty() {
            root.insert("allOf".to_string(), Value::Array(all_of));
        }

        SchemaDocument {
            root: Arc::new(Value::Object(root)),
        }
    }
}

/// `required` names of an object schema
pub(crate) fn required_of(schema: &Value) -> Vec<String> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(|n| n.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Property order of an object schema: `x-jsf-order` first, then any
/// remaining properties in declaration order.
pub(crate) fn object_order(schema: &Value) -> Vec<String> {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut order: Vec<String> = schema
        .get(X_JSF_ORDER)
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .filter(|name| properties.contains_key(*name))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    for name in properties.keys() {
        if !order.contains(name) {
            order.push(name.clone());
        }
    }
    order
}

/// A root level `if/then/else` lifted into a standalone `allOf` entry
fn conditional_of(schema: &Value) -> Option<Value> {
    let condition = schema.get("if")?;
    let mut entry = Map::new();
    entry.insert("if".to_string(), condition.clone());
    for key in ["then", "else"] {
        if let Some(branch) = schema.get(key) {
            entry.insert(key.to_string(), branch.clone());
        }
    }
    Some(Value::Object(entry))
}
