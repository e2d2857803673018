//! Declarative schema patches ("modify").
//!
//! Host applications customise API-provided schemas without touching them:
//! titles, descriptions, visibility, required-ness and presentation hints are
//! overridden per dot-joined field path, new fields can be created and the
//! root order replaced. Applying a patch always yields a new document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::JsfError;
use crate::schema::{SchemaDocument, X_JSF_ORDER, X_JSF_PRESENTATION};

/// Overrides for a single field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPatch {
    /// New label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Force the field hidden (`true`) or visible again (`false`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    /// Add or remove the field from its parent's `required` list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// New default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Presentation keys merged over the existing ones
    #[serde(
        default,
        rename = "x-jsf-presentation",
        skip_serializing_if = "Option::is_none"
    )]
    pub presentation: Option<Map<String, Value>>,
}

impl FieldPatch {
    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(&self, other: &FieldPatch) -> FieldPatch {
        let presentation = match (&self.presentation, &other.presentation) {
            (Some(base), Some(over)) => {
                let mut merged = base.clone();
                for (key, value) in over {
                    merged.insert(key.clone(), value.clone());
                }
                Some(merged)
            }
            (base, over) => over.clone().or_else(|| base.clone()),
        };

        FieldPatch {
            title: other.title.clone().or_else(|| self.title.clone()),
            description: other.description.clone().or_else(|| self.description.clone()),
            hidden: other.hidden.or(self.hidden),
            required: other.required.or(self.required),
            default: other.default.clone().or_else(|| self.default.clone()),
            presentation,
        }
    }
}

/// A complete patch for one schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsfModify {
    /// Per-field overrides keyed by dot-joined path
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldPatch>,
    /// Root level properties to add
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub create: BTreeMap<String, Value>,
    /// Replacement root order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_root: Option<Vec<String>>,
}

/// Result of applying a patch
#[derive(Debug, Clone)]
pub struct ModifyOutcome {
    /// The derived document
    pub schema: SchemaDocument,
    /// Non fatal problems, e.g. patches for fields the schema lacks
    pub warnings: Vec<String>,
}

impl JsfModify {
    /// Create an empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field override
    pub fn with_field(mut self, path: impl Into<String>, patch: FieldPatch) -> Self {
        self.fields.insert(path.into(), patch);
        self
    }

    /// Add a created property
    pub fn with_created(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.create.insert(name.into(), schema);
        self
    }

    /// True when applying the patch would be a no-op
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.create.is_empty() && self.order_root.is_none()
    }

    /// Overlay `other` on this patch; `other` wins on conflicts.
    pub fn merge(&self, other: &JsfModify) -> JsfModify {
        let mut fields = self.fields.clone();
        for (path, patch) in &other.fields {
            let merged = match fields.get(path) {
                Some(existing) => existing.merge(patch),
                None => patch.clone(),
            };
            fields.insert(path.clone(), merged);
        }

        let mut create = self.create.clone();
        create.extend(other.create.iter().map(|(k, v)| (k.clone(), v.clone())));

        JsfModify {
            fields,
            create,
            order_root: other.order_root.clone().or_else(|| self.order_root.clone()),
        }
    }

    /// Apply the patch to a copy of `schema`.
    pub fn apply(&self, schema: &SchemaDocument) -> Result<ModifyOutcome, JsfError> {
        let mut root = schema.as_value().clone();
        let mut warnings = Vec::new();

        for (path, patch) in &self.fields {
            if path.is_empty() || path.split('.').any(str::is_empty) {
                return Err(JsfError::InvalidPatch(format!("invalid field path '{}'", path)));
            }
            if !patch_field(&mut root, path, patch) {
                warn!(field = %path, "Modify patch targets a field missing from the schema");
                warnings.push(format!("Field '{}' not found in schema", path));
            }
        }

        for (name, property) in &self.create {
            create_field(&mut root, name, property.clone());
        }

        if let Some(order) = &self.order_root {
            if let Some(map) = root.as_object_mut() {
                map.insert(
                    X_JSF_ORDER.to_string(),
                    Value::Array(order.iter().cloned().map(Value::String).collect()),
                );
            }
        }

        Ok(ModifyOutcome {
            schema: SchemaDocument::from_value(root)?,
            warnings,
        })
    }
}

/// Locate the parent object schema of `path`; returns the parent and the
/// final property name.
fn locate_parent<'a>(root: &'a mut Value, path: &str) -> Option<(&'a mut Value, String)> {
    let segments: Vec<&str> = path.split('.').collect();
    let (last, parents) = segments.split_last()?;

    let mut parent = root;
    for segment in parents {
        parent = parent.get_mut("properties")?.get_mut(*segment)?;
    }

    parent.get("properties")?.get(*last)?;
    Some((parent, last.to_string()))
}

fn patch_field(root: &mut Value, path: &str, patch: &FieldPatch) -> bool {
    let Some((parent, name)) = locate_parent(root, path) else {
        return false;
    };

    if let Some(required) = patch.required {
        set_required(parent, &name, required);
    }

    let Some(property) = parent
        .get_mut("properties")
        .and_then(|props| props.get_mut(&name))
        .and_then(Value::as_object_mut)
    else {
        return false;
    };

    if let Some(title) = &patch.title {
        property.insert("title".to_string(), Value::String(title.clone()));
    }
    if let Some(description) = &patch.description {
        property.insert("description".to_string(), Value::String(description.clone()));
    }
    if let Some(default) = &patch.default {
        property.insert("default".to_string(), default.clone());
    }

    let presentation = property
        .entry(X_JSF_PRESENTATION.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Some(presentation) = presentation.as_object_mut() {
        if let Some(keys) = &patch.presentation {
            for (key, value) in keys {
                presentation.insert(key.clone(), value.clone());
            }
        }
        match patch.hidden {
            Some(true) => {
                presentation.insert("inputType".to_string(), Value::String("hidden".to_string()));
            }
            Some(false) => {
                if presentation.get("inputType").and_then(Value::as_str) == Some("hidden") {
                    presentation.remove("inputType");
                }
            }
            None => {}
        }
    }

    true
}

fn set_required(parent: &mut Value, name: &str, required: bool) {
    let Some(parent) = parent.as_object_mut() else {
        return;
    };
    let list = parent
        .entry("required".to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Some(list) = list.as_array_mut() {
        let present = list.iter().any(|n| n.as_str() == Some(name));
        if required && !present {
            list.push(Value::String(name.to_string()));
        } else if !required && present {
            list.retain(|n| n.as_str() != Some(name));
        }
    }
}

fn create_field(root: &mut Value, name: &str, property: Value) {
    let Some(map) = root.as_object_mut() else {
        return;
    };

    let properties = map
        .entry("properties".to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Some(properties) = properties.as_object_mut() {
        properties.insert(name.to_string(), property);
    }

    if let Some(order) = map.get_mut(X_JSF_ORDER).and_then(Value::as_array_mut) {
        if !order.iter().any(|n| n.as_str() == Some(name)) {
            order.push(Value::String(name.to_string()));
        }
    }
}
