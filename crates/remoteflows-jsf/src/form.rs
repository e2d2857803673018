//! Schema to form adapter.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::conditions::{self, ConditionalEffects};
use crate::error::JsfError;
use crate::field::{json_type, options_of, walk_fields, Field, InputType};
use crate::modify::JsfModify;
use crate::schema::{object_order, required_of, SchemaDocument, X_JSF_PRESENTATION};
use crate::transform::{coerce_for_schema, FieldTransformer, FieldValues};
use crate::validation::validate_values;

/// Metadata produced while building a form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormMeta {
    /// Non fatal problems, e.g. modify patches for unknown fields
    pub warnings: Vec<String>,
}

/// Fields of one schema, evaluated against a set of values
#[derive(Debug, Clone)]
pub struct Form {
    schema: SchemaDocument,
    fields: Vec<Field>,
    meta: FormMeta,
}

/// Build a form from `schema`, applying `modify` to a copy first.
#[instrument(skip_all)]
pub fn build_form(
    schema: &SchemaDocument,
    values: &FieldValues,
    modify: Option<&JsfModify>,
) -> Result<Form, JsfError> {
    let (schema, warnings) = match modify {
        Some(patch) if !patch.is_empty() => {
            let outcome = patch.apply(schema)?;
            (outcome.schema, outcome.warnings)
        }
        _ => (schema.clone(), Vec::new()),
    };

    let fields = build_fields(schema.as_value(), &Value::Object(values.clone()), "");
    debug!(field_count = fields.len(), "Built form");

    Ok(Form {
        schema,
        fields,
        meta: FormMeta { warnings },
    })
}

impl Default for Form {
    /// A form over an empty object schema
    fn default() -> Self {
        Form {
            schema: SchemaDocument::empty(),
            fields: Vec::new(),
            meta: FormMeta::default(),
        }
    }
}

impl Form {
    /// The (possibly patched) schema backing this form
    pub fn schema(&self) -> &SchemaDocument {
        &self.schema
    }

    /// Root fields in presentation order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn meta(&self) -> &FormMeta {
        &self.meta
    }

    /// Find a field by dot-joined path
    pub fn field(&self, path: &str) -> Option<&Field> {
        let mut found = None;
        walk_fields(&self.fields, &mut |field| {
            if found.is_none() && field.path == path {
                found = Some(field);
            }
        });
        found
    }

    /// Root fields currently shown to the user
    pub fn visible_fields(&self) -> Vec<&Field> {
        self.fields.iter().filter(|f| f.is_visible).collect()
    }

    /// Re-evaluate conditionals against new values
    pub fn recompute(&mut self, values: &FieldValues) {
        self.fields = build_fields(self.schema.as_value(), &Value::Object(values.clone()), "");
    }

    /// Values with forced fields filled in, recursively
    pub fn with_forced_values(&self, values: &FieldValues) -> FieldValues {
        let mut out = values.clone();
        fill_forced(&self.fields, &mut out);
        out
    }

    /// Validate `values`, returning field path to message; empty means valid.
    pub fn validate(&self, values: &FieldValues) -> Result<BTreeMap<String, String>, JsfError> {
        let values = self.with_forced_values(values);
        let fields = build_fields(self.schema.as_value(), &Value::Object(values.clone()), "");
        validate_values(&self.schema, &fields, &values)
    }

    /// Transformer matching the current fields
    pub fn transformer(&self) -> FieldTransformer {
        FieldTransformer::new(&self.fields)
    }

    /// Defaults declared by the schema, keyed like the values
    pub fn default_values(&self) -> FieldValues {
        collect_defaults(&self.fields)
    }
}

fn build_fields(object_schema: &Value, values: &Value, prefix: &str) -> Vec<Field> {
    let Some(properties) = object_schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };
    let effects = conditions::evaluate(object_schema, &coerce_for_schema(object_schema, values));
    let required = required_of(object_schema);

    object_order(object_schema)
        .into_iter()
        .filter_map(|name| {
            let property = properties.get(&name)?;
            let is_required = required.contains(&name) || effects.required.contains(&name);
            Some(build_field(&name, property, values, prefix, is_required, &effects))
        })
        .collect()
}

fn build_field(
    name: &str,
    property: &Value,
    values: &Value,
    prefix: &str,
    required: bool,
    effects: &ConditionalEffects,
) -> Field {
    let path = if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    };

    // `false` property schemas never accept a value
    let hidden_by_schema = matches!(property, Value::Bool(false));
    let property = match property {
        Value::Bool(_) => Value::Object(Map::new()),
        other => effects.effective_property(name, other),
    };

    let input_type = InputType::of(&property);
    let presentation = property.get(X_JSF_PRESENTATION);
    let is_visible =
        !hidden_by_schema && input_type != InputType::Hidden && !effects.hidden.contains(name);

    let default = property.get("default").cloned();
    let forced_value = match (property.get("const"), &default) {
        (Some(constant), Some(default)) if constant == default && !input_type.is_critical() => {
            Some(constant.clone())
        }
        _ => None,
    };

    let mut fields = if input_type == InputType::Fieldset {
        let nested_values = values
            .get(name)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        build_fields(&property, &nested_values, &path)
    } else {
        Vec::new()
    };
    if !is_visible {
        for child in fields.iter_mut() {
            hide(child);
        }
    }

    Field {
        name: name.to_string(),
        label: string_key(&property, "title").unwrap_or_else(|| name.to_string()),
        description: string_key(&property, "description")
            .or_else(|| presentation.and_then(|p| string_key(p, "description"))),
        input_type,
        required,
        is_visible,
        options: options_of(&property),
        fields,
        default,
        forced_value,
        currency: presentation.and_then(|p| string_key(p, "currency")),
        json_type: json_type(&property),
        path,
    }
}

fn hide(field: &mut Field) {
    field.is_visible = false;
    for child in field.fields.iter_mut() {
        hide(child);
    }
}

fn string_key(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn fill_forced(fields: &[Field], values: &mut FieldValues) {
    for field in fields {
        if let Some(forced) = &field.forced_value {
            values.insert(field.name.clone(), forced.clone());
        } else if !field.fields.is_empty() {
            if let Some(Value::Object(nested)) = values.get_mut(&field.name) {
                fill_forced(&field.fields, nested);
            }
        }
    }
}

fn collect_defaults(fields: &[Field]) -> FieldValues {
    let mut values = FieldValues::new();
    for field in fields {
        if let Some(default) = &field.default {
            values.insert(field.name.clone(), default.clone());
        } else if !field.fields.is_empty() {
            let nested = collect_defaults(&field.fields);
            if !nested.is_empty() {
                values.insert(field.name.clone(), Value::Object(nested));
            }
        }
    }
    values
}
