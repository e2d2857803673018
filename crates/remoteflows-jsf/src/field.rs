//! Field descriptors derived from schema properties.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::schema::X_JSF_PRESENTATION;

/// Closed set of input kinds a presentation layer has to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// Single line text
    Text,
    /// Numeric input
    Number,
    /// Currency amount, major units in the form and minor units on the wire
    Money,
    /// Dropdown over enumerated options
    Select,
    /// Radio group over enumerated options
    Radio,
    /// Boolean toggle
    Checkbox,
    /// ISO date
    Date,
    /// Multi line text
    Textarea,
    /// Not rendered
    Hidden,
    /// Group of nested fields
    Fieldset,
}

impl InputType {
    /// Map an `x-jsf-presentation.inputType` value onto the closed set.
    ///
    /// The API uses a handful of aliases (`email`, `countries`, ...).
    pub fn from_presentation(name: &str) -> Option<Self> {
        let input_type = match name {
            "text" | "email" | "tel" | "url" => InputType::Text,
            "number" => InputType::Number,
            "money" => InputType::Money,
            "select" | "countries" | "multi-select" => InputType::Select,
            "radio" => InputType::Radio,
            "checkbox" => InputType::Checkbox,
            "date" => InputType::Date,
            "textarea" => InputType::Textarea,
            "hidden" => InputType::Hidden,
            "fieldset" | "group-array" => InputType::Fieldset,
            _ => return None,
        };
        Some(input_type)
    }

    /// Resolve the input type of a property schema: presentation hint
    /// first, JSON type second.
    pub fn of(schema: &Value) -> Self {
        if let Some(input_type) = schema
            .get(X_JSF_PRESENTATION)
            .and_then(|p| p.get("inputType"))
            .and_then(Value::as_str)
            .and_then(InputType::from_presentation)
        {
            return input_type;
        }

        if schema.get("oneOf").is_some() || schema.get("enum").is_some() {
            return InputType::Select;
        }

        match json_type(schema).as_deref() {
            Some("boolean") => InputType::Checkbox,
            Some("integer") | Some("number") => InputType::Number,
            Some("object") if schema.get("properties").is_some() => InputType::Fieldset,
            Some("string") if schema.get("format").and_then(Value::as_str) == Some("date") => {
                InputType::Date
            }
            _ => InputType::Text,
        }
    }

    /// Input types the user must always interact with explicitly, even if
    /// the schema pins their value.
    pub fn is_critical(&self) -> bool {
        matches!(self, InputType::Checkbox)
    }

    /// Whether the field offers a list of options
    pub fn is_enumerable(&self) -> bool {
        matches!(self, InputType::Select | InputType::Radio)
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputType::Text => "text",
            InputType::Number => "number",
            InputType::Money => "money",
            InputType::Select => "select",
            InputType::Radio => "radio",
            InputType::Checkbox => "checkbox",
            InputType::Date => "date",
            InputType::Textarea => "textarea",
            InputType::Hidden => "hidden",
            InputType::Fieldset => "fieldset",
        };
        write!(f, "{}", name)
    }
}

/// One selectable option of a select/radio field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    /// Human readable label
    pub label: String,
    /// Value stored when selected
    pub value: Value,
    /// Optional helper text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Renderable view of one schema property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Property name, unique within its parent
    pub name: String,
    /// Dot-joined path from the form root
    pub path: String,
    /// Label, defaults to the property name
    pub label: String,
    /// Help text
    pub description: Option<String>,
    /// Presentation kind
    pub input_type: InputType,
    /// Required by the schema or an active conditional
    pub required: bool,
    /// False when hidden by presentation or an active conditional
    pub is_visible: bool,
    /// Options for select/radio fields
    pub options: Vec<FieldOption>,
    /// Nested fields for fieldsets
    pub fields: Vec<Field>,
    /// Schema default
    pub default: Option<Value>,
    /// Value pinned by `const == default`; rendered as a statement
    pub forced_value: Option<Value>,
    /// Currency code for money fields
    pub currency: Option<String>,
    /// Declared JSON type (`string`, `integer`...)
    pub json_type: Option<String>,
}

impl Field {
    /// Whether this field is an informational statement rather than an input
    #[inline]
    pub fn is_forced(&self) -> bool {
        self.forced_value.is_some()
    }

    /// Depth-first walk over this field and all nested fields
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Field)) {
        visit(self);
        for child in &self.fields {
            child.walk(visit);
        }
    }
}

/// Walk a list of fields depth-first
pub fn walk_fields<'a>(fields: &'a [Field], visit: &mut dyn FnMut(&'a Field)) {
    for field in fields {
        field.walk(visit);
    }
}

/// Declared JSON type; the first non-null entry of a type array
pub(crate) fn json_type(schema: &Value) -> Option<String> {
    match schema.get("type")? {
        Value::String(t) => Some(t.clone()),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .map(str::to_string),
        _ => None,
    }
}

/// Options from `oneOf: [{const, title}]` or a plain `enum`
pub(crate) fn options_of(schema: &Value) -> Vec<FieldOption> {
    if let Some(one_of) = schema
        .get("oneOf")
        .or_else(|| schema.get("anyOf"))
        .and_then(Value::as_array)
    {
        return one_of
            .iter()
            .filter_map(|option| {
                let value = option.get("const")?.clone();
                let label = option
                    .get("title")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| display_value(&value));
                Some(FieldOption {
                    label,
                    value,
                    description: option
                        .get("description")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
            })
            .collect();
    }

    schema
        .get("enum")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .map(|value| FieldOption {
                    label: display_value(value),
                    value: value.clone(),
                    description: None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
