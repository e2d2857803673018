//! Field value coercion between form values and API payloads.

use serde_json::{Map, Number, Value};
use std::collections::HashMap;

use crate::field::{json_type, Field, InputType};
use crate::money::{checked_cents, major_units_value, to_minor_units};

/// Current values of a form, keyed by property name. Fieldsets nest.
pub type FieldValues = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Money,
    Integer,
    Number,
    Omitted,
}

/// Bidirectional converter built from a list of fields.
///
/// Outbound (`to_api_payload`):
/// - money fields become integer minor units, or `null` when empty,
/// - numeric strings of number fields become JSON numbers,
/// - fields hidden by a conditional are dropped.
///
/// Inbound (`from_api_payload`) turns minor units back into major units.
/// Both directions work on a deep copy of their input.
#[derive(Debug, Clone, Default)]
pub struct FieldTransformer {
    rules: HashMap<String, Rule>,
}

impl FieldTransformer {
    /// Build the rules for `fields` and all their nested fields
    pub fn new(fields: &[Field]) -> Self {
        let mut rules = HashMap::new();
        for field in fields {
            collect_rules(field, &mut rules);
        }
        Self { rules }
    }

    /// Paths of all money fields
    pub fn money_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self
            .rules
            .iter()
            .filter(|(_, rule)| **rule == Rule::Money)
            .map(|(path, _)| path.as_str())
            .collect();
        paths.sort_unstable();
        paths
    }

    /// Form values to API payload
    pub fn to_api_payload(&self, values: &FieldValues) -> FieldValues {
        let mut payload = values.clone();
        self.outbound(&mut payload, "");
        payload
    }

    /// API payload to form values
    pub fn from_api_payload(&self, payload: &FieldValues) -> FieldValues {
        let mut values = payload.clone();
        self.inbound(&mut values, "");
        values
    }

    fn outbound(&self, map: &mut Map<String, Value>, prefix: &str) {
        let keys: Vec<String> = map.keys().cloned().collect();
        for key in keys {
            let path = join(prefix, &key);
            match self.rules.get(&path) {
                Some(Rule::Omitted) => {
                    map.remove(&key);
                }
                Some(Rule::Money) => {
                    if let Some(value) = map.get_mut(&key) {
                        *value = to_minor_units(value)
                            .map(|cents| Value::Number(Number::from(cents)))
                            .unwrap_or(Value::Null);
                    }
                }
                Some(rule @ (Rule::Integer | Rule::Number)) => {
                    if let Some(value) = map.get_mut(&key) {
                        coerce_number(value, *rule);
                    }
                }
                None => {
                    if let Some(Value::Object(nested)) = map.get_mut(&key) {
                        self.outbound(nested, &path);
                    }
                }
            }
        }
    }

    fn inbound(&self, map: &mut Map<String, Value>, prefix: &str) {
        for (key, value) in map.iter_mut() {
            let path = join(prefix, key);
            match self.rules.get(&path) {
                Some(Rule::Money) => {
                    if let Some(cents) = value.as_i64() {
                        *value = major_units_value(cents);
                    } else if let Some(cents) = value.as_f64().and_then(checked_cents) {
                        *value = major_units_value(cents);
                    }
                }
                _ => {
                    if let Value::Object(nested) = value {
                        self.inbound(nested, &path);
                    }
                }
            }
        }
    }
}

/// `values` in the shape `object_schema` submits them: money in minor units,
/// numeric strings as numbers, empty entries removed. Conditionals are
/// evaluated against this so visibility agrees with validation.
pub(crate) fn coerce_for_schema(object_schema: &Value, values: &Value) -> Value {
    let Value::Object(map) = values else {
        return values.clone();
    };
    let properties = object_schema.get("properties").and_then(Value::as_object);

    let mut out = Map::new();
    for (key, value) in map {
        let property = properties.and_then(|p| p.get(key));
        let value = match (property, value) {
            (Some(property), Value::Object(_)) if property.get("properties").is_some() => {
                coerce_for_schema(property, value)
            }
            (Some(property), _) => coerce_value(property, value),
            (None, _) => value.clone(),
        };
        if !is_empty_value(&value) {
            out.insert(key.clone(), value);
        }
    }
    Value::Object(out)
}

fn coerce_value(property: &Value, value: &Value) -> Value {
    let input_type = InputType::of(property);
    match rule_for(input_type, json_type(property).as_deref()) {
        Some(Rule::Money) => to_minor_units(value)
            .map(|cents| Value::Number(Number::from(cents)))
            .unwrap_or(Value::Null),
        Some(rule) => {
            let mut value = value.clone();
            coerce_number(&mut value, rule);
            value
        }
        None => value.clone(),
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Drop `null` and empty-string entries, recursively.
pub fn prune_empty(values: &FieldValues) -> FieldValues {
    values
        .iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::Object(nested) => Some((key.clone(), Value::Object(prune_empty(nested)))),
            other => Some((key.clone(), other.clone())),
        })
        .collect()
}

fn collect_rules(field: &Field, rules: &mut HashMap<String, Rule>) {
    // presentation-hidden fields still carry values; conditionally hidden ones do not
    if !field.is_visible && field.input_type != InputType::Hidden {
        rules.insert(field.path.clone(), Rule::Omitted);
        return;
    }

    if let Some(rule) = rule_for(field.input_type, field.json_type.as_deref()) {
        rules.insert(field.path.clone(), rule);
    }

    for child in &field.fields {
        collect_rules(child, rules);
    }
}

fn rule_for(input_type: InputType, json_type: Option<&str>) -> Option<Rule> {
    match input_type {
        InputType::Money => Some(Rule::Money),
        InputType::Number if json_type == Some("integer") => Some(Rule::Integer),
        InputType::Number => Some(Rule::Number),
        _ => None,
    }
}

fn coerce_number(value: &mut Value, rule: Rule) {
    let Value::String(raw) = value else {
        return;
    };
    let raw = raw.trim();
    if raw.is_empty() {
        *value = Value::Null;
        return;
    }

    let coerced = match rule {
        Rule::Integer => raw.parse::<i64>().ok().map(Number::from),
        _ => raw.parse::<f64>().ok().and_then(Number::from_f64),
    };
    if let Some(number) = coerced {
        *value = Value::Number(number);
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}
