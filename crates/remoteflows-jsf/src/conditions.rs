//! Conditional subschemas (`if`/`then`/`else`, root level and inside `allOf`).
//!
//! Conditions are evaluated with the validation engine against the current
//! values of the object they belong to. A taken branch may:
//! - list names in `required` (the field becomes required),
//! - set `properties.<name>` to `false` (the field is hidden),
//! - set `properties.<name>` to an object (its keys override the field's).

use jsonschema::JSONSchema;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Effects of all taken branches for one object level
#[derive(Debug, Clone, Default)]
pub(crate) struct ConditionalEffects {
    pub hidden: HashSet<String>,
    pub required: HashSet<String>,
    pub overrides: HashMap<String, Map<String, Value>>,
}

impl ConditionalEffects {
    /// Property schema with branch overrides applied
    pub fn effective_property(&self, name: &str, property: &Value) -> Value {
        match (self.overrides.get(name), property) {
            (Some(over), Value::Object(base)) => {
                let mut merged = base.clone();
                for (key, value) in over {
                    merged.insert(key.clone(), value.clone());
                }
                Value::Object(merged)
            }
            _ => property.clone(),
        }
    }
}

/// Evaluate the conditionals declared on `object_schema` against `values`.
pub(crate) fn evaluate(object_schema: &Value, values: &Value) -> ConditionalEffects {
    let mut effects = ConditionalEffects::default();

    let mut conditions: Vec<&Value> = Vec::new();
    if object_schema.get("if").is_some() {
        conditions.push(object_schema);
    }
    if let Some(all_of) = object_schema.get("allOf").and_then(Value::as_array) {
        conditions.extend(all_of.iter().filter(|entry| entry.get("if").is_some()));
    }

    for condition in conditions {
        let Some(branch) = taken_branch(condition, values) else {
            continue;
        };
        apply_branch(branch, &mut effects);
    }

    effects
}

fn taken_branch<'a>(condition: &'a Value, values: &Value) -> Option<&'a Value> {
    let test = condition.get("if")?;
    let compiled = match JSONSchema::compile(test) {
        Ok(compiled) => compiled,
        Err(e) => {
            warn!(error = %e, "Skipping conditional with an invalid `if` schema");
            return None;
        }
    };

    if compiled.is_valid(values) {
        condition.get("then")
    } else {
        condition.get("else")
    }
}

fn apply_branch(branch: &Value, effects: &mut ConditionalEffects) {
    if let Some(required) = branch.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            effects.required.insert(name.to_string());
        }
    }

    if let Some(properties) = branch.get("properties").and_then(Value::as_object) {
        for (name, property) in properties {
            match property {
                Value::Bool(false) => {
                    effects.hidden.insert(name.clone());
                }
                Value::Object(keys) => {
                    effects
                        .overrides
                        .entry(name.clone())
                        .or_default()
                        .extend(keys.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "properties": {
                "has_bonus": { "type": "string" },
                "bonus_amount": { "type": "integer" }
            },
            "allOf": [{
                "if": {
                    "properties": { "has_bonus": { "const": "yes" } },
                    "required": ["has_bonus"]
                },
                "then": {
                    "required": ["bonus_amount"],
                    "properties": { "bonus_amount": { "title": "Bonus (required)" } }
                },
                "else": { "properties": { "bonus_amount": false } }
            }]
        })
    }

    #[test]
    fn test_then_branch_requires_and_overrides() {
        let effects = evaluate(&schema(), &json!({ "has_bonus": "yes" }));

        assert!(effects.required.contains("bonus_amount"));
        assert!(effects.hidden.is_empty());
        let property = effects.effective_property("bonus_amount", &json!({ "type": "integer" }));
        assert_eq!(property["title"], "Bonus (required)");
        assert_eq!(property["type"], "integer");
    }

    #[test]
    fn test_else_branch_hides() {
        let effects = evaluate(&schema(), &json!({}));

        assert!(effects.hidden.contains("bonus_amount"));
        assert!(effects.required.is_empty());
    }

    #[test]
    fn test_root_level_condition() {
        let schema = json!({
            "properties": { "a": {}, "b": {} },
            "if": { "properties": { "a": { "const": true } }, "required": ["a"] },
            "then": { "required": ["b"] }
        });

        assert!(evaluate(&schema, &json!({ "a": true })).required.contains("b"));
        assert!(evaluate(&schema, &json!({ "a": false })).required.is_empty());
    }
}
