use pretty_assertions::assert_eq;
use remoteflows_jsf::{
    build_form, format_money, FieldPatch, FieldValues, InputType, JsfModify, SchemaDocument,
};
use serde_json::{json, Value};

fn contract_details() -> SchemaDocument {
    SchemaDocument::from_value(json!({
        "type": "object",
        "properties": {
            "role_description": { "type": "string", "x-jsf-presentation": { "inputType": "textarea" } },
            "annual_gross_salary": {
                "type": "integer",
                "title": "Annual gross salary",
                "x-jsf-presentation": { "inputType": "money", "currency": "USD" }
            },
            "contract_duration_type": {
                "type": "string",
                "oneOf": [
                    { "const": "indefinite", "title": "Indefinite" },
                    { "const": "fixed_term", "title": "Fixed term" }
                ],
                "x-jsf-presentation": { "inputType": "radio" }
            },
            "contract_end_date": { "type": "string", "format": "date" },
            "probation": {
                "type": "object",
                "title": "Probation",
                "properties": {
                    "length_days": { "type": "integer", "minimum": 0, "maximum": 180 }
                }
            }
        },
        "required": ["annual_gross_salary", "contract_duration_type"],
        "allOf": [{
            "if": {
                "properties": { "contract_duration_type": { "const": "fixed_term" } },
                "required": ["contract_duration_type"]
            },
            "then": { "required": ["contract_end_date"] },
            "else": { "properties": { "contract_end_date": false } }
        }]
    }))
    .unwrap()
}

fn values(value: Value) -> FieldValues {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_contract_details_round_trip() {
    let input = values(json!({
        "role_description": "Builds things",
        "annual_gross_salary": "85000.50",
        "contract_duration_type": "indefinite",
        "contract_end_date": "2030-01-01",
        "probation": { "length_days": "90" }
    }));

    let mut form = build_form(&contract_details(), &input, None).unwrap();
    form.recompute(&input);

    assert!(form.validate(&input).unwrap().is_empty());

    let payload = form.transformer().to_api_payload(&input);
    assert_eq!(
        Value::Object(payload.clone()),
        json!({
            "role_description": "Builds things",
            "annual_gross_salary": 8500050,
            "contract_duration_type": "indefinite",
            "probation": { "length_days": 90 }
        })
    );

    let restored = form.transformer().from_api_payload(&payload);
    assert_eq!(restored["annual_gross_salary"], json!(85000.5));
    assert_eq!(format_money(8_500_050, "USD"), "$85,000.50");
}

#[test]
fn test_fixed_term_requires_end_date() {
    let input = values(json!({
        "annual_gross_salary": "1000",
        "contract_duration_type": "fixed_term"
    }));

    let form = build_form(&contract_details(), &input, None).unwrap();
    let end_date = form.field("contract_end_date").unwrap();

    assert_eq!(end_date.input_type, InputType::Date);
    assert!(end_date.is_visible);
    assert!(end_date.required);

    let errors = form.validate(&input).unwrap();
    assert_eq!(errors.get("contract_end_date").map(String::as_str), Some("Required field"));
}

#[test]
fn test_nested_field_errors_use_dot_paths() {
    let input = values(json!({
        "annual_gross_salary": "1000",
        "contract_duration_type": "indefinite",
        "probation": { "length_days": 365 }
    }));

    let form = build_form(&contract_details(), &input, None).unwrap();
    let errors = form.validate(&input).unwrap();

    assert_eq!(errors.keys().cloned().collect::<Vec<_>>(), vec!["probation.length_days"]);
}

#[test]
fn test_country_patch_overrides_step_patch() {
    let step = JsfModify::new().with_field(
        "annual_gross_salary",
        FieldPatch {
            title: Some("Salary".to_string()),
            description: Some("Before taxes".to_string()),
            ..Default::default()
        },
    );
    let country = JsfModify::new().with_field(
        "probation.length_days",
        FieldPatch {
            hidden: Some(true),
            ..Default::default()
        },
    );

    let patch = step.merge(&country);
    let form = build_form(&contract_details(), &FieldValues::new(), Some(&patch)).unwrap();

    let salary = form.field("annual_gross_salary").unwrap();
    assert_eq!(salary.label, "Salary");
    assert_eq!(salary.description.as_deref(), Some("Before taxes"));
    assert_eq!(
        form.field("probation.length_days").unwrap().input_type,
        InputType::Hidden
    );
    assert!(form.meta().warnings.is_empty());
}
