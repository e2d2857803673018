//! Schemas and resources shaped like gateway responses.

use remoteflows_core::domain::api::forms;
use remoteflows_core::domain::cost::{CompanyCurrency, CostCalculatorCountry, CurrencyRef};
use remoteflows_core::{Company, Country, CreditRiskStatus, Employment};
use serde_json::{json, Value};

use crate::fakes::remote_api::FakeRemoteApi;

pub const COUNTRY_CODE: &str = "PRT";
pub const COMPANY_ID: &str = "company-1";

pub fn countries() -> Vec<Country> {
    vec![
        Country {
            code: "PRT".to_string(),
            name: "Portugal".to_string(),
        },
        Country {
            code: "ESP".to_string(),
            name: "Spain".to_string(),
        },
    ]
}

pub fn employee_basic_information_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": { "type": "string", "title": "Full name", "minLength": 1 },
            "email": {
                "type": "string",
                "title": "Personal email",
                "format": "email",
                "x-jsf-presentation": { "inputType": "email" }
            },
            "job_title": { "type": "string", "title": "Job title" },
            "provisional_start_date": {
                "type": "string",
                "title": "Start date",
                "format": "date",
                "x-jsf-presentation": { "inputType": "date" }
            }
        },
        "required": ["name", "email", "job_title"]
    })
}

pub fn contract_details_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "annual_gross_salary": {
                "type": "integer",
                "title": "Annual gross salary",
                "minimum": 1,
                "x-jsf-presentation": { "inputType": "money", "currency": "EUR" }
            },
            "work_schedule": {
                "type": "string",
                "title": "Work schedule",
                "const": "full_time",
                "default": "full_time"
            },
            "has_signing_bonus": {
                "type": "string",
                "oneOf": [{ "const": "yes", "title": "Yes" }, { "const": "no", "title": "No" }],
                "x-jsf-presentation": { "inputType": "radio" }
            },
            "signing_bonus": {
                "type": "integer",
                "title": "Signing bonus",
                "x-jsf-presentation": { "inputType": "money", "currency": "EUR" }
            }
        },
        "required": ["annual_gross_salary", "has_signing_bonus"],
        "allOf": [{
            "if": { "properties": { "has_signing_bonus": { "const": "yes" } }, "required": ["has_signing_bonus"] },
            "then": { "required": ["signing_bonus"] },
            "else": { "properties": { "signing_bonus": false } }
        }]
    })
}

pub fn benefits_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "health": {
                "type": "object",
                "title": "Health",
                "properties": {
                    "value": {
                        "type": "string",
                        "oneOf": [
                            { "const": "basic", "title": "Basic" },
                            { "const": "premium", "title": "Premium" }
                        ],
                        "x-jsf-presentation": { "inputType": "radio" }
                    }
                },
                "required": ["value"]
            }
        },
        "required": ["health"]
    })
}

pub fn contractor_basic_information_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": { "type": "string", "title": "Full name" },
            "email": { "type": "string", "title": "Email", "format": "email" }
        },
        "required": ["name", "email"]
    })
}

pub fn contractor_contract_details_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "services_description": { "type": "string", "title": "Services" },
            "payment_amount": {
                "type": "integer",
                "title": "Payment amount",
                "x-jsf-presentation": { "inputType": "money", "currency": "EUR" }
            }
        },
        "required": ["services_description", "payment_amount"]
    })
}

pub fn address_details_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "address": { "type": "string", "title": "Address" },
            "city": { "type": "string", "title": "City" },
            "postal_code": { "type": "string", "title": "Postal code", "pattern": "^[0-9]{4}-[0-9]{3}$" }
        },
        "required": ["address", "city", "postal_code"]
    })
}

pub fn company(credit_risk_status: CreditRiskStatus) -> Company {
    Company {
        id: COMPANY_ID.to_string(),
        name: Some("Acme".to_string()),
        country_code: Some(COUNTRY_CODE.to_string()),
        credit_risk_status,
        address_details: None,
    }
}

/// An employment parsed from gateway JSON
pub fn employment(value: Value) -> Employment {
    serde_json::from_value(value).unwrap_or_else(|e| panic!("invalid employment fixture: {}", e))
}

pub fn cost_calculator_countries() -> Vec<CostCalculatorCountry> {
    vec![
        CostCalculatorCountry {
            code: "ARG".to_string(),
            name: "Argentina".to_string(),
            region_slug: "argentina-slug".to_string(),
            currency: Some(CurrencyRef {
                code: "ARS".to_string(),
                symbol: Some("$".to_string()),
            }),
            child_regions: Vec::new(),
        },
        CostCalculatorCountry {
            code: "PRT".to_string(),
            name: "Portugal".to_string(),
            region_slug: "portugal-slug".to_string(),
            currency: Some(CurrencyRef {
                code: "EUR".to_string(),
                symbol: Some("€".to_string()),
            }),
            child_regions: Vec::new(),
        },
    ]
}

pub fn company_currencies() -> Vec<CompanyCurrency> {
    vec![
        CompanyCurrency {
            code: "USD".to_string(),
            slug: "usd-slug".to_string(),
        },
        CompanyCurrency {
            code: "EUR".to_string(),
            slug: "eur-slug".to_string(),
        },
    ]
}

/// Fake gateway serving every fixture above for Portugal
pub fn seeded_api() -> FakeRemoteApi {
    FakeRemoteApi::new()
        .with_countries(countries())
        .with_cost_calculator_countries(cost_calculator_countries())
        .with_currencies(company_currencies())
        .with_country_schema(
            COUNTRY_CODE,
            forms::EMPLOYMENT_BASIC_INFORMATION,
            employee_basic_information_schema(),
        )
        .with_country_schema(COUNTRY_CODE, forms::CONTRACT_DETAILS, contract_details_schema())
        .with_country_schema(
            COUNTRY_CODE,
            forms::CONTRACTOR_BASIC_INFORMATION,
            contractor_basic_information_schema(),
        )
        .with_country_schema(
            COUNTRY_CODE,
            forms::CONTRACTOR_CONTRACT_DETAILS,
            contractor_contract_details_schema(),
        )
        .with_benefits_schema(benefits_schema())
        .with_company_schema(
            forms::COMPANY_ADDRESS_DETAILS,
            COUNTRY_CODE,
            address_details_schema(),
        )
}
