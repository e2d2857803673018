//! Employee onboarding over HTTP: schemas, authentication and server errors.

use pretty_assertions::assert_eq;
use remoteflows_core::{FlowError, OnboardingFlow, OnboardingOptions, OnboardingStep};
use remoteflows_jsf::FieldValues;
use remoteflows_tests::utils::{context_for, TEST_TOKEN};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn portugal() -> OnboardingOptions {
    OnboardingOptions {
        country_code: Some("PRT".to_string()),
        ..Default::default()
    }
}

fn basic_information() -> FieldValues {
    serde_json::from_value(json!({ "name": "Ada Lovelace", "email": "ada@example.com" })).unwrap()
}

async fn mount_basic_information_schema(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/countries/PRT/employment_basic_information"))
        .and(header("Authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "schema": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "title": "Full name" },
                        "email": { "type": "string", "title": "Email", "format": "email" }
                    },
                    "required": ["name", "email"]
                }
            }
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_basic_information_creates_the_employment() {
    let server = MockServer::start().await;
    mount_basic_information_schema(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/employments"))
        .and(body_json(json!({
            "basic_information": { "name": "Ada Lovelace", "email": "ada@example.com" },
            "country_code": "PRT",
            "type": "employee"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "employment": { "id": "emp-9", "status": "created", "country": { "code": "PRT" } } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/countries/PRT/contract_details"))
        .and(query_param("employment_id", "emp-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "schema": {
                    "type": "object",
                    "properties": {
                        "annual_gross_salary": {
                            "type": "integer",
                            "title": "Annual gross salary",
                            "x-jsf-presentation": { "inputType": "money", "currency": "EUR" }
                        }
                    },
                    "required": ["annual_gross_salary"]
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (ctx, reporter) = context_for(&server);
    let mut flow = OnboardingFlow::load(ctx, portugal()).await.unwrap();
    flow.submit(basic_information()).await.unwrap();

    assert_eq!(flow.employment().map(|e| e.id.as_str()), Some("emp-9"));
    let bag = flow.bag();
    assert_eq!(bag.step.name, OnboardingStep::ContractDetails);
    assert_eq!(bag.fields[0].name, "annual_gross_salary");
    assert!(reporter.is_empty());
}

#[tokio::test]
async fn test_unprocessable_entity_keeps_field_errors() {
    let server = MockServer::start().await;
    mount_basic_information_schema(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/employments"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "errors": { "email": ["has already been taken"] }
        })))
        .mount(&server)
        .await;

    let (ctx, _reporter) = context_for(&server);
    let mut flow = OnboardingFlow::load(ctx, portugal()).await.unwrap();

    let error = flow.submit(basic_information()).await.unwrap_err();

    let FlowError::Validation(mutation) = error else {
        panic!("expected a validation error, got {:?}", error);
    };
    assert_eq!(
        mutation.errors_for("email").next().map(|e| e.message.as_str()),
        Some("has already been taken")
    );
    assert_eq!(flow.bag().step.name, OnboardingStep::BasicInformation);
    assert!(flow.employment().is_none());
}
