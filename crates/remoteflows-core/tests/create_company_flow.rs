use pretty_assertions::assert_eq;
use remoteflows_core::{
    CreateCompanyFlow, CreateCompanyOptions, CreateCompanyStep, FlowContext, FlowError, Transition,
};
use remoteflows_jsf::FieldValues;
use remoteflows_test_utils::fixtures;
use remoteflows_test_utils::{FakeRemoteApi, RecordingEvents};
use serde_json::{json, Value};
use std::sync::Arc;

fn values(value: Value) -> FieldValues {
    serde_json::from_value(value).unwrap()
}

fn basic_information() -> FieldValues {
    values(json!({
        "name": "Acme",
        "country_code": "PRT",
        "desired_currency": "EUR",
        "terms_of_service": true
    }))
}

async fn load(api: &FakeRemoteApi) -> (CreateCompanyFlow, RecordingEvents) {
    let events = RecordingEvents::new();
    let ctx = FlowContext::new(Arc::new(api.clone())).with_events(Arc::new(events.clone()));
    let flow = CreateCompanyFlow::load(ctx, CreateCompanyOptions::default())
        .await
        .unwrap();
    (flow, events)
}

#[tokio::test]
async fn test_create_company_then_address() {
    let api = fixtures::seeded_api();
    let (mut flow, events) = load(&api).await;
    assert_eq!(flow.bag().step_name, "company_basic_information");

    flow.submit(basic_information()).await.unwrap();

    let create = api.calls_to("create_company")[0].payload.clone().unwrap();
    assert_eq!(create["name"], "Acme");
    assert!(create.get("terms_of_service").is_none());
    assert!(create["terms_of_service_accepted_at"].is_string());

    let bag = flow.bag();
    assert_eq!(bag.step.name, CreateCompanyStep::AddressDetails);
    assert!(bag.fields.iter().any(|f| f.name == "postal_code"));
    assert_eq!(
        api.calls_to("company_schema")[0].target.as_deref(),
        Some("company:address_details:PRT")
    );

    let address = json!({ "address": "Rua Augusta 1", "city": "Lisboa", "postal_code": "1100-048" });
    let transition = flow.submit(values(address.clone())).await.unwrap();

    assert_eq!(transition, Transition::Completed);
    let company_id = flow.company().unwrap().id.clone();
    assert_eq!(api.company(&company_id).unwrap().address_details, Some(address));
    assert_eq!(
        events.successes(),
        vec!["company_basic_information", "address_details"]
    );
}

#[tokio::test]
async fn test_terms_must_be_accepted() {
    let api = fixtures::seeded_api();
    let (mut flow, events) = load(&api).await;

    let mut input = basic_information();
    input.remove("terms_of_service");
    let error = flow.submit(input).await.unwrap_err();

    let FlowError::Validation(mutation) = error else {
        panic!("expected a validation error, got {:?}", error);
    };
    assert_eq!(mutation.errors_for("terms_of_service").count(), 1);
    assert_eq!(api.call_count("create_company"), 0);
    assert_eq!(events.errors().len(), 1);
}

#[tokio::test]
async fn test_invalid_postal_code_is_rejected_locally() {
    let api = fixtures::seeded_api();
    let (mut flow, _events) = load(&api).await;
    flow.submit(basic_information()).await.unwrap();

    let error = flow
        .submit(values(json!({ "address": "Rua Augusta 1", "city": "Lisboa", "postal_code": "1100" })))
        .await
        .unwrap_err();

    let FlowError::Validation(mutation) = error else {
        panic!("expected a validation error, got {:?}", error);
    };
    assert_eq!(mutation.errors_for("postal_code").count(), 1);
    assert_eq!(api.call_count("update_company"), 0);
}

#[tokio::test]
async fn test_resubmitting_basic_information_updates_the_company() {
    let api = fixtures::seeded_api();
    let (mut flow, _events) = load(&api).await;
    flow.submit(basic_information()).await.unwrap();

    flow.back().unwrap();
    assert_eq!(flow.bag().values["name"], "Acme");
    let mut input = basic_information();
    input.insert("name".to_string(), json!("Acme Holdings"));
    flow.submit(input).await.unwrap();

    assert_eq!(api.call_count("create_company"), 1);
    let company_id = flow.company().unwrap().id.clone();
    assert_eq!(
        api.calls_to("update_company")[0].target.as_deref(),
        Some(company_id.as_str())
    );
    assert_eq!(
        api.company(&company_id).unwrap().name.as_deref(),
        Some("Acme Holdings")
    );
    assert_eq!(api.call_count("company_schema"), 1);
}

#[tokio::test]
async fn test_submit_after_completion_is_refused() {
    let api = fixtures::seeded_api();
    let (mut flow, events) = load(&api).await;
    flow.submit(basic_information()).await.unwrap();
    let address = json!({ "address": "Rua Augusta 1", "city": "Lisboa", "postal_code": "1100-048" });
    flow.submit(values(address.clone())).await.unwrap();

    let error = flow.submit(values(address)).await.unwrap_err();

    assert_eq!(error.error_code(), "ERR_INVALID_STEP");
    assert_eq!(api.call_count("update_company"), 1);
    assert_eq!(events.errors().len(), 1);
    assert!(flow.bag().is_completed);
}
