use pretty_assertions::assert_eq;
use remoteflows_core::{
    ContractorOnboardingFlow, ContractorOnboardingOptions, ContractorOnboardingStep,
    EmploymentStatus, EmploymentType, FlowContext, FlowError, NavigationError, Transition,
};
use remoteflows_jsf::FieldValues;
use remoteflows_test_utils::fixtures::{self, COUNTRY_CODE};
use remoteflows_test_utils::{FakeRemoteApi, RecordingEvents};
use serde_json::{json, Value};
use std::sync::Arc;

fn values(value: Value) -> FieldValues {
    serde_json::from_value(value).unwrap()
}

async fn load(
    api: &FakeRemoteApi,
    options: ContractorOnboardingOptions,
) -> (ContractorOnboardingFlow, RecordingEvents) {
    let events = RecordingEvents::new();
    let ctx = FlowContext::new(Arc::new(api.clone())).with_events(Arc::new(events.clone()));
    let flow = ContractorOnboardingFlow::load(ctx, options).await.unwrap();
    (flow, events)
}

fn in_portugal() -> ContractorOnboardingOptions {
    ContractorOnboardingOptions {
        country_code: Some(COUNTRY_CODE.to_string()),
        ..Default::default()
    }
}

async fn submit_until_preview(flow: &mut ContractorOnboardingFlow) {
    flow.submit(values(json!({ "name": "Ada Lovelace", "email": "ada@example.com" })))
        .await
        .unwrap();
    flow.submit(values(json!({ "pricing_plan": "plus" }))).await.unwrap();
    flow.submit(values(json!({ "services_description": "Consulting", "payment_amount": "2500" })))
        .await
        .unwrap();
    assert_eq!(flow.bag().step.name, ContractorOnboardingStep::ContractPreview);
}

#[tokio::test]
async fn test_contractor_onboarding_happy_path() {
    let api = fixtures::seeded_api();
    let (mut flow, events) = load(&api, in_portugal()).await;
    assert_eq!(flow.bag().step_count, 5);

    submit_until_preview(&mut flow).await;

    let employment = flow.employment().unwrap().clone();
    assert_eq!(
        api.employment(&employment.id).unwrap().employment_type,
        Some(EmploymentType::Contractor)
    );
    assert_eq!(
        api.calls_to("update_pricing_plan")[0].payload,
        Some(json!({ "pricing_plan": "plus" }))
    );
    assert_eq!(
        api.calls_to("create_contract_document")[0].payload,
        Some(json!({
            "contract_document": { "services_description": "Consulting", "payment_amount": 250000 }
        }))
    );
    let document = flow.contract_document().unwrap().clone();
    assert!(!document.is_signed());

    flow.submit(values(json!({ "review_completed": true, "signature": "Ada Lovelace" })))
        .await
        .unwrap();
    assert_eq!(
        api.calls_to("sign_contract_document")[0].target.as_deref(),
        Some(document.id.as_str())
    );
    assert!(flow.contract_document().unwrap().is_signed());

    let transition = flow.submit(FieldValues::new()).await.unwrap();
    assert_eq!(transition, Transition::Completed);
    assert_eq!(api.employment(&employment.id).unwrap().status, EmploymentStatus::Invited);
    assert_eq!(
        events.successes(),
        vec![
            "basic_information",
            "pricing_plan",
            "contract_details",
            "contract_preview",
            "review"
        ]
    );
}

#[tokio::test]
async fn test_unsigned_contract_is_not_sent() {
    let api = fixtures::seeded_api();
    let (mut flow, events) = load(&api, in_portugal()).await;
    submit_until_preview(&mut flow).await;

    let error = flow
        .submit(values(json!({ "review_completed": true })))
        .await
        .unwrap_err();

    let FlowError::Validation(mutation) = error else {
        panic!("expected a validation error, got {:?}", error);
    };
    assert_eq!(mutation.errors_for("signature").count(), 1);
    assert_eq!(api.call_count("sign_contract_document"), 0);
    assert_eq!(events.errors()[0].0, "contract_preview");
}

#[tokio::test]
async fn test_back_is_locked_after_signing() {
    let api = fixtures::seeded_api();
    let (mut flow, events) = load(&api, in_portugal()).await;
    submit_until_preview(&mut flow).await;

    flow.back().unwrap();
    assert_eq!(flow.bag().step.name, ContractorOnboardingStep::ContractDetails);
    flow.submit(values(json!({ "services_description": "Consulting", "payment_amount": "3000" })))
        .await
        .unwrap();
    flow.submit(values(json!({ "review_completed": true, "signature": "Ada Lovelace" })))
        .await
        .unwrap();

    let error = flow.back().unwrap_err();

    assert_eq!(
        error,
        FlowError::NavigationGuard(NavigationError::ReadOnly("contract signed".to_string()))
    );
    assert_eq!(flow.bag().step.name, ContractorOnboardingStep::Review);
    assert_eq!(events.back_errors().len(), 1);
    assert_eq!(api.call_count("create_contract_document"), 2);
}

#[tokio::test]
async fn test_resume_at_contract_preview() {
    let api = fixtures::seeded_api().with_employment(fixtures::employment(json!({
        "id": "contractor-1",
        "status": "created",
        "country": { "code": "PRT" },
        "basic_information": { "name": "Ada Lovelace", "email": "ada@example.com" },
        "pricing_plan_details": { "pricing_plan": "cor" },
        "contract_details": { "services_description": "Consulting", "payment_amount": 250000 },
        "contract_documents": [{ "id": "doc-1", "status": "awaiting_signature" }]
    })));
    let options = ContractorOnboardingOptions {
        employment_id: Some("contractor-1".to_string()),
        ..Default::default()
    };

    let (mut flow, _events) = load(&api, options).await;

    assert_eq!(flow.bag().step.name, ContractorOnboardingStep::ContractPreview);
    assert_eq!(flow.contract_document().map(|d| d.id.as_str()), Some("doc-1"));

    flow.back().unwrap();
    let bag = flow.bag();
    assert_eq!(bag.step.name, ContractorOnboardingStep::ContractDetails);
    assert_eq!(bag.values["services_description"], "Consulting");
    assert_eq!(bag.values["payment_amount"], 2500);

    flow.back().unwrap();
    assert_eq!(flow.bag().values["pricing_plan"], "cor");
}

#[tokio::test]
async fn test_go_to_contract_details_before_signing() {
    let api = fixtures::seeded_api();
    let (mut flow, _events) = load(&api, in_portugal()).await;
    submit_until_preview(&mut flow).await;

    let target = flow.go_to(ContractorOnboardingStep::ContractDetails).await.unwrap();
    assert_eq!(target.name, ContractorOnboardingStep::ContractDetails);
    assert_eq!(flow.bag().values["payment_amount"], "2500");

    flow.submit(values(json!({ "services_description": "Consulting", "payment_amount": "3000" })))
        .await
        .unwrap();

    assert_eq!(flow.bag().step.name, ContractorOnboardingStep::ContractPreview);
    let documents = api.calls_to("create_contract_document");
    assert_eq!(documents.len(), 2);
    assert_eq!(
        documents[1].payload.as_ref().unwrap()["contract_document"]["payment_amount"],
        300000
    );
    flow.back().unwrap();
    flow.back().unwrap();
    assert_eq!(flow.bag().values["pricing_plan"], "plus");
}

#[tokio::test]
async fn test_go_to_is_locked_after_signing() {
    let api = fixtures::seeded_api();
    let (mut flow, events) = load(&api, in_portugal()).await;
    submit_until_preview(&mut flow).await;
    flow.submit(values(json!({ "review_completed": true, "signature": "Ada Lovelace" })))
        .await
        .unwrap();

    let error = flow
        .go_to(ContractorOnboardingStep::ContractDetails)
        .await
        .unwrap_err();

    assert_eq!(
        error,
        FlowError::NavigationGuard(NavigationError::ReadOnly("contract signed".to_string()))
    );
    assert_eq!(flow.bag().step.name, ContractorOnboardingStep::Review);
    assert_eq!(events.back_errors().len(), 1);
}

#[tokio::test]
async fn test_submit_after_invite_is_refused() {
    let api = fixtures::seeded_api();
    let (mut flow, events) = load(&api, in_portugal()).await;
    submit_until_preview(&mut flow).await;
    flow.submit(values(json!({ "review_completed": true, "signature": "Ada Lovelace" })))
        .await
        .unwrap();
    flow.submit(FieldValues::new()).await.unwrap();

    let error = flow.submit(FieldValues::new()).await.unwrap_err();

    assert_eq!(error.error_code(), "ERR_INVALID_STEP");
    assert_eq!(api.call_count("invite_employment"), 1);
    assert_eq!(api.call_count("sign_contract_document"), 1);
    assert_eq!(events.errors().len(), 1);
}
