use remoteflows_client::{create_client, credentials_fn, AccessToken, ClientConfig, ProxyConfig};
use remoteflows_core::domain::api::{CompanyApi, EmploymentApi};
use remoteflows_core::{ApiFailure, CreditRiskStatus, EmploymentStatus};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::default().with_proxy(ProxyConfig {
        url: server.uri(),
        headers: BTreeMap::new(),
    })
}

#[tokio::test]
async fn test_bearer_token_is_fetched_once() {
    let server = MockServer::start().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let credentials = credentials_fn(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(AccessToken {
                access_token: "secret".to_string(),
                expires_in: 3600,
            })
        }
    });

    Mock::given(method("GET"))
        .and(path("/v1/employments/emp-1"))
        .and(header("Authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "employment": { "id": "emp-1", "status": "invited" } }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = create_client(Some(credentials), config_for(&server)).unwrap();
    let first = client.get_employment("emp-1").await.unwrap();
    let second = client.get_employment("emp-1").await.unwrap();

    assert_eq!(first.status, EmploymentStatus::Invited);
    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_company_is_unwrapped() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/v1/companies/co-1"))
        .and(body_json(json!({ "address_details": { "city": "Lisbon" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "company": { "id": "co-1", "credit_risk_status": "deposit_required" } }
        })))
        .mount(&server)
        .await;

    let client = create_client(None, config_for(&server)).unwrap();
    let company = client
        .update_company("co-1", &json!({ "address_details": { "city": "Lisbon" } }))
        .await
        .unwrap();

    assert_eq!(company.credit_risk_status, CreditRiskStatus::DepositRequired);
}

#[tokio::test]
async fn test_validation_body_is_kept() {
    let server = MockServer::start().await;
    let body = json!({ "errors": { "basic_information.email": ["is invalid"] } });

    Mock::given(method("POST"))
        .and(path("/v1/employments"))
        .respond_with(ResponseTemplate::new(422).set_body_json(body.clone()))
        .mount(&server)
        .await;

    let client = create_client(None, config_for(&server)).unwrap();
    let error = client.create_employment(&json!({})).await.unwrap_err();

    assert_eq!(error, ApiFailure::Status { status: 422, body });
}
