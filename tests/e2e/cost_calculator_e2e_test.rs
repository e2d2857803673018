//! Cost calculator estimation over HTTP.

use pretty_assertions::assert_eq;
use remoteflows_core::{CostCalculatorFlow, CostCalculatorOptions};
use remoteflows_jsf::FieldValues;
use remoteflows_tests::utils::{context_for, TEST_TOKEN};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_catalogue(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/cost-calculator/countries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "code": "ARG",
                "name": "Argentina",
                "region_slug": "argentina-slug",
                "currency": { "code": "ARS", "symbol": "$" }
            }]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/company-currencies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "company_currencies": [{ "code": "USD", "slug": "usd-slug" }] }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_estimation_round_trip() {
    let server = MockServer::start().await;
    mount_catalogue(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/cost-calculator/estimation"))
        .and(header("Authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
        .and(body_json(json!({
            "employer_currency_slug": "usd-slug",
            "include_benefits": true,
            "include_cost_breakdowns": true,
            "employments": [{
                "region_slug": "argentina-slug",
                "annual_gross_salary": 100000,
                "annual_gross_salary_in_employer_currency": 100000,
                "employment_term": "fixed"
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "employments": [{
                    "country": { "code": "ARG", "name": "Argentina" },
                    "employer_currency_costs": {
                        "currency": { "code": "USD", "symbol": "$" },
                        "annual_gross_salary": 100000,
                        "monthly_total": 10250,
                        "annual_total": 123000
                    }
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (ctx, reporter) = context_for(&server);
    let mut flow = CostCalculatorFlow::load(ctx, CostCalculatorOptions::default())
        .await
        .unwrap();

    let input: FieldValues =
        serde_json::from_value(json!({ "country": "Argentina", "currency": "USD", "salary": "1000" }))
            .unwrap();
    let summary = flow.submit(input).await.unwrap();

    assert_eq!(summary.country, "Argentina");
    assert_eq!(summary.formatted_annual_gross_salary, "$1,000.00");
    assert_eq!(summary.formatted_monthly_total.as_deref(), Some("$102.50"));
    assert_eq!(summary.formatted_annual_total.as_deref(), Some("$1,230.00"));
    assert!(reporter.is_empty());
}

#[tokio::test]
async fn test_gateway_outage_is_a_transport_error() {
    let server = MockServer::start().await;
    mount_catalogue(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/cost-calculator/estimation"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "message": "Unavailable" })))
        .mount(&server)
        .await;

    let (ctx, reporter) = context_for(&server);
    let mut flow = CostCalculatorFlow::load(ctx, CostCalculatorOptions::default())
        .await
        .unwrap();

    let input: FieldValues =
        serde_json::from_value(json!({ "country": "ARG", "currency": "usd-slug", "salary": 1000 }))
            .unwrap();
    let error = flow.submit(input).await.unwrap_err();

    assert_eq!(error.error_code(), "ERR_TRANSPORT");
    assert!(error.to_string().contains("Unavailable"));
    assert!(flow.estimations().is_empty());
    assert!(!flow.bag().is_completed);
    assert!(reporter.is_empty());
}
