//! In-memory implementation of every gateway trait.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use remoteflows_core::domain::api::{
    CompanyApi, ContractorApi, CostCalculatorApi, CountryApi, EmploymentApi, OffboardingApi,
    SchemaApi,
};
use remoteflows_core::domain::cost::{
    CompanyCurrency, CostBreakdown, CostCalculatorCountry, CostEstimation, CurrencyRef,
    EstimatedEmployment,
};
use remoteflows_core::domain::employment::CountryRef;
use remoteflows_core::{
    ApiFailure, ApiResult, Company, ContractDocument, Country, Employment, EmploymentStatus,
    EmploymentType,
};

/// One call made against the fake
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Trait method name, e.g. `create_employment`
    pub operation: &'static str,
    /// Resource id or schema key the call addressed
    pub target: Option<String>,
    pub payload: Option<Value>,
}

#[derive(Default)]
struct FakeState {
    countries: Vec<Country>,
    cost_countries: Vec<CostCalculatorCountry>,
    currencies: Vec<CompanyCurrency>,
    schemas: HashMap<String, Value>,
    employments: HashMap<String, Employment>,
    companies: HashMap<String, Company>,
    offboardings: Vec<Value>,
    failures: HashMap<&'static str, ApiFailure>,
    calls: Vec<RecordedCall>,
}

/// Thread-safe fake gateway for flow tests.
///
/// Schemas are registered up front, resources are created on demand and
/// failures can be injected per operation.
#[derive(Clone, Default)]
pub struct FakeRemoteApi {
    state: Arc<RwLock<FakeState>>,
}

impl fmt::Debug for FakeRemoteApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("FakeRemoteApi")
            .field("employment_count", &state.employments.len())
            .field("company_count", &state.companies.len())
            .field("call_count", &state.calls.len())
            .finish()
    }
}

fn country_schema_key(country_code: &str, form: &str) -> String {
    format!("country:{}:{}", country_code, form)
}

fn company_schema_key(form: &str, country_code: &str) -> String {
    format!("company:{}:{}", form, country_code)
}

fn benefits_schema_key() -> String {
    "benefit_offers".to_string()
}

fn region_schema_key(region_slug: &str) -> String {
    format!("region:{}", region_slug)
}

fn not_found(what: &str) -> ApiFailure {
    ApiFailure::Status {
        status: 404,
        body: json!({ "message": format!("{} not found", what) }),
    }
}

impl FakeRemoteApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_countries(self, countries: Vec<Country>) -> Self {
        self.state.write().countries = countries;
        self
    }

    pub fn with_cost_calculator_countries(self, countries: Vec<CostCalculatorCountry>) -> Self {
        self.state.write().cost_countries = countries;
        self
    }

    pub fn with_currencies(self, currencies: Vec<CompanyCurrency>) -> Self {
        self.state.write().currencies = currencies;
        self
    }

    /// Schema served for `GET /v1/countries/{country_code}/{form}`
    pub fn with_country_schema(self, country_code: &str, form: &str, schema: Value) -> Self {
        self.state
            .write()
            .schemas
            .insert(country_schema_key(country_code, form), schema);
        self
    }

    /// Benefit offers schema, shared by all employments
    pub fn with_benefits_schema(self, schema: Value) -> Self {
        self.state.write().schemas.insert(benefits_schema_key(), schema);
        self
    }

    pub fn with_company_schema(self, form: &str, country_code: &str, schema: Value) -> Self {
        self.state
            .write()
            .schemas
            .insert(company_schema_key(form, country_code), schema);
        self
    }

    pub fn with_region_schema(self, region_slug: &str, schema: Value) -> Self {
        self.state
            .write()
            .schemas
            .insert(region_schema_key(region_slug), schema);
        self
    }

    pub fn with_employment(self, employment: Employment) -> Self {
        self.state
            .write()
            .employments
            .insert(employment.id.clone(), employment);
        self
    }

    pub fn with_company(self, company: Company) -> Self {
        self.state.write().companies.insert(company.id.clone(), company);
        self
    }

    /// Make every call to `operation` fail until cleared
    pub fn fail(&self, operation: &'static str, failure: ApiFailure) {
        self.state.write().failures.insert(operation, failure);
    }

    pub fn clear_failure(&self, operation: &'static str) {
        self.state.write().failures.remove(operation);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.read().calls.clone()
    }

    pub fn calls_to(&self, operation: &str) -> Vec<RecordedCall> {
        self.state
            .read()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .cloned()
            .collect()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls_to(operation).len()
    }

    pub fn employment(&self, id: &str) -> Option<Employment> {
        self.state.read().employments.get(id).cloned()
    }

    pub fn company(&self, id: &str) -> Option<Company> {
        self.state.read().companies.get(id).cloned()
    }

    pub fn offboardings(&self) -> Vec<Value> {
        self.state.read().offboardings.clone()
    }

    /// Record the call and return the injected failure, if any
    fn record(
        &self,
        operation: &'static str,
        target: Option<&str>,
        payload: Option<&Value>,
    ) -> ApiResult<()> {
        let mut state = self.state.write();
        state.calls.push(RecordedCall {
            operation,
            target: target.map(str::to_string),
            payload: payload.cloned(),
        });
        debug!(operation, target = ?target, "Fake API call");
        match state.failures.get(operation) {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }

    fn schema(&self, key: &str) -> ApiResult<Value> {
        self.state
            .read()
            .schemas
            .get(key)
            .cloned()
            .ok_or_else(|| not_found("Schema"))
    }

    fn update_employment_with<F>(&self, id: &str, update: F) -> ApiResult<Employment>
    where
        F: FnOnce(&mut Employment),
    {
        let mut state = self.state.write();
        let employment = state
            .employments
            .get_mut(id)
            .ok_or_else(|| not_found("Employment"))?;
        update(employment);
        Ok(employment.clone())
    }
}

#[async_trait]
impl CountryApi for FakeRemoteApi {
    async fn list_countries(&self) -> ApiResult<Vec<Country>> {
        self.record("list_countries", None, None)?;
        Ok(self.state.read().countries.clone())
    }
}

#[async_trait]
impl SchemaApi for FakeRemoteApi {
    async fn country_form_schema(
        &self,
        country_code: &str,
        form: &str,
        _employment_id: Option<&str>,
    ) -> ApiResult<Value> {
        let key = country_schema_key(country_code, form);
        self.record("country_form_schema", Some(&key), None)?;
        self.schema(&key)
    }

    async fn benefit_offers_schema(&self, employment_id: &str) -> ApiResult<Value> {
        self.record("benefit_offers_schema", Some(employment_id), None)?;
        self.schema(&benefits_schema_key())
    }

    async fn company_schema(&self, form: &str, country_code: &str) -> ApiResult<Value> {
        let key = company_schema_key(form, country_code);
        self.record("company_schema", Some(&key), None)?;
        self.schema(&key)
    }
}

#[async_trait]
impl EmploymentApi for FakeRemoteApi {
    async fn create_employment(&self, payload: &Value) -> ApiResult<Employment> {
        self.record("create_employment", None, Some(payload))?;

        let employment_type = match payload.get("type").and_then(Value::as_str) {
            Some("contractor") => Some(EmploymentType::Contractor),
            Some(_) => Some(EmploymentType::Employee),
            None => None,
        };
        let employment = Employment {
            id: Uuid::new_v4().to_string(),
            status: EmploymentStatus::Created,
            employment_type,
            country: payload
                .get("country_code")
                .and_then(Value::as_str)
                .map(|code| CountryRef {
                    code: code.to_string(),
                    name: None,
                }),
            basic_information: payload.get("basic_information").cloned(),
            contract_details: None,
            pricing_plan_details: None,
            contract_documents: Vec::new(),
        };

        self.state
            .write()
            .employments
            .insert(employment.id.clone(), employment.clone());
        Ok(employment)
    }

    async fn get_employment(&self, employment_id: &str) -> ApiResult<Employment> {
        self.record("get_employment", Some(employment_id), None)?;
        self.state
            .read()
            .employments
            .get(employment_id)
            .cloned()
            .ok_or_else(|| not_found("Employment"))
    }

    async fn update_employment(&self, employment_id: &str, payload: &Value) -> ApiResult<Employment> {
        self.record("update_employment", Some(employment_id), Some(payload))?;
        self.update_employment_with(employment_id, |employment| {
            if let Some(section) = payload.get("basic_information") {
                employment.basic_information = Some(section.clone());
            }
            if let Some(section) = payload.get("contract_details") {
                employment.contract_details = Some(section.clone());
            }
        })
    }

    async fn update_benefit_offers(&self, employment_id: &str, payload: &Value) -> ApiResult<()> {
        self.record("update_benefit_offers", Some(employment_id), Some(payload))?;
        self.update_employment_with(employment_id, |_| {})?;
        Ok(())
    }

    async fn invite_employment(&self, employment_id: &str) -> ApiResult<()> {
        self.record("invite_employment", Some(employment_id), None)?;
        self.update_employment_with(employment_id, |employment| {
            employment.status = EmploymentStatus::Invited;
        })?;
        Ok(())
    }

    async fn create_reserve_invoice(&self, employment_id: &str) -> ApiResult<()> {
        self.record("create_reserve_invoice", Some(employment_id), None)?;
        self.update_employment_with(employment_id, |employment| {
            employment.status = EmploymentStatus::CreatedAwaitingReserve;
        })?;
        Ok(())
    }
}

#[async_trait]
impl OffboardingApi for FakeRemoteApi {
    async fn create_offboarding(&self, payload: &Value) -> ApiResult<Value> {
        self.record("create_offboarding", None, Some(payload))?;
        let offboarding = json!({
            "id": Uuid::new_v4().to_string(),
            "employment_id": payload.get("employment_id"),
            "type": payload.get("type"),
            "status": "submitted",
        });
        self.state.write().offboardings.push(payload.clone());
        Ok(json!({ "offboarding": offboarding }))
    }
}

#[async_trait]
impl CompanyApi for FakeRemoteApi {
    async fn get_company(&self, company_id: &str) -> ApiResult<Company> {
        self.record("get_company", Some(company_id), None)?;
        self.state
            .read()
            .companies
            .get(company_id)
            .cloned()
            .ok_or_else(|| not_found("Company"))
    }

    async fn create_company(&self, payload: &Value) -> ApiResult<Company> {
        self.record("create_company", None, Some(payload))?;
        let text = |key: &str| payload.get(key).and_then(Value::as_str).map(str::to_string);
        let company = Company {
            id: Uuid::new_v4().to_string(),
            name: text("name"),
            country_code: text("country_code"),
            credit_risk_status: Default::default(),
            address_details: None,
        };
        self.state
            .write()
            .companies
            .insert(company.id.clone(), company.clone());
        Ok(company)
    }

    async fn update_company(&self, company_id: &str, payload: &Value) -> ApiResult<Company> {
        self.record("update_company", Some(company_id), Some(payload))?;
        let mut state = self.state.write();
        let company = state
            .companies
            .get_mut(company_id)
            .ok_or_else(|| not_found("Company"))?;

        if let Some(name) = payload.get("name").and_then(Value::as_str) {
            company.name = Some(name.to_string());
        }
        if let Some(code) = payload.get("country_code").and_then(Value::as_str) {
            company.country_code = Some(code.to_string());
        }
        if let Some(address) = payload.get("address_details") {
            company.address_details = Some(address.clone());
        }
        Ok(company.clone())
    }
}

#[async_trait]
impl CostCalculatorApi for FakeRemoteApi {
    async fn list_cost_calculator_countries(&self) -> ApiResult<Vec<CostCalculatorCountry>> {
        self.record("list_cost_calculator_countries", None, None)?;
        Ok(self.state.read().cost_countries.clone())
    }

    async fn list_company_currencies(&self) -> ApiResult<Vec<CompanyCurrency>> {
        self.record("list_company_currencies", None, None)?;
        Ok(self.state.read().currencies.clone())
    }

    async fn region_fields_schema(&self, region_slug: &str) -> ApiResult<Value> {
        self.record("region_fields_schema", Some(region_slug), None)?;
        // regions without extra fields answer with an empty schema
        Ok(self
            .state
            .read()
            .schemas
            .get(&region_schema_key(region_slug))
            .cloned()
            .unwrap_or_else(|| json!({})))
    }

    /// Employer costs are the gross salary plus a flat 20%
    async fn create_estimation(&self, payload: &Value) -> ApiResult<CostEstimation> {
        self.record("create_estimation", None, Some(payload))?;
        let state = self.state.read();

        let currency_code = payload
            .get("employer_currency_slug")
            .and_then(Value::as_str)
            .and_then(|slug| state.currencies.iter().find(|c| c.slug == slug))
            .map(|c| c.code.clone())
            .unwrap_or_else(|| "USD".to_string());

        let requested = payload
            .get("employments")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let employments = requested
            .iter()
            .map(|employment| {
                let region = employment.get("region_slug").and_then(Value::as_str).unwrap_or_default();
                let salary = employment
                    .get("annual_gross_salary_in_employer_currency")
                    .or_else(|| employment.get("annual_gross_salary"))
                    .and_then(Value::as_i64)
                    .unwrap_or_default();
                let annual_total = salary + salary / 5;

                EstimatedEmployment {
                    country: state
                        .cost_countries
                        .iter()
                        .find(|c| c.region_slug == region)
                        .map(|c| CountryRef {
                            code: c.code.clone(),
                            name: Some(c.name.clone()),
                        }),
                    employer_currency_costs: CostBreakdown {
                        currency: CurrencyRef {
                            code: currency_code.clone(),
                            symbol: None,
                        },
                        annual_gross_salary: salary,
                        monthly_total: Some(annual_total / 12),
                        annual_total: Some(annual_total),
                    },
                }
            })
            .collect();

        Ok(CostEstimation { employments })
    }
}

#[async_trait]
impl ContractorApi for FakeRemoteApi {
    async fn update_pricing_plan(&self, employment_id: &str, payload: &Value) -> ApiResult<()> {
        self.record("update_pricing_plan", Some(employment_id), Some(payload))?;
        self.update_employment_with(employment_id, |employment| {
            employment.pricing_plan_details = Some(payload.clone());
        })?;
        Ok(())
    }

    async fn create_contract_document(
        &self,
        employment_id: &str,
        payload: &Value,
    ) -> ApiResult<ContractDocument> {
        self.record("create_contract_document", Some(employment_id), Some(payload))?;
        let document = ContractDocument {
            id: Uuid::new_v4().to_string(),
            status: "awaiting_signature".to_string(),
        };
        let created = document.clone();
        self.update_employment_with(employment_id, move |employment| {
            employment.contract_documents.push(created);
        })?;
        Ok(document)
    }

    async fn sign_contract_document(
        &self,
        employment_id: &str,
        document_id: &str,
        payload: &Value,
    ) -> ApiResult<()> {
        self.record("sign_contract_document", Some(document_id), Some(payload))?;
        let mut state = self.state.write();
        let document = state
            .employments
            .get_mut(employment_id)
            .and_then(|e| e.contract_documents.iter_mut().find(|d| d.id == document_id))
            .ok_or_else(|| not_found("Contract document"))?;
        document.status = "signed".to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failure_injection_and_recording() {
        let api = FakeRemoteApi::new();
        api.fail(
            "create_employment",
            ApiFailure::Status {
                status: 422,
                body: json!({ "message": "nope" }),
            },
        );

        let result = api.create_employment(&json!({ "type": "employee" })).await;
        assert_eq!(result.unwrap_err().status(), Some(422));
        assert_eq!(api.call_count("create_employment"), 1);

        api.clear_failure("create_employment");
        let employment = api
            .create_employment(&json!({ "type": "employee", "country_code": "PRT" }))
            .await
            .unwrap();
        assert_eq!(employment.country_code(), Some("PRT"));
        assert_eq!(api.employment(&employment.id), Some(employment));
    }

    #[tokio::test]
    async fn test_missing_schema_is_not_found() {
        let api = FakeRemoteApi::new();
        let result = api.country_form_schema("PRT", "contract_details", None).await;
        assert_eq!(result.unwrap_err().status(), Some(404));
    }
}
