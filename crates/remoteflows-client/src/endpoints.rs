//! Gateway endpoints behind the core API traits.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::instrument;

use remoteflows_core::domain::api::{
    CompanyApi, ContractorApi, CostCalculatorApi, CountryApi, EmploymentApi, OffboardingApi,
    SchemaApi,
};
use remoteflows_core::domain::cost::{CompanyCurrency, CostCalculatorCountry, CostEstimation};
use remoteflows_core::{ApiFailure, ApiResult, Company, ContractDocument, Country, Employment};

use crate::client::ApiClient;

/// Unwrap `{"data": ...}` and, when present, the resource key inside it
fn unwrap_data(value: Value, key: Option<&str>) -> Value {
    let mut data = match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) => data,
            None => Value::Object(map),
        },
        other => other,
    };

    if let Some(key) = key {
        let inner = data.get_mut(key).map(Value::take);
        if let Some(inner) = inner {
            data = inner;
        }
    }
    data
}

fn decode<T: DeserializeOwned>(value: Value, key: Option<&str>) -> ApiResult<T> {
    serde_json::from_value(unwrap_data(value, key)).map_err(|e| ApiFailure::Decode(e.to_string()))
}

#[async_trait]
impl CountryApi for ApiClient {
    #[instrument(skip(self))]
    async fn list_countries(&self) -> ApiResult<Vec<Country>> {
        let value = self.get("/v1/countries", &[]).await?;
        decode(value, Some("countries"))
    }
}

#[async_trait]
impl SchemaApi for ApiClient {
    #[instrument(skip(self))]
    async fn country_form_schema(
        &self,
        country_code: &str,
        form: &str,
        employment_id: Option<&str>,
    ) -> ApiResult<Value> {
        let path = format!("/v1/countries/{}/{}", country_code, form);
        let query: Vec<(&str, &str)> = employment_id.map(|id| ("employment_id", id)).into_iter().collect();
        let value = self.get(&path, &query).await?;
        Ok(unwrap_data(value, Some("schema")))
    }

    #[instrument(skip(self))]
    async fn benefit_offers_schema(&self, employment_id: &str) -> ApiResult<Value> {
        let path = format!("/v1/employments/{}/benefit-offers/schema", employment_id);
        let value = self.get(&path, &[]).await?;
        Ok(unwrap_data(value, Some("schema")))
    }

    #[instrument(skip(self))]
    async fn company_schema(&self, form: &str, country_code: &str) -> ApiResult<Value> {
        let query = [("form", form), ("country_code", country_code)];
        let value = self.get("/v1/companies/schema", &query).await?;
        Ok(unwrap_data(value, Some("schema")))
    }
}

#[async_trait]
impl EmploymentApi for ApiClient {
    #[instrument(skip(self, payload))]
    async fn create_employment(&self, payload: &Value) -> ApiResult<Employment> {
        let value = self.post("/v1/employments", payload).await?;
        decode(value, Some("employment"))
    }

    #[instrument(skip(self))]
    async fn get_employment(&self, employment_id: &str) -> ApiResult<Employment> {
        let value = self.get(&format!("/v1/employments/{}", employment_id), &[]).await?;
        decode(value, Some("employment"))
    }

    #[instrument(skip(self, payload))]
    async fn update_employment(&self, employment_id: &str, payload: &Value) -> ApiResult<Employment> {
        let value = self
            .patch(&format!("/v1/employments/{}", employment_id), payload)
            .await?;
        decode(value, Some("employment"))
    }

    #[instrument(skip(self, payload))]
    async fn update_benefit_offers(&self, employment_id: &str, payload: &Value) -> ApiResult<()> {
        self.put(&format!("/v1/employments/{}/benefit-offers", employment_id), payload)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invite_employment(&self, employment_id: &str) -> ApiResult<()> {
        self.post(&format!("/v1/employments/{}/invite", employment_id), &json!({}))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn create_reserve_invoice(&self, employment_id: &str) -> ApiResult<()> {
        self.post(
            &format!("/v1/employments/{}/reserve-invoices", employment_id),
            &json!({}),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl OffboardingApi for ApiClient {
    #[instrument(skip(self, payload))]
    async fn create_offboarding(&self, payload: &Value) -> ApiResult<Value> {
        let value = self.post("/v1/offboardings", payload).await?;
        Ok(unwrap_data(value, None))
    }
}

#[async_trait]
impl CompanyApi for ApiClient {
    #[instrument(skip(self))]
    async fn get_company(&self, company_id: &str) -> ApiResult<Company> {
        let value = self.get(&format!("/v1/companies/{}", company_id), &[]).await?;
        decode(value, Some("company"))
    }

    #[instrument(skip(self, payload))]
    async fn create_company(&self, payload: &Value) -> ApiResult<Company> {
        let value = self.post("/v1/companies", payload).await?;
        decode(value, Some("company"))
    }

    #[instrument(skip(self, payload))]
    async fn update_company(&self, company_id: &str, payload: &Value) -> ApiResult<Company> {
        let value = self
            .patch(&format!("/v1/companies/{}", company_id), payload)
            .await?;
        decode(value, Some("company"))
    }
}

#[async_trait]
impl CostCalculatorApi for ApiClient {
    #[instrument(skip(self))]
    async fn list_cost_calculator_countries(&self) -> ApiResult<Vec<CostCalculatorCountry>> {
        let value = self.get("/v1/cost-calculator/countries", &[]).await?;
        decode(value, None)
    }

    #[instrument(skip(self))]
    async fn list_company_currencies(&self) -> ApiResult<Vec<CompanyCurrency>> {
        let value = self.get("/v1/company-currencies", &[]).await?;
        decode(value, Some("company_currencies"))
    }

    #[instrument(skip(self))]
    async fn region_fields_schema(&self, region_slug: &str) -> ApiResult<Value> {
        let path = format!("/v1/cost-calculator/regions/{}/fields", region_slug);
        let value = self.get(&path, &[]).await?;
        Ok(unwrap_data(value, Some("schema")))
    }

    #[instrument(skip(self, payload))]
    async fn create_estimation(&self, payload: &Value) -> ApiResult<CostEstimation> {
        let value = self.post("/v1/cost-calculator/estimation", payload).await?;
        decode(value, None)
    }
}

#[async_trait]
impl ContractorApi for ApiClient {
    #[instrument(skip(self, payload))]
    async fn update_pricing_plan(&self, employment_id: &str, payload: &Value) -> ApiResult<()> {
        self.put(
            &format!("/v1/contractors/employments/{}/pricing-plan", employment_id),
            payload,
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self, payload))]
    async fn create_contract_document(
        &self,
        employment_id: &str,
        payload: &Value,
    ) -> ApiResult<ContractDocument> {
        let path = format!("/v1/contractors/employments/{}/contract-documents", employment_id);
        let value = self.post(&path, payload).await?;
        decode(value, Some("contract_document"))
    }

    #[instrument(skip(self, payload))]
    async fn sign_contract_document(
        &self,
        employment_id: &str,
        document_id: &str,
        payload: &Value,
    ) -> ApiResult<()> {
        let path = format!(
            "/v1/contractors/employments/{}/contract-documents/{}/sign",
            employment_id, document_id
        );
        self.post(&path, payload).await?;
        Ok(())
    }
}
