//! API traits the flows depend on.
//!
//! The HTTP client implements these against the gateway; tests use in-memory
//! fakes. Failures are reported as [`ApiFailure`] so flows never depend on
//! transport types.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::cost::{CompanyCurrency, CostCalculatorCountry, CostEstimation};
use super::employment::{Company, ContractDocument, Country, Employment};

/// Failure of one API call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiFailure {
    /// The gateway answered with a non-success status
    #[error("HTTP status {status}")]
    Status { status: u16, body: Value },

    /// The request never got a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// A success response could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

impl ApiFailure {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiFailure::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for API calls
pub type ApiResult<T> = Result<T, ApiFailure>;

/// Country forms served by `GET /v1/countries/{code}/{form}`
pub mod forms {
    pub const EMPLOYMENT_BASIC_INFORMATION: &str = "employment_basic_information";
    pub const CONTRACT_DETAILS: &str = "contract_details";
    pub const CONTRACTOR_BASIC_INFORMATION: &str = "contractor_basic_information";
    pub const CONTRACTOR_CONTRACT_DETAILS: &str = "contractor_contract_details";
    pub const COMPANY_ADDRESS_DETAILS: &str = "address_details";
}

#[async_trait]
pub trait CountryApi: Send + Sync {
    /// Countries employments can be created in
    async fn list_countries(&self) -> ApiResult<Vec<Country>>;
}

#[async_trait]
pub trait SchemaApi: Send + Sync {
    /// Form schema for a country
    async fn country_form_schema(
        &self,
        country_code: &str,
        form: &str,
        employment_id: Option<&str>,
    ) -> ApiResult<Value>;

    /// Benefit offers schema of an employment
    async fn benefit_offers_schema(&self, employment_id: &str) -> ApiResult<Value>;

    /// Company form schema
    async fn company_schema(&self, form: &str, country_code: &str) -> ApiResult<Value>;
}

#[async_trait]
pub trait EmploymentApi: Send + Sync {
    async fn create_employment(&self, payload: &Value) -> ApiResult<Employment>;

    async fn get_employment(&self, employment_id: &str) -> ApiResult<Employment>;

    async fn update_employment(&self, employment_id: &str, payload: &Value)
        -> ApiResult<Employment>;

    async fn update_benefit_offers(&self, employment_id: &str, payload: &Value) -> ApiResult<()>;

    async fn invite_employment(&self, employment_id: &str) -> ApiResult<()>;

    async fn create_reserve_invoice(&self, employment_id: &str) -> ApiResult<()>;
}

#[async_trait]
pub trait OffboardingApi: Send + Sync {
    async fn create_offboarding(&self, payload: &Value) -> ApiResult<Value>;
}

#[async_trait]
pub trait CompanyApi: Send + Sync {
    async fn get_company(&self, company_id: &str) -> ApiResult<Company>;

    async fn create_company(&self, payload: &Value) -> ApiResult<Company>;

    async fn update_company(&self, company_id: &str, payload: &Value) -> ApiResult<Company>;
}

#[async_trait]
pub trait CostCalculatorApi: Send + Sync {
    async fn list_cost_calculator_countries(&self) -> ApiResult<Vec<CostCalculatorCountry>>;

    async fn list_company_currencies(&self) -> ApiResult<Vec<CompanyCurrency>>;

    /// Extra fields schema for a region
    async fn region_fields_schema(&self, region_slug: &str) -> ApiResult<Value>;

    async fn create_estimation(&self, payload: &Value) -> ApiResult<CostEstimation>;
}

#[async_trait]
pub trait ContractorApi: Send + Sync {
    async fn update_pricing_plan(&self, employment_id: &str, payload: &Value) -> ApiResult<()>;

    async fn create_contract_document(
        &self,
        employment_id: &str,
        payload: &Value,
    ) -> ApiResult<ContractDocument>;

    async fn sign_contract_document(
        &self,
        employment_id: &str,
        document_id: &str,
        payload: &Value,
    ) -> ApiResult<()>;
}

/// Everything a flow may call
pub trait RemoteApi:
    CountryApi
    + SchemaApi
    + EmploymentApi
    + OffboardingApi
    + CompanyApi
    + CostCalculatorApi
    + ContractorApi
{
}

impl<T> RemoteApi for T where
    T: CountryApi
        + SchemaApi
        + EmploymentApi
        + OffboardingApi
        + CompanyApi
        + CostCalculatorApi
        + ContractorApi
{
}
