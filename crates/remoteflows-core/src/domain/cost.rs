//! Cost calculator data.

use serde::{Deserialize, Serialize};

use super::employment::CountryRef;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyRef {
    pub code: String,
    #[serde(default)]
    pub symbol: Option<String>,
}

/// A country the cost calculator supports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostCalculatorCountry {
    pub code: String,
    pub name: String,
    pub region_slug: String,
    #[serde(default)]
    pub currency: Option<CurrencyRef>,
    #[serde(default)]
    pub child_regions: Vec<Region>,
}

/// A currency the employer can be billed in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyCurrency {
    pub code: String,
    pub slug: String,
}

/// Employer side costs of one estimated employment, in minor units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub currency: CurrencyRef,
    pub annual_gross_salary: i64,
    #[serde(default)]
    pub monthly_total: Option<i64>,
    #[serde(default)]
    pub annual_total: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatedEmployment {
    #[serde(default)]
    pub country: Option<CountryRef>,
    pub employer_currency_costs: CostBreakdown,
}

/// Response of an estimation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostEstimation {
    pub employments: Vec<EstimatedEmployment>,
}
