//! Employments, companies and the statuses that drive navigation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Server reported employment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    Created,
    CreatedAwaitingReserve,
    CreatedReservePaid,
    Invited,
    Review,
    Pending,
    Active,
    Archived,
    Deleted,
    Job,
    #[default]
    #[serde(other)]
    Unknown,
}

impl EmploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentStatus::Created => "created",
            EmploymentStatus::CreatedAwaitingReserve => "created_awaiting_reserve",
            EmploymentStatus::CreatedReservePaid => "created_reserve_paid",
            EmploymentStatus::Invited => "invited",
            EmploymentStatus::Review => "review",
            EmploymentStatus::Pending => "pending",
            EmploymentStatus::Active => "active",
            EmploymentStatus::Archived => "archived",
            EmploymentStatus::Deleted => "deleted",
            EmploymentStatus::Job => "job",
            EmploymentStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EmploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Statuses in which an employee onboarding can no longer be edited
pub const ONBOARDING_READ_ONLY_STATUSES: [EmploymentStatus; 4] = [
    EmploymentStatus::Invited,
    EmploymentStatus::CreatedAwaitingReserve,
    EmploymentStatus::CreatedReservePaid,
    EmploymentStatus::Review,
];

/// Whether an employee onboarding in `status` is read-only
pub fn is_onboarding_read_only(status: EmploymentStatus) -> bool {
    ONBOARDING_READ_ONLY_STATUSES.contains(&status)
}

/// Company credit risk assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditRiskStatus {
    NotStarted,
    Referred,
    DepositRequired,
    NoDepositRequired,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    Employee,
    Contractor,
}

impl EmploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::Employee => "employee",
            EmploymentType::Contractor => "contractor",
        }
    }
}

/// Country reference embedded in API objects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryRef {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Country option for the select country steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
}

/// Contract document of a contractor employment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDocument {
    pub id: String,
    #[serde(default)]
    pub status: String,
}

impl ContractDocument {
    pub fn is_signed(&self) -> bool {
        self.status == "signed"
    }
}

/// An employment as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employment {
    pub id: String,
    #[serde(default)]
    pub status: EmploymentStatus,
    #[serde(default)]
    pub employment_type: Option<EmploymentType>,
    #[serde(default)]
    pub country: Option<CountryRef>,
    #[serde(default)]
    pub basic_information: Option<Value>,
    #[serde(default)]
    pub contract_details: Option<Value>,
    #[serde(default)]
    pub pricing_plan_details: Option<Value>,
    #[serde(default)]
    pub contract_documents: Vec<ContractDocument>,
}

impl Employment {
    pub fn country_code(&self) -> Option<&str> {
        self.country.as_ref().map(|c| c.code.as_str())
    }

    /// Whether any contract document is signed
    pub fn has_signed_contract(&self) -> bool {
        self.contract_documents.iter().any(ContractDocument::is_signed)
    }

    /// Whether a section holds saved, non-empty data
    pub fn has_section(section: &Option<Value>) -> bool {
        matches!(section, Some(Value::Object(map)) if !map.is_empty())
    }
}

/// A company as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub credit_risk_status: CreditRiskStatus,
    #[serde(default)]
    pub address_details: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_deserialization() {
        let employment: Employment = serde_json::from_value(json!({
            "id": "emp-1",
            "status": "created_awaiting_reserve",
            "country": { "code": "PRT" }
        }))
        .unwrap();

        assert_eq!(employment.status, EmploymentStatus::CreatedAwaitingReserve);
        assert_eq!(employment.country_code(), Some("PRT"));
        assert!(is_onboarding_read_only(employment.status));
    }

    #[test]
    fn test_unknown_statuses_are_tolerated() {
        let employment: Employment =
            serde_json::from_value(json!({ "id": "emp-1", "status": "brand_new_status" })).unwrap();
        assert_eq!(employment.status, EmploymentStatus::Unknown);
        assert!(!is_onboarding_read_only(employment.status));

        let company: Company =
            serde_json::from_value(json!({ "id": "c-1", "credit_risk_status": "??" })).unwrap();
        assert_eq!(company.credit_risk_status, CreditRiskStatus::Unknown);
    }

    #[test]
    fn test_sections_and_signatures() {
        let employment: Employment = serde_json::from_value(json!({
            "id": "emp-1",
            "basic_information": { "name": "Ada" },
            "contract_details": {},
            "contract_documents": [{ "id": "doc-1", "status": "signed" }]
        }))
        .unwrap();

        assert!(Employment::has_section(&employment.basic_information));
        assert!(!Employment::has_section(&employment.contract_details));
        assert!(employment.has_signed_contract());
    }
}
