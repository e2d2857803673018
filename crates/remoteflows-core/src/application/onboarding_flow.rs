//! Employee onboarding.
//!
//! Steps: select country (skipped when a country is preset), basic
//! information, contract details, benefits (optional) and review. The review
//! step invites the employee; how depends on the company's credit risk.

use remoteflows_jsf::{FieldValues, SchemaDocument};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use super::context::FlowContext;
use super::wizard::{FlowBag, FlowWizard, ModifyOverrides};
use crate::domain::api::forms;
use crate::domain::employment::{
    is_onboarding_read_only, Country, CreditRiskStatus, Employment, EmploymentStatus, EmploymentType,
};
use crate::domain::step_state::{FlowStep, NavigationError, Step, Transition};
use crate::error::FlowError;

const FLOW: &str = "onboarding";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OnboardingStep {
    SelectCountry,
    BasicInformation,
    ContractDetails,
    Benefits,
    Review,
}

impl FlowStep for OnboardingStep {
    fn name(&self) -> &'static str {
        match self {
            OnboardingStep::SelectCountry => "select_country",
            OnboardingStep::BasicInformation => "basic_information",
            OnboardingStep::ContractDetails => "contract_details",
            OnboardingStep::Benefits => "benefits",
            OnboardingStep::Review => "review",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OnboardingOptions {
    /// Company whose credit risk decides how the invite is sent
    pub company_id: Option<String>,
    /// Preset country; the select country step is skipped
    pub country_code: Option<String>,
    /// Resume an existing employment
    pub employment_id: Option<String>,
    pub include_benefits: bool,
    /// Prefilled basic information
    pub initial_values: FieldValues,
    pub modify: ModifyOverrides<OnboardingStep>,
}

impl Default for OnboardingOptions {
    fn default() -> Self {
        Self {
            company_id: None,
            country_code: None,
            employment_id: None,
            include_benefits: true,
            initial_values: FieldValues::new(),
            modify: ModifyOverrides::new(),
        }
    }
}

/// What the review step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteOutcome {
    /// The employee was invited
    Invited,
    /// A reserve invoice was created; the invite waits for the deposit
    ReserveInvoiceCreated,
}

/// Message used when the credit risk review blocks invites
pub const INVITE_BLOCKED_MESSAGE: &str =
    "The company's credit risk is under review, invites are blocked until it completes.";

pub struct OnboardingFlow {
    ctx: FlowContext,
    company_id: Option<String>,
    wizard: FlowWizard<OnboardingStep>,
    employment: Option<Employment>,
    credit_risk: CreditRiskStatus,
    invite_outcome: Option<InviteOutcome>,
}

impl OnboardingFlow {
    /// Build the step list, resume from server state if asked to and open the
    /// current step.
    #[instrument(skip_all, fields(flow = FLOW))]
    pub async fn load(ctx: FlowContext, options: OnboardingOptions) -> Result<Self, FlowError> {
        let employment = match &options.employment_id {
            Some(id) => Some(ctx.api.get_employment(id).await?),
            None => None,
        };
        let country = options
            .country_code
            .clone()
            .or_else(|| employment.as_ref().and_then(|e| e.country_code().map(str::to_string)));

        let mut steps = Vec::new();
        if country.is_none() {
            steps.push(OnboardingStep::SelectCountry);
        }
        steps.push(OnboardingStep::BasicInformation);
        steps.push(OnboardingStep::ContractDetails);
        if options.include_benefits {
            steps.push(OnboardingStep::Benefits);
        }
        steps.push(OnboardingStep::Review);

        let mut wizard = FlowWizard::new(FLOW, steps, options.modify)?;
        wizard.set_country(country.clone());
        wizard.seed(OnboardingStep::BasicInformation, options.initial_values);

        if wizard.state().contains(OnboardingStep::SelectCountry) {
            let countries = ctx.api.list_countries().await?;
            wizard.install_schema(OnboardingStep::SelectCountry, select_country_schema(&countries)?)?;
        }

        if let Some(employment) = &employment {
            seed_from_employment(&mut wizard, employment);
            let resume = resume_step(employment, wizard.state().steps());
            info!(employment_id = %employment.id, step = resume.name(), "Resuming onboarding");
            wizard.state_mut().go_to(resume)?;
        }

        let mut flow = Self {
            ctx,
            company_id: options.company_id,
            wizard,
            employment,
            credit_risk: CreditRiskStatus::Unknown,
            invite_outcome: None,
        };
        flow.refresh_credit_risk().await;
        flow.enter_step().await?;
        flow.prefetch_previous().await?;
        Ok(flow)
    }

    pub fn bag(&self) -> FlowBag<OnboardingStep> {
        self.wizard.bag()
    }

    pub fn employment(&self) -> Option<&Employment> {
        self.employment.as_ref()
    }

    pub fn credit_risk(&self) -> CreditRiskStatus {
        self.credit_risk
    }

    pub fn invite_outcome(&self) -> Option<InviteOutcome> {
        self.invite_outcome
    }

    pub fn set_value(&mut self, name: &str, value: Value) {
        self.wizard.form_mut().set_value(name, value);
    }

    /// Submit the current step and open the next one.
    #[instrument(skip_all, fields(flow = FLOW))]
    pub async fn submit(&mut self, values: FieldValues) -> Result<Transition<OnboardingStep>, FlowError> {
        let step = self.wizard.current();
        if self.wizard.state().is_completed() {
            let error = FlowError::InvalidStep("onboarding already submitted".to_string());
            return Err(self.ctx.fail(FLOW, step.name(), error));
        }

        self.wizard.form_mut().set_values(values);
        self.wizard.form_mut().begin_submit();
        let result = self.submit_step(step).await;
        self.wizard.form_mut().finish_submit();

        let committed = result.and_then(|response| Ok((self.wizard.commit()?, response)));
        let (transition, response) = match committed {
            Ok(committed) => committed,
            Err(error) => return Err(self.ctx.fail(FLOW, step.name(), error)),
        };
        self.ctx.succeed(FLOW, step.name(), &response);

        if let Transition::Advanced(next) = transition {
            if let Err(error) = self.enter_step().await {
                return Err(self.ctx.fail(FLOW, next.name.name(), error));
            }
        }
        Ok(transition)
    }

    async fn submit_step(&mut self, step: OnboardingStep) -> Result<Value, FlowError> {
        let payload = self.wizard.form().checked_payload()?;

        match step {
            OnboardingStep::SelectCountry => {
                let code = payload
                    .get("country_code")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| FlowError::InvalidStep("country_code is missing".to_string()))?;
                if self.wizard.country() != Some(code.as_str()) {
                    // country specific schemas must be fetched again
                    self.wizard.invalidate_schema(OnboardingStep::BasicInformation);
                    self.wizard.invalidate_schema(OnboardingStep::ContractDetails);
                }
                self.wizard.set_country(Some(code));
                Ok(Value::Object(payload))
            }
            OnboardingStep::BasicInformation => {
                let employment = match &self.employment {
                    Some(existing) => {
                        self.ctx
                            .api
                            .update_employment(&existing.id, &json!({ "basic_information": payload }))
                            .await?
                    }
                    None => {
                        let body = json!({
                            "basic_information": payload,
                            "country_code": self.wizard.country(),
                            "type": EmploymentType::Employee.as_str(),
                        });
                        self.ctx.api.create_employment(&body).await?
                    }
                };
                info!(employment_id = %employment.id, "Employment saved");
                self.employment = Some(employment);
                self.refresh_credit_risk().await;
                self.employment_response()
            }
            OnboardingStep::ContractDetails => {
                let id = self.employment_id()?;
                let employment = self
                    .ctx
                    .api
                    .update_employment(&id, &json!({ "contract_details": payload }))
                    .await?;
                self.employment = Some(employment);
                self.employment_response()
            }
            OnboardingStep::Benefits => {
                let id = self.employment_id()?;
                self.ctx
                    .api
                    .update_benefit_offers(&id, &Value::Object(payload.clone()))
                    .await?;
                Ok(Value::Object(payload))
            }
            OnboardingStep::Review => self.invite().await,
        }
    }

    /// Send the invite the way the company's credit risk allows.
    async fn invite(&mut self) -> Result<Value, FlowError> {
        let id = self.employment_id()?;

        let (outcome, status) = match self.credit_risk {
            CreditRiskStatus::Referred => {
                warn!(employment_id = %id, "Invite blocked by credit risk review");
                return Err(FlowError::InvalidStep(INVITE_BLOCKED_MESSAGE.to_string()));
            }
            CreditRiskStatus::DepositRequired => {
                self.ctx.api.create_reserve_invoice(&id).await?;
                (
                    InviteOutcome::ReserveInvoiceCreated,
                    EmploymentStatus::CreatedAwaitingReserve,
                )
            }
            _ => {
                self.ctx.api.invite_employment(&id).await?;
                (InviteOutcome::Invited, EmploymentStatus::Invited)
            }
        };

        if let Some(employment) = self.employment.as_mut() {
            employment.status = status;
        }
        self.invite_outcome = Some(outcome);
        info!(employment_id = %id, status = %status, "Onboarding submitted");
        Ok(json!({ "employment_id": id, "status": status }))
    }

    /// Go back one step unless the employment is read-only.
    pub fn back(&mut self) -> Result<Step<OnboardingStep>, FlowError> {
        let status = self.status();
        let result = self.wizard.back(|| read_only_guard(status));
        result.map_err(|error| self.ctx.refuse(error))
    }

    /// Jump to a step, e.g. to edit a section from the review step.
    pub async fn go_to(&mut self, step: OnboardingStep) -> Result<Step<OnboardingStep>, FlowError> {
        if let Err(error) = read_only_guard(self.status()) {
            return Err(self.ctx.refuse(error.into()));
        }
        let target = self.wizard.state_mut().go_to(step)?;
        self.enter_step().await?;
        Ok(target)
    }

    fn status(&self) -> Option<EmploymentStatus> {
        self.employment.as_ref().map(|e| e.status)
    }

    /// Load the schemas of earlier steps so a resumed flow can go back
    async fn prefetch_previous(&mut self) -> Result<(), FlowError> {
        let current = self.wizard.state().current_step().index;
        let previous = self.wizard.state().steps()[..current].to_vec();
        for step in previous {
            if self.wizard.has_schema(step) {
                continue;
            }
            if let Some(schema) = self.fetch_schema(step).await? {
                self.wizard.install_schema(step, schema)?;
            }
        }
        Ok(())
    }

    /// Fetch the current step's schema if needed and rebuild its form
    async fn enter_step(&mut self) -> Result<(), FlowError> {
        let step = self.wizard.current();
        if !self.wizard.has_schema(step) {
            if let Some(schema) = self.fetch_schema(step).await? {
                self.wizard.install_schema(step, schema)?;
                return Ok(());
            }
        }
        self.wizard.reopen()
    }

    async fn fetch_schema(&self, step: OnboardingStep) -> Result<Option<SchemaDocument>, FlowError> {
        let employment_id = self.employment.as_ref().map(|e| e.id.as_str());
        let raw = match step {
            OnboardingStep::SelectCountry | OnboardingStep::Review => return Ok(None),
            OnboardingStep::BasicInformation => {
                let country = self.require_country()?;
                self.ctx
                    .api
                    .country_form_schema(country, forms::EMPLOYMENT_BASIC_INFORMATION, employment_id)
                    .await?
            }
            OnboardingStep::ContractDetails => {
                let country = self.require_country()?;
                self.ctx
                    .api
                    .country_form_schema(country, forms::CONTRACT_DETAILS, employment_id)
                    .await?
            }
            OnboardingStep::Benefits => {
                let id = self.employment_id()?;
                self.ctx.api.benefit_offers_schema(&id).await?
            }
        };
        Ok(Some(SchemaDocument::from_value(raw)?))
    }

    async fn refresh_credit_risk(&mut self) {
        let Some(company_id) = &self.company_id else {
            return;
        };
        match self.ctx.api.get_company(company_id).await {
            Ok(company) => self.credit_risk = company.credit_risk_status,
            Err(error) => warn!(company_id = %company_id, error = %error, "Could not load credit risk"),
        }
    }

    fn require_country(&self) -> Result<&str, FlowError> {
        self.wizard
            .country()
            .ok_or_else(|| FlowError::InvalidStep("no country selected".to_string()))
    }

    fn employment_id(&self) -> Result<String, FlowError> {
        self.employment
            .as_ref()
            .map(|e| e.id.clone())
            .ok_or_else(|| FlowError::InvalidStep("basic information has not been saved".to_string()))
    }

    fn employment_response(&self) -> Result<Value, FlowError> {
        Ok(serde_json::to_value(&self.employment)?)
    }
}

fn read_only_guard(status: Option<EmploymentStatus>) -> Result<(), NavigationError> {
    match status {
        Some(status) if is_onboarding_read_only(status) => {
            Err(NavigationError::ReadOnly(status.to_string()))
        }
        _ => Ok(()),
    }
}

/// Select country schema shared by the onboarding flows
pub(crate) fn select_country_schema(
    countries: &[Country],
) -> Result<SchemaDocument, FlowError> {
    let mut country_code = json!({
        "type": "string",
        "title": "Country",
        "x-jsf-presentation": { "inputType": "countries" }
    });
    if !countries.is_empty() {
        country_code["oneOf"] = countries
            .iter()
            .map(|c| json!({ "const": c.code, "title": c.name }))
            .collect();
    }
    Ok(SchemaDocument::from_value(json!({
        "type": "object",
        "properties": { "country_code": country_code },
        "required": ["country_code"]
    }))?)
}

/// Saved sections become the initial values of their steps
fn seed_from_employment(wizard: &mut FlowWizard<OnboardingStep>, employment: &Employment) {
    let sections = [
        (OnboardingStep::BasicInformation, &employment.basic_information),
        (OnboardingStep::ContractDetails, &employment.contract_details),
    ];
    for (step, section) in sections {
        if let Some(Value::Object(values)) = section {
            wizard.seed_saved(step, values.clone());
        }
    }
}

/// Step to resume at, derived from the server reported employment
pub fn resume_step(employment: &Employment, steps: &[OnboardingStep]) -> OnboardingStep {
    let has = |step: OnboardingStep| steps.contains(&step);

    if is_onboarding_read_only(employment.status) {
        return OnboardingStep::Review;
    }
    if Employment::has_section(&employment.contract_details) {
        return if has(OnboardingStep::Benefits) {
            OnboardingStep::Benefits
        } else {
            OnboardingStep::Review
        };
    }
    if Employment::has_section(&employment.basic_information) {
        return OnboardingStep::ContractDetails;
    }
    OnboardingStep::BasicInformation
}
