//! Contractor onboarding.
//!
//! Like employee onboarding, with a pricing plan choice and a contract that
//! is generated from the contract details and signed before the invite.

use remoteflows_jsf::{FieldValues, SchemaDocument};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::context::FlowContext;
use super::onboarding_flow::select_country_schema;
use super::wizard::{FlowBag, FlowWizard, ModifyOverrides};
use crate::domain::api::forms;
use crate::domain::employment::{ContractDocument, Employment, EmploymentStatus, EmploymentType};
use crate::domain::step_state::{FlowStep, NavigationError, Step, Transition};
use crate::error::FlowError;

const FLOW: &str = "contractor_onboarding";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractorOnboardingStep {
    SelectCountry,
    BasicInformation,
    PricingPlan,
    ContractDetails,
    ContractPreview,
    Review,
}

impl FlowStep for ContractorOnboardingStep {
    fn name(&self) -> &'static str {
        match self {
            ContractorOnboardingStep::SelectCountry => "select_country",
            ContractorOnboardingStep::BasicInformation => "basic_information",
            ContractorOnboardingStep::PricingPlan => "pricing_plan",
            ContractorOnboardingStep::ContractDetails => "contract_details",
            ContractorOnboardingStep::ContractPreview => "contract_preview",
            ContractorOnboardingStep::Review => "review",
        }
    }
}

/// Contractor products offered on the pricing plan step
pub const PRICING_PLANS: [(&str, &str); 3] = [
    ("standard", "Contractor Management"),
    ("plus", "Contractor Management Plus"),
    ("cor", "Contractor of Record"),
];

#[derive(Debug, Clone, Default)]
pub struct ContractorOnboardingOptions {
    pub country_code: Option<String>,
    pub employment_id: Option<String>,
    pub initial_values: FieldValues,
    pub modify: ModifyOverrides<ContractorOnboardingStep>,
}

pub struct ContractorOnboardingFlow {
    ctx: FlowContext,
    wizard: FlowWizard<ContractorOnboardingStep>,
    employment: Option<Employment>,
    contract_document: Option<ContractDocument>,
}

impl ContractorOnboardingFlow {
    #[instrument(skip_all, fields(flow = FLOW))]
    pub async fn load(
        ctx: FlowContext,
        options: ContractorOnboardingOptions,
    ) -> Result<Self, FlowError> {
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
            steps.push(ContractorOnboardingStep::SelectCountry);
        }
        steps.extend([
            ContractorOnboardingStep::BasicInformation,
            ContractorOnboardingStep::PricingPlan,
            ContractorOnboardingStep::ContractDetails,
            ContractorOnboardingStep::ContractPreview,
            ContractorOnboardingStep::Review,
        ]);

        let mut wizard = FlowWizard::new(FLOW, steps, options.modify)?;
        wizard.set_country(country);
        wizard.seed(ContractorOnboardingStep::BasicInformation, options.initial_values);
        wizard.install_schema(ContractorOnboardingStep::PricingPlan, pricing_plan_schema()?)?;
        wizard.install_schema(ContractorOnboardingStep::ContractPreview, contract_preview_schema()?)?;

        if wizard.state().contains(ContractorOnboardingStep::SelectCountry) {
            let countries = ctx.api.list_countries().await?;
            wizard.install_schema(
                ContractorOnboardingStep::SelectCountry,
                select_country_schema(&countries)?,
            )?;
        }

        let contract_document = employment
            .as_ref()
            .and_then(|e| e.contract_documents.last().cloned());

        if let Some(employment) = &employment {
            seed_from_employment(&mut wizard, employment);
            let resume = resume_step(employment);
            info!(employment_id = %employment.id, step = resume.name(), "Resuming contractor onboarding");
            wizard.state_mut().go_to(resume)?;
        }

        let mut flow = Self {
            ctx,
            wizard,
            employment,
            contract_document,
        };
        flow.enter_step().await?;
        flow.prefetch_previous().await?;
        Ok(flow)
    }

    pub fn bag(&self) -> FlowBag<ContractorOnboardingStep> {
        self.wizard.bag()
    }

    pub fn employment(&self) -> Option<&Employment> {
        self.employment.as_ref()
    }

    /// Contract generated from the contract details, once there is one
    pub fn contract_document(&self) -> Option<&ContractDocument> {
        self.contract_document.as_ref()
    }

    pub fn set_value(&mut self, name: &str, value: Value) {
        self.wizard.form_mut().set_value(name, value);
    }

    #[instrument(skip_all, fields(flow = FLOW))]
    pub async fn submit(
        &mut self,
        values: FieldValues,
    ) -> Result<Transition<ContractorOnboardingStep>, FlowError> {
        let step = self.wizard.current();
        if self.wizard.state().is_completed() {
            let error = FlowError::InvalidStep("contractor already invited".to_string());
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

    async fn submit_step(&mut self, step: ContractorOnboardingStep) -> Result<Value, FlowError> {
        let payload = self.wizard.form().checked_payload()?;

        match step {
            ContractorOnboardingStep::SelectCountry => {
                let code = payload
                    .get("country_code")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| FlowError::InvalidStep("country_code is missing".to_string()))?;
                if self.wizard.country() != Some(code.as_str()) {
                    self.wizard.invalidate_schema(ContractorOnboardingStep::BasicInformation);
                    self.wizard.invalidate_schema(ContractorOnboardingStep::ContractDetails);
                }
                self.wizard.set_country(Some(code));
                Ok(Value::Object(payload))
            }
            ContractorOnboardingStep::BasicInformation => {
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
                            "type": EmploymentType::Contractor.as_str(),
                        });
                        self.ctx.api.create_employment(&body).await?
                    }
                };
                info!(employment_id = %employment.id, "Contractor employment saved");
                self.employment = Some(employment);
                Ok(serde_json::to_value(&self.employment)?)
            }
            ContractorOnboardingStep::PricingPlan => {
                let id = self.employment_id()?;
                let body = Value::Object(payload);
                self.ctx.api.update_pricing_plan(&id, &body).await?;
                Ok(body)
            }
            ContractorOnboardingStep::ContractDetails => {
                let id = self.employment_id()?;
                let employment = self
                    .ctx
                    .api
                    .update_employment(&id, &json!({ "contract_details": payload }))
                    .await?;
                self.employment = Some(employment);

                let document = self
                    .ctx
                    .api
                    .create_contract_document(&id, &json!({ "contract_document": payload }))
                    .await?;
                info!(employment_id = %id, document_id = %document.id, "Contract document created");
                self.contract_document = Some(document);
                Ok(serde_json::to_value(&self.contract_document)?)
            }
            ContractorOnboardingStep::ContractPreview => {
                let id = self.employment_id()?;
                let document_id = self
                    .contract_document
                    .as_ref()
                    .map(|d| d.id.clone())
                    .ok_or_else(|| FlowError::InvalidStep("no contract document to sign".to_string()))?;
                let signature = payload.get("signature").cloned().unwrap_or(Value::Null);
                self.ctx
                    .api
                    .sign_contract_document(&id, &document_id, &json!({ "signature": signature }))
                    .await?;

                if let Some(document) = self.contract_document.as_mut() {
                    document.status = "signed".to_string();
                }
                if let (Some(employment), Some(document)) =
                    (self.employment.as_mut(), self.contract_document.as_ref())
                {
                    employment.contract_documents.retain(|d| d.id != document.id);
                    employment.contract_documents.push(document.clone());
                }
                Ok(json!({ "contract_document_id": document_id, "status": "signed" }))
            }
            ContractorOnboardingStep::Review => {
                let id = self.employment_id()?;
                self.ctx.api.invite_employment(&id).await?;
                if let Some(employment) = self.employment.as_mut() {
                    employment.status = EmploymentStatus::Invited;
                }
                info!(employment_id = %id, "Contractor invited");
                Ok(json!({ "employment_id": id, "status": EmploymentStatus::Invited }))
            }
        }
    }

    /// Go back one step; locked once invited or once the contract is signed.
    pub fn back(&mut self) -> Result<Step<ContractorOnboardingStep>, FlowError> {
        let locked = self.lock_reason();
        let result = self.wizard.back(|| match locked {
            Some(reason) => Err(NavigationError::ReadOnly(reason)),
            None => Ok(()),
        });
        result.map_err(|error| self.ctx.refuse(error))
    }

    /// Jump to a step, e.g. to edit the contract details from the preview.
    pub async fn go_to(
        &mut self,
        step: ContractorOnboardingStep,
    ) -> Result<Step<ContractorOnboardingStep>, FlowError> {
        if let Some(reason) = self.lock_reason() {
            return Err(self.ctx.refuse(NavigationError::ReadOnly(reason).into()));
        }
        let target = self.wizard.state_mut().go_to(step)?;
        self.enter_step().await?;
        Ok(target)
    }

    fn lock_reason(&self) -> Option<String> {
        let employment = self.employment.as_ref()?;
        if employment.status == EmploymentStatus::Invited {
            return Some(employment.status.to_string());
        }
        let signed = employment.has_signed_contract()
            || self.contract_document.as_ref().is_some_and(ContractDocument::is_signed);
        signed.then(|| "contract signed".to_string())
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

    async fn fetch_schema(
        &self,
        step: ContractorOnboardingStep,
    ) -> Result<Option<SchemaDocument>, FlowError> {
        let form = match step {
            ContractorOnboardingStep::BasicInformation => forms::CONTRACTOR_BASIC_INFORMATION,
            ContractorOnboardingStep::ContractDetails => forms::CONTRACTOR_CONTRACT_DETAILS,
            _ => return Ok(None),
        };
        let country = self
            .wizard
            .country()
            .ok_or_else(|| FlowError::InvalidStep("no country selected".to_string()))?;
        let employment_id = self.employment.as_ref().map(|e| e.id.as_str());
        let raw = self
            .ctx
            .api
            .country_form_schema(country, form, employment_id)
            .await?;
        Ok(Some(SchemaDocument::from_value(raw)?))
    }

    fn employment_id(&self) -> Result<String, FlowError> {
        self.employment
            .as_ref()
            .map(|e| e.id.clone())
            .ok_or_else(|| FlowError::InvalidStep("basic information has not been saved".to_string()))
    }
}

fn pricing_plan_schema() -> Result<SchemaDocument, FlowError> {
    let options: Vec<Value> = PRICING_PLANS
        .iter()
        .map(|(slug, title)| json!({ "const": slug, "title": title }))
        .collect();
    Ok(SchemaDocument::from_value(json!({
        "type": "object",
        "properties": {
            "pricing_plan": {
                "type": "string",
                "title": "Pricing plan",
                "oneOf": options,
                "x-jsf-presentation": { "inputType": "radio" }
            }
        },
        "required": ["pricing_plan"]
    }))?)
}

fn contract_preview_schema() -> Result<SchemaDocument, FlowError> {
    Ok(SchemaDocument::from_value(json!({
        "type": "object",
        "properties": {
            "signature": {
                "type": "string",
                "title": "Full name",
                "description": "Type your full name to sign the contract",
                "minLength": 1
            },
            "review_completed": {
                "type": "boolean",
                "title": "I have reviewed the contract",
                "const": true,
                "x-jsf-presentation": { "inputType": "checkbox" }
            }
        },
        "required": ["signature", "review_completed"],
        "x-jsf-order": ["review_completed", "signature"]
    }))?)
}

fn seed_from_employment(wizard: &mut FlowWizard<ContractorOnboardingStep>, employment: &Employment) {
    let sections = [
        (ContractorOnboardingStep::BasicInformation, &employment.basic_information),
        (ContractorOnboardingStep::PricingPlan, &employment.pricing_plan_details),
        (ContractorOnboardingStep::ContractDetails, &employment.contract_details),
    ];
    for (step, section) in sections {
        if let Some(Value::Object(values)) = section {
            wizard.seed_saved(step, values.clone());
        }
    }
}

/// Step to resume at, derived from the server reported employment
pub fn resume_step(employment: &Employment) -> ContractorOnboardingStep {
    if employment.status == EmploymentStatus::Invited || employment.has_signed_contract() {
        return ContractorOnboardingStep::Review;
    }
    if !employment.contract_documents.is_empty() {
        return ContractorOnboardingStep::ContractPreview;
    }
    if Employment::has_section(&employment.pricing_plan_details) {
        return ContractorOnboardingStep::ContractDetails;
    }
    if Employment::has_section(&employment.basic_information) {
        return ContractorOnboardingStep::PricingPlan;
    }
    ContractorOnboardingStep::BasicInformation
}

#[cfg(test)]
mod tests {
    use super::*;
    use remoteflows_jsf::build_form;

    fn employment(value: Value) -> Employment {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_resume_step() {
        let cases = [
            (json!({ "id": "c" }), ContractorOnboardingStep::BasicInformation),
            (
                json!({ "id": "c", "basic_information": { "name": "Ada" } }),
                ContractorOnboardingStep::PricingPlan,
            ),
            (
                json!({ "id": "c", "basic_information": { "name": "Ada" }, "pricing_plan_details": { "pricing_plan": "plus" } }),
                ContractorOnboardingStep::ContractDetails,
            ),
            (
                json!({ "id": "c", "contract_documents": [{ "id": "d", "status": "awaiting_signature" }] }),
                ContractorOnboardingStep::ContractPreview,
            ),
            (
                json!({ "id": "c", "contract_documents": [{ "id": "d", "status": "signed" }] }),
                ContractorOnboardingStep::Review,
            ),
            (json!({ "id": "c", "status": "invited" }), ContractorOnboardingStep::Review),
        ];

        for (value, expected) in cases {
            assert_eq!(resume_step(&employment(value.clone())), expected, "{}", value);
        }
    }

    #[test]
    fn test_contract_preview_requires_signature() {
        let form = build_form(&contract_preview_schema().unwrap(), &FieldValues::new(), None).unwrap();
        let errors = form.validate(&FieldValues::new()).unwrap();

        assert!(errors.contains_key("signature"));
        assert!(errors.contains_key("review_completed"));
    }

    #[test]
    fn test_pricing_plan_options() {
        let form = build_form(&pricing_plan_schema().unwrap(), &FieldValues::new(), None).unwrap();
        let field = form.field("pricing_plan").unwrap();

        assert_eq!(field.options.len(), PRICING_PLANS.len());
        assert!(field.required);
    }
}
