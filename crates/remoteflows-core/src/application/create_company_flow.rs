//! Company creation: basic information, then the country's address form.

use chrono::{DateTime, Utc};
use remoteflows_jsf::{FieldValues, SchemaDocument};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::context::FlowContext;
use super::wizard::{FlowBag, FlowWizard, ModifyOverrides};
use crate::domain::api::forms;
use crate::domain::employment::{Company, Country};
use crate::domain::step_state::{FlowStep, Step, Transition};
use crate::error::FlowError;

const FLOW: &str = "create_company";

/// Local field that is turned into `terms_of_service_accepted_at`
const TERMS_OF_SERVICE: &str = "terms_of_service";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreateCompanyStep {
    CompanyBasicInformation,
    AddressDetails,
}

impl FlowStep for CreateCompanyStep {
    fn name(&self) -> &'static str {
        match self {
            CreateCompanyStep::CompanyBasicInformation => "company_basic_information",
            CreateCompanyStep::AddressDetails => "address_details",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateCompanyOptions {
    pub initial_values: FieldValues,
    pub modify: ModifyOverrides<CreateCompanyStep>,
}

pub struct CreateCompanyFlow {
    ctx: FlowContext,
    wizard: FlowWizard<CreateCompanyStep>,
    company: Option<Company>,
}

impl CreateCompanyFlow {
    #[instrument(skip_all, fields(flow = FLOW))]
    pub async fn load(ctx: FlowContext, options: CreateCompanyOptions) -> Result<Self, FlowError> {
        let countries = ctx.api.list_countries().await?;

        let mut wizard = FlowWizard::new(
            FLOW,
            vec![
                CreateCompanyStep::CompanyBasicInformation,
                CreateCompanyStep::AddressDetails,
            ],
            options.modify,
        )?;
        wizard.seed(CreateCompanyStep::CompanyBasicInformation, options.initial_values);
        wizard.install_schema(
            CreateCompanyStep::CompanyBasicInformation,
            basic_information_schema(&countries)?,
        )?;

        Ok(Self {
            ctx,
            wizard,
            company: None,
        })
    }

    pub fn bag(&self) -> FlowBag<CreateCompanyStep> {
        self.wizard.bag()
    }

    pub fn company(&self) -> Option<&Company> {
        self.company.as_ref()
    }

    pub fn set_value(&mut self, name: &str, value: Value) {
        self.wizard.form_mut().set_value(name, value);
    }

    #[instrument(skip_all, fields(flow = FLOW))]
    pub async fn submit(&mut self, values: FieldValues) -> Result<Transition<CreateCompanyStep>, FlowError> {
        let step = self.wizard.current();
        if self.wizard.state().is_completed() {
            let error = FlowError::InvalidStep("company already created".to_string());
            return Err(self.ctx.fail(FLOW, step.name(), error));
        }

        self.wizard.form_mut().set_values(values);
        self.wizard.form_mut().begin_submit();
        let result = self.submit_step(step, Utc::now()).await;
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

    async fn submit_step(&mut self, step: CreateCompanyStep, now: DateTime<Utc>) -> Result<Value, FlowError> {
        let payload = self.wizard.form().checked_payload()?;

        let company = match step {
            CreateCompanyStep::CompanyBasicInformation => {
                let body = company_payload(payload, now);
                match &self.company {
                    Some(existing) => self.ctx.api.update_company(&existing.id, &body).await?,
                    None => self.ctx.api.create_company(&body).await?,
                }
            }
            CreateCompanyStep::AddressDetails => {
                let id = self
                    .company
                    .as_ref()
                    .map(|c| c.id.clone())
                    .ok_or_else(|| FlowError::InvalidStep("company has not been created".to_string()))?;
                self.ctx
                    .api
                    .update_company(&id, &json!({ "address_details": payload }))
                    .await?
            }
        };

        info!(company_id = %company.id, step = step.name(), "Company saved");
        if self.wizard.country() != company.country_code.as_deref() {
            self.wizard.invalidate_schema(CreateCompanyStep::AddressDetails);
            self.wizard.set_country(company.country_code.clone());
        }
        self.company = Some(company);
        Ok(serde_json::to_value(&self.company)?)
    }

    /// Go back one step; no status locks this flow.
    pub fn back(&mut self) -> Result<Step<CreateCompanyStep>, FlowError> {
        let result = self.wizard.back(|| Ok(()));
        result.map_err(|error| self.ctx.refuse(error))
    }

    async fn enter_step(&mut self) -> Result<(), FlowError> {
        let step = self.wizard.current();
        if step == CreateCompanyStep::AddressDetails && !self.wizard.has_schema(step) {
            let country = self
                .wizard
                .country()
                .ok_or_else(|| FlowError::InvalidStep("company has no country".to_string()))?;
            let raw = self
                .ctx
                .api
                .company_schema(forms::COMPANY_ADDRESS_DETAILS, country)
                .await?;
            return self.wizard.install_schema(step, SchemaDocument::from_value(raw)?);
        }
        self.wizard.reopen()
    }
}

/// Request body for the basic information step; the accepted terms become a timestamp
fn company_payload(mut values: FieldValues, now: DateTime<Utc>) -> Value {
    if values.remove(TERMS_OF_SERVICE) == Some(Value::Bool(true)) {
        values.insert(
            "terms_of_service_accepted_at".to_string(),
            Value::String(now.to_rfc3339()),
        );
    }
    Value::Object(values)
}

fn basic_information_schema(countries: &[Country]) -> Result<SchemaDocument, FlowError> {
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
        "properties": {
            "name": { "type": "string", "title": "Company name", "minLength": 1 },
            "country_code": country_code,
            "tax_number": { "type": "string", "title": "Tax number" },
            "desired_currency": {
                "type": "string",
                "title": "Desired currency",
                "pattern": "^[A-Z]{3}$"
            },
            "phone_number": { "type": "string", "title": "Phone number" },
            TERMS_OF_SERVICE: {
                "type": "boolean",
                "title": "I accept the terms of service",
                "const": true,
                "x-jsf-presentation": { "inputType": "checkbox" }
            }
        },
        "required": ["name", "country_code", TERMS_OF_SERVICE]
    }))?)
}
