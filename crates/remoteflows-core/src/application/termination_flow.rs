//! Termination: four local section schemas, one offboarding request at the end.

use remoteflows_jsf::{build_form, FieldValues, SchemaDocument};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::context::FlowContext;
use super::wizard::{FlowBag, FlowWizard, ModifyOverrides};
use crate::domain::employment::{is_onboarding_read_only, EmploymentStatus};
use crate::domain::step_state::{FlowStep, NavigationError, Step, Transition};
use crate::error::FlowError;

const FLOW: &str = "termination";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationStep {
    EmployeeCommunication,
    TerminationDetails,
    PaidTimeOff,
    AdditionalInformation,
}

impl TerminationStep {
    pub const ALL: [TerminationStep; 4] = [
        TerminationStep::EmployeeCommunication,
        TerminationStep::TerminationDetails,
        TerminationStep::PaidTimeOff,
        TerminationStep::AdditionalInformation,
    ];

    fn raw_schema(&self) -> &'static str {
        match self {
            TerminationStep::EmployeeCommunication => {
                include_str!("../../schemas/termination/employee_communication.json")
            }
            TerminationStep::TerminationDetails => {
                include_str!("../../schemas/termination/termination_details.json")
            }
            TerminationStep::PaidTimeOff => include_str!("../../schemas/termination/paid_time_off.json"),
            TerminationStep::AdditionalInformation => {
                include_str!("../../schemas/termination/additional_information.json")
            }
        }
    }

    /// The bundled section schema
    pub fn schema(&self) -> Result<SchemaDocument, FlowError> {
        let value: Value = serde_json::from_str(self.raw_schema())?;
        Ok(SchemaDocument::from_value(value)?)
    }
}

impl FlowStep for TerminationStep {
    fn name(&self) -> &'static str {
        match self {
            TerminationStep::EmployeeCommunication => "employee_communication",
            TerminationStep::TerminationDetails => "termination_details",
            TerminationStep::PaidTimeOff => "paid_time_off",
            TerminationStep::AdditionalInformation => "additional_information",
        }
    }
}

/// All four sections concatenated in step order
pub fn termination_schema() -> Result<SchemaDocument, FlowError> {
    let parts = TerminationStep::ALL
        .iter()
        .map(TerminationStep::schema)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SchemaDocument::concat(&parts))
}

#[derive(Debug, Clone, Default)]
pub struct TerminationOptions {
    /// Values prefilled across all sections
    pub initial_values: FieldValues,
    pub modify: ModifyOverrides<TerminationStep>,
}

pub struct TerminationFlow {
    ctx: FlowContext,
    employment_id: String,
    employment_status: EmploymentStatus,
    wizard: FlowWizard<TerminationStep>,
}

impl TerminationFlow {
    /// Load the employment and open the first section
    #[instrument(skip(ctx, options), fields(flow = FLOW))]
    pub async fn load(
        ctx: FlowContext,
        employment_id: &str,
        options: TerminationOptions,
    ) -> Result<Self, FlowError> {
        let employment = ctx.api.get_employment(employment_id).await?;

        let mut wizard = FlowWizard::new(FLOW, TerminationStep::ALL.to_vec(), options.modify)?;
        for step in TerminationStep::ALL {
            wizard.seed(step, options.initial_values.clone());
            wizard.install_schema(step, step.schema()?)?;
        }

        Ok(Self {
            ctx,
            employment_id: employment.id,
            employment_status: employment.status,
            wizard,
        })
    }

    pub fn bag(&self) -> FlowBag<TerminationStep> {
        self.wizard.bag()
    }

    pub fn employment_status(&self) -> EmploymentStatus {
        self.employment_status
    }

    pub fn set_value(&mut self, name: &str, value: Value) {
        self.wizard.form_mut().set_value(name, value);
    }

    /// Submit the current section; the last one creates the offboarding.
    #[instrument(skip_all, fields(flow = FLOW))]
    pub async fn submit(&mut self, values: FieldValues) -> Result<Transition<TerminationStep>, FlowError> {
        let step = self.wizard.current();
        if self.wizard.state().is_completed() {
            let error = FlowError::InvalidStep("offboarding already requested".to_string());
            return Err(self.ctx.fail(FLOW, step.name(), error));
        }

        self.wizard.form_mut().set_values(values);
        self.wizard.form_mut().begin_submit();
        let result = self.submit_step(step).await;
        self.wizard.form_mut().finish_submit();

        let advanced = result.and_then(|response| {
            let transition = self.wizard.commit()?;
            if let Transition::Advanced(_) = transition {
                self.wizard.reopen()?;
            }
            Ok((transition, response))
        });

        match advanced {
            Ok((transition, response)) => {
                self.ctx.succeed(FLOW, step.name(), &response);
                Ok(transition)
            }
            Err(error) => Err(self.ctx.fail(FLOW, step.name(), error)),
        }
    }

    async fn submit_step(&self, step: TerminationStep) -> Result<Value, FlowError> {
        let section = self.wizard.form().checked_payload()?;
        if step != TerminationStep::AdditionalInformation {
            return Ok(Value::Object(section));
        }

        let mut values = self.wizard.state().merged_values();
        for (key, value) in self.wizard.form().values() {
            values.insert(key.clone(), value.clone());
        }

        let form = build_form(&termination_schema()?, &values, None)?;
        let details = form.transformer().to_api_payload(&form.with_forced_values(&values));
        let payload = json!({
            "employment_id": self.employment_id,
            "type": "termination",
            "termination_details": details,
        });

        let response = self.ctx.api.create_offboarding(&payload).await?;
        info!(employment_id = %self.employment_id, "Offboarding requested");
        Ok(response)
    }

    /// Go back one section unless the employment is locked.
    pub fn back(&mut self) -> Result<Step<TerminationStep>, FlowError> {
        let status = self.employment_status;
        let result = self.wizard.back(|| {
            if is_onboarding_read_only(status) {
                Err(NavigationError::ReadOnly(status.to_string()))
            } else {
                Ok(())
            }
        });

        result.map_err(|error| self.ctx.refuse(error))
    }
}
