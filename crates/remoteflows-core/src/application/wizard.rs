//! Step state, per-step schemas and the active form, bundled for flows.

use remoteflows_jsf::{build_form, Field, FieldValues, JsfModify, SchemaDocument};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::step_form::StepForm;
use crate::domain::step_state::{FlowStep, NavigationError, Step, StepState, Transition};
use crate::error::FlowError;

/// Plain data snapshot of a flow for presentation layers
#[derive(Debug, Clone, PartialEq)]
pub struct FlowBag<S> {
    pub flow: &'static str,
    pub step: Step<S>,
    pub step_name: &'static str,
    pub step_count: usize,
    pub fields: Vec<Field>,
    pub values: FieldValues,
    pub warnings: Vec<String>,
    pub is_dirty: bool,
    pub is_submitting: bool,
    pub is_first_step: bool,
    pub is_last_step: bool,
    pub is_completed: bool,
}

/// Schema patches for one flow: per step, and per country and step
#[derive(Debug, Clone)]
pub struct ModifyOverrides<S: FlowStep> {
    steps: HashMap<S, JsfModify>,
    countries: HashMap<(String, S), JsfModify>,
}

impl<S: FlowStep> Default for ModifyOverrides<S> {
    fn default() -> Self {
        Self {
            steps: HashMap::new(),
            countries: HashMap::new(),
        }
    }
}

impl<S: FlowStep> ModifyOverrides<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch applied to `step` in every country
    pub fn for_step(mut self, step: S, patch: JsfModify) -> Self {
        self.steps.insert(step, patch);
        self
    }

    /// Patch applied to `step` for one country, on top of the step patch
    pub fn for_country(mut self, country_code: impl Into<String>, step: S, patch: JsfModify) -> Self {
        self.countries.insert((country_code.into(), step), patch);
        self
    }

    /// Effective patch for `step` in `country_code`
    pub fn resolve(&self, step: S, country_code: Option<&str>) -> Option<JsfModify> {
        let base = self.steps.get(&step);
        let country = country_code.and_then(|code| self.countries.get(&(code.to_string(), step)));
        match (base, country) {
            (Some(base), Some(country)) => Some(base.merge(country)),
            (Some(only), None) | (None, Some(only)) => Some(only.clone()),
            (None, None) => None,
        }
    }
}

/// The moving parts every flow shares
#[derive(Debug, Clone)]
pub struct FlowWizard<S: FlowStep> {
    flow: &'static str,
    state: StepState<S>,
    schemas: HashMap<S, SchemaDocument>,
    seeds: HashMap<S, FieldValues>,
    saved: HashMap<S, FieldValues>,
    overrides: ModifyOverrides<S>,
    country_code: Option<String>,
    form: StepForm,
}

impl<S: FlowStep> FlowWizard<S> {
    pub fn new(flow: &'static str, steps: Vec<S>, overrides: ModifyOverrides<S>) -> Result<Self, FlowError> {
        Ok(Self {
            flow,
            state: StepState::new(steps)?,
            schemas: HashMap::new(),
            seeds: HashMap::new(),
            saved: HashMap::new(),
            overrides,
            country_code: None,
            form: StepForm::empty(),
        })
    }

    pub fn flow(&self) -> &'static str {
        self.flow
    }

    pub fn state(&self) -> &StepState<S> {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut StepState<S> {
        &mut self.state
    }

    pub fn current(&self) -> S {
        self.state.current_step().name
    }

    pub fn form(&self) -> &StepForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut StepForm {
        &mut self.form
    }

    /// Country used to resolve per-country patches
    pub fn set_country(&mut self, country_code: Option<String>) {
        self.country_code = country_code;
    }

    pub fn country(&self) -> Option<&str> {
        self.country_code.as_deref()
    }

    /// Initial values for a step that has not been captured yet
    pub fn seed(&mut self, step: S, values: FieldValues) {
        self.seeds.insert(step, values);
    }

    /// Server-side section for a step, in API shape (money in minor units)
    pub fn seed_saved(&mut self, step: S, payload: FieldValues) {
        self.saved.insert(step, payload);
    }

    pub fn has_schema(&self, step: S) -> bool {
        self.schemas.contains_key(&step)
    }

    pub fn schema(&self, step: S) -> Option<&SchemaDocument> {
        self.schemas.get(&step)
    }

    /// Cache the schema of `step` and rebuild the form if it is current
    pub fn install_schema(&mut self, step: S, schema: SchemaDocument) -> Result<(), FlowError> {
        self.schemas.insert(step, schema);
        if self.current() == step {
            self.reopen()?;
        }
        Ok(())
    }

    /// Forget a cached schema so it is fetched again on the next visit
    pub fn invalidate_schema(&mut self, step: S) {
        self.schemas.remove(&step);
    }

    /// Rebuild the form of the current step from cache, seeds and captured values
    pub fn reopen(&mut self) -> Result<(), FlowError> {
        let step = self.current();
        let schema = self
            .schemas
            .get(&step)
            .cloned()
            .unwrap_or_else(SchemaDocument::empty);

        let mut initial = match self.saved.get(&step) {
            Some(saved) => build_form(&schema, &FieldValues::new(), None)?
                .transformer()
                .from_api_payload(saved),
            None => FieldValues::new(),
        };
        if let Some(seed) = self.seeds.get(&step) {
            for (key, value) in seed {
                initial.insert(key.clone(), value.clone());
            }
        }
        if let Some(captured) = self.state.values_for(step) {
            for (key, value) in captured {
                initial.insert(key.clone(), value.clone());
            }
        }

        let modify = self.overrides.resolve(step, self.country_code.as_deref());
        self.form = StepForm::new(&schema, &initial, modify.as_ref())?;
        debug!(flow = self.flow, step = step.name(), "Opened step");
        Ok(())
    }

    /// Capture the form values and advance; the caller opens the next step.
    pub fn commit(&mut self) -> Result<Transition<S>, FlowError> {
        let values = self.form.values().clone();
        Ok(self.state.next(values)?)
    }

    /// Guarded back navigation; the previous step's form is rebuilt.
    ///
    /// When the rebuild fails the flow stays on the step it was on.
    pub fn back<F>(&mut self, guard: F) -> Result<Step<S>, FlowError>
    where
        F: FnOnce() -> Result<(), NavigationError>,
    {
        let from = self.current();
        let step = self.state.back_guarded(guard)?;
        if let Err(error) = self.reopen() {
            warn!(flow = self.flow, error = %error, "Rebuilding previous step failed");
            self.state.go_to(from)?;
            return Err(error);
        }
        Ok(step)
    }

    /// Jump to `step` and rebuild its form
    pub fn go_to(&mut self, step: S) -> Result<Step<S>, FlowError> {
        let target = self.state.go_to(step)?;
        self.reopen()?;
        Ok(target)
    }

    /// Snapshot for presentation
    pub fn bag(&self) -> FlowBag<S> {
        let step = self.state.current_step();
        FlowBag {
            flow: self.flow,
            step,
            step_name: step.name.name(),
            step_count: self.state.step_count(),
            fields: self.form.fields().to_vec(),
            values: self.form.values().clone(),
            warnings: self.form.form().meta().warnings.clone(),
            is_dirty: self.form.is_dirty(),
            is_submitting: self.form.is_submitting(),
            is_first_step: self.state.is_first(),
            is_last_step: self.state.is_last(),
            is_completed: self.state.is_completed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remoteflows_jsf::FieldPatch;
    use serde_json::json;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Demo {
        Details,
        Review,
    }

    impl FlowStep for Demo {
        fn name(&self) -> &'static str {
            match self {
                Demo::Details => "details",
                Demo::Review => "review",
            }
        }
    }

    fn schema() -> SchemaDocument {
        SchemaDocument::from_value(json!({
            "properties": { "name": { "type": "string", "title": "Name" } },
            "required": ["name"]
        }))
        .unwrap()
    }

    fn titled(title: &str) -> JsfModify {
        JsfModify::new().with_field(
            "name",
            FieldPatch {
                title: Some(title.to_string()),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_country_patch_wins() {
        let overrides = ModifyOverrides::new()
            .for_step(Demo::Details, titled("Step"))
            .for_country("PRT", Demo::Details, titled("Country"));
        let mut wizard = FlowWizard::new("demo", vec![Demo::Details, Demo::Review], overrides).unwrap();

        wizard.install_schema(Demo::Details, schema()).unwrap();
        assert_eq!(wizard.form().fields()[0].label, "Step");

        wizard.set_country(Some("PRT".to_string()));
        wizard.reopen().unwrap();
        assert_eq!(wizard.form().fields()[0].label, "Country");
    }

    #[test]
    fn test_back_restores_captured_values() {
        let mut wizard =
            FlowWizard::new("demo", vec![Demo::Details, Demo::Review], ModifyOverrides::new()).unwrap();
        wizard.install_schema(Demo::Details, schema()).unwrap();
        wizard.form_mut().set_value("name", json!("Ada"));

        wizard.commit().unwrap();
        wizard.reopen().unwrap();
        assert_eq!(wizard.bag().step_name, "review");

        wizard.back(|| Ok(())).unwrap();
        let bag = wizard.bag();
        assert_eq!(bag.step_name, "details");
        assert_eq!(bag.values["name"], "Ada");
        assert!(!bag.is_dirty);
    }

    #[test]
    fn test_failed_rebuild_keeps_the_current_step() {
        let broken = JsfModify::new().with_field("name..first", FieldPatch::default());
        let overrides = ModifyOverrides::new().for_step(Demo::Details, broken);
        let mut wizard = FlowWizard::new("demo", vec![Demo::Details, Demo::Review], overrides).unwrap();
        wizard.commit().unwrap();
        wizard.reopen().unwrap();

        let error = wizard.back(|| Ok(())).unwrap_err();

        assert_eq!(error.error_code(), "ERR_SCHEMA");
        assert_eq!(wizard.bag().step_name, "review");
        assert!(!wizard.bag().is_first_step);
    }

    #[test]
    fn test_saved_sections_open_in_major_units() {
        let schema = SchemaDocument::from_value(json!({
            "properties": {
                "salary": { "type": "integer", "x-jsf-presentation": { "inputType": "money" } },
                "title": { "type": "string" }
            }
        }))
        .unwrap();
        let mut wizard =
            FlowWizard::new("demo", vec![Demo::Details, Demo::Review], ModifyOverrides::new()).unwrap();
        wizard.seed_saved(
            Demo::Details,
            serde_json::from_value(json!({ "salary": 4500000, "title": "Engineer" })).unwrap(),
        );
        wizard.seed(
            Demo::Details,
            serde_json::from_value(json!({ "title": "Lead" })).unwrap(),
        );

        wizard.install_schema(Demo::Details, schema).unwrap();

        let values = wizard.form().values();
        assert_eq!(values["salary"], 45000);
        assert_eq!(values["title"], "Lead");
    }
}
