//! Form state of the active step.

use remoteflows_jsf::{build_form, Field, FieldValues, Form, JsfModify, SchemaDocument};
use serde_json::Value;

use crate::domain::field_error::{MutationError, NormalizedFieldError, FIELD_ERRORS_MESSAGE};
use crate::error::FlowError;

/// Values, dirty tracking and submit latch of the step being edited
#[derive(Debug, Clone)]
pub struct StepForm {
    form: Form,
    initial: FieldValues,
    values: FieldValues,
    is_submitting: bool,
}

impl StepForm {
    /// Build the form; schema defaults are overlaid with `initial`.
    pub fn new(
        schema: &SchemaDocument,
        initial: &FieldValues,
        modify: Option<&JsfModify>,
    ) -> Result<Self, FlowError> {
        let mut form = build_form(schema, initial, modify)?;

        let mut values = form.default_values();
        for (key, value) in initial {
            values.insert(key.clone(), value.clone());
        }
        form.recompute(&values);

        Ok(Self {
            form,
            initial: values.clone(),
            values,
            is_submitting: false,
        })
    }

    /// A form without fields
    pub fn empty() -> Self {
        Self {
            form: Form::default(),
            initial: FieldValues::new(),
            values: FieldValues::new(),
            is_submitting: false,
        }
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn fields(&self) -> &[Field] {
        self.form.fields()
    }

    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    /// Set one root value and re-evaluate conditionals
    pub fn set_value(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
        self.form.recompute(&self.values);
    }

    /// Overlay `values` on the current values and re-evaluate conditionals
    pub fn set_values(&mut self, values: FieldValues) {
        for (key, value) in values {
            self.values.insert(key, value);
        }
        self.form.recompute(&self.values);
    }

    /// True once any value differs from the snapshot taken when the step opened
    pub fn is_dirty(&self) -> bool {
        self.values != self.initial
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub(crate) fn begin_submit(&mut self) {
        self.is_submitting = true;
    }

    pub(crate) fn finish_submit(&mut self) {
        self.is_submitting = false;
    }

    /// Validate the current values and return them in API shape.
    pub fn checked_payload(&self) -> Result<FieldValues, FlowError> {
        let errors = self.form.validate(&self.values)?;
        if !errors.is_empty() {
            let field_errors = errors
                .into_iter()
                .map(|(path, message)| NormalizedFieldError::validation(path, message))
                .collect();
            return Err(FlowError::Validation(MutationError {
                message: FIELD_ERRORS_MESSAGE.to_string(),
                field_errors,
            }));
        }
        Ok(self.payload())
    }

    /// Current values in API shape, without validation
    pub fn payload(&self) -> FieldValues {
        let values = self.form.with_forced_values(&self.values);
        self.form.transformer().to_api_payload(&values)
    }
}
