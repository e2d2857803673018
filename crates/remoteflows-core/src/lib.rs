//!
//! RemoteFlows Core - step flows on top of the Remote API
//!
//! This crate holds the step state machine, error normalization, the API
//! traits flows depend on and the flows themselves: onboarding, contractor
//! onboarding, termination, cost calculator and company creation. Flows are
//! plain state plus async `submit`/`back` methods; rendering is up to the
//! host, which reads [`FlowBag`] snapshots and listens to [`FlowEvents`].

#![forbid(unsafe_code)]

/// Domain layer - API seams, resources and navigation rules
pub mod domain;

/// Application layer - the flows
pub mod application;

/// Error types
pub mod error;

pub use error::FlowError;

pub use domain::api::{ApiFailure, ApiResult, RemoteApi};
pub use domain::employment::{
    is_onboarding_read_only, Company, ContractDocument, Country, CreditRiskStatus, Employment,
    EmploymentStatus, EmploymentType,
};
pub use domain::field_error::{
    normalize, normalize_error, ErrorShape, FieldErrorKind, MutationError, NormalizedFieldError,
    FIELD_ERRORS_MESSAGE, GENERIC_ERROR_MESSAGE,
};
pub use domain::step_state::{FlowStep, NavigationError, Step, StepState, Transition};

pub use application::context::FlowContext;
pub use application::events::{FlowEvents, NoopEvents};
pub use application::step_form::StepForm;
pub use application::wizard::{FlowBag, ModifyOverrides};

pub use application::contractor_onboarding_flow::{
    ContractorOnboardingFlow, ContractorOnboardingOptions, ContractorOnboardingStep,
};
pub use application::cost_calculator_flow::{
    CostCalculatorFlow, CostCalculatorOptions, CostCalculatorStep, EstimationSummary,
};
pub use application::create_company_flow::{CreateCompanyFlow, CreateCompanyOptions, CreateCompanyStep};
pub use application::onboarding_flow::{InviteOutcome, OnboardingFlow, OnboardingOptions, OnboardingStep};
pub use application::termination_flow::{TerminationFlow, TerminationOptions, TerminationStep};
