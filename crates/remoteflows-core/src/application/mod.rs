/// Shared flow collaborators
pub mod context;

/// Host callbacks
pub mod events;

/// Form state of the current step
pub mod step_form;

/// Step state, schemas and form bundled together
pub mod wizard;

pub mod contractor_onboarding_flow;
pub mod cost_calculator_flow;
pub mod create_company_flow;
pub mod onboarding_flow;
pub mod termination_flow;
