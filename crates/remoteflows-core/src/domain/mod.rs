/// API seams
pub mod api;

/// Cost calculator data
pub mod cost;

/// Employments and companies
pub mod employment;

/// Error normalization
pub mod field_error;

/// Step state machine
pub mod step_state;
