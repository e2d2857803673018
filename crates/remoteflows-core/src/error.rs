use remoteflows_jsf::JsfError;
use thiserror::Error;

use crate::domain::api::ApiFailure;
use crate::domain::field_error::{normalize_error, MutationError, GENERIC_ERROR_MESSAGE};
use crate::domain::step_state::NavigationError;

/// Errors raised by flows
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    /// Credentials were rejected or unusable
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The form or the API reported field level problems
    #[error("Validation error: {0}")]
    Validation(MutationError),

    /// Network or gateway failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Back navigation refused
    #[error("Navigation error: {0}")]
    NavigationGuard(NavigationError),

    /// A schema could not be adapted
    #[error("Schema error: {0}")]
    Schema(String),

    /// The operation does not apply to the current step
    #[error("Invalid step: {0}")]
    InvalidStep(String),

    /// JSON processing failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Anything that points at a bug rather than user input
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl FlowError {
    /// Errors that are reported to telemetry in addition to `on_error`
    pub fn is_unexpected(&self) -> bool {
        matches!(
            self,
            FlowError::Schema(_) | FlowError::Serialization(_) | FlowError::Unexpected(_)
        )
    }

    /// The error as delivered to `on_error`
    pub fn to_mutation_error(&self) -> MutationError {
        match self {
            FlowError::Validation(error) => error.clone(),
            FlowError::Auth(message) | FlowError::Transport(message) => {
                MutationError::message(message.clone())
            }
            FlowError::NavigationGuard(error) => MutationError::message(error.to_string()),
            FlowError::InvalidStep(message) => MutationError::message(message.clone()),
            FlowError::Schema(_) | FlowError::Serialization(_) | FlowError::Unexpected(_) => {
                MutationError::message(GENERIC_ERROR_MESSAGE)
            }
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            FlowError::Auth(_) => "ERR_AUTH",
            FlowError::Validation(_) => "ERR_VALIDATION",
            FlowError::Transport(_) => "ERR_TRANSPORT",
            FlowError::NavigationGuard(_) => "ERR_NAVIGATION_GUARD",
            FlowError::Schema(_) => "ERR_SCHEMA",
            FlowError::InvalidStep(_) => "ERR_INVALID_STEP",
            FlowError::Serialization(_) => "ERR_SERIALIZATION",
            FlowError::Unexpected(_) => "ERR_UNEXPECTED",
        }
    }
}

impl From<ApiFailure> for FlowError {
    fn from(failure: ApiFailure) -> Self {
        match failure {
            ApiFailure::Status {
                status: 401 | 403,
                body,
            } => FlowError::Auth(normalize_error(&body).message),
            ApiFailure::Status { status, body } if status < 500 => {
                FlowError::Validation(normalize_error(&body))
            }
            ApiFailure::Status { status, body } => FlowError::Transport(format!(
                "HTTP {}: {}",
                status,
                normalize_error(&body).message
            )),
            ApiFailure::Transport(message) => FlowError::Transport(message),
            ApiFailure::Decode(message) => FlowError::Unexpected(message),
        }
    }
}

impl From<NavigationError> for FlowError {
    fn from(err: NavigationError) -> Self {
        FlowError::NavigationGuard(err)
    }
}

impl From<JsfError> for FlowError {
    fn from(err: JsfError) -> Self {
        FlowError::Schema(err.to_string())
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        FlowError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::field_error::NormalizedFieldError;
    use serde_json::json;

    #[test]
    fn test_status_mapping() {
        let auth: FlowError = ApiFailure::Status {
            status: 401,
            body: json!({ "message": "Token expired" }),
        }
        .into();
        assert_eq!(auth, FlowError::Auth("Token expired".to_string()));

        let validation: FlowError = ApiFailure::Status {
            status: 422,
            body: json!({ "errors": { "name": ["can't be blank"] } }),
        }
        .into();
        match validation {
            FlowError::Validation(error) => assert_eq!(
                error.field_errors,
                vec![NormalizedFieldError::validation("name", "can't be blank")]
            ),
            other => panic!("unexpected {:?}", other),
        }

        let server: FlowError = ApiFailure::Status {
            status: 502,
            body: json!(null),
        }
        .into();
        assert_eq!(server.error_code(), "ERR_TRANSPORT");
    }

    #[test]
    fn test_unexpected_errors_hide_details() {
        let error: FlowError = ApiFailure::Decode("missing field `id`".to_string()).into();

        assert!(error.is_unexpected());
        assert_eq!(error.to_mutation_error().message, GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_from_jsf_error() {
        let error: FlowError = JsfError::InvalidSchema("root".to_string()).into();
        assert_eq!(error, FlowError::Schema("Invalid schema: root".to_string()));
    }
}
