use remoteflows_core::ApiFailure;
use serde_json::Value;
use thiserror::Error;

/// Credential provider failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    /// The provider could not produce a token
    #[error("Credential provider error: {0}")]
    Provider(String),

    /// The provider returned something unusable
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Errors raised by the HTTP client
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// The underlying HTTP client could not be built
    #[error("Client build error: {0}")]
    Build(String),

    /// The request failed before a response arrived
    #[error("Request error: {0}")]
    Request(String),

    /// The gateway answered with a non-success status
    #[error("HTTP status {status}")]
    Status { status: u16, body: Value },

    /// A response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

impl ClientError {
    /// HTTP status for status errors
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Error code for logs
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Build(_) => "CLIENT_BUILD_ERROR",
            ClientError::Request(_) => "REQUEST_ERROR",
            ClientError::Status { .. } => "HTTP_STATUS_ERROR",
            ClientError::Decode(_) => "DECODE_ERROR",
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ClientError::Request(format!("Request timeout: {}", error))
        } else if error.is_connect() {
            ClientError::Request(format!("Connection error: {}", error))
        } else if error.is_decode() {
            ClientError::Decode(error.to_string())
        } else {
            ClientError::Request(format!("HTTP error: {}", error))
        }
    }
}

impl From<ClientError> for ApiFailure {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Status { status, body } => ApiFailure::Status { status, body },
            ClientError::Decode(message) => ApiFailure::Decode(message),
            ClientError::Build(message) | ClientError::Request(message) => {
                ApiFailure::Transport(message)
            }
        }
    }
}
