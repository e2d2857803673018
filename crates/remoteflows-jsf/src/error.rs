use thiserror::Error;

/// All possible errors raised while adapting a schema into a form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JsfError {
    /// The document is not a usable JSON-Schema object
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// A modify patch could not be applied
    #[error("Invalid modify patch: {0}")]
    InvalidPatch(String),

    /// The validation engine refused to compile the schema
    #[error("Schema compilation error: {0}")]
    Compilation(String),

    /// Errors that occur during JSON processing
    #[error("JSON processing error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for JsfError {
    fn from(err: serde_json::Error) -> Self {
        JsfError::Json(err.to_string())
    }
}

impl JsfError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            JsfError::InvalidSchema(_) => "ERR_JSF_INVALID_SCHEMA",
            JsfError::InvalidPatch(_) => "ERR_JSF_INVALID_PATCH",
            JsfError::Compilation(_) => "ERR_JSF_COMPILATION",
            JsfError::Json(_) => "ERR_JSF_JSON",
        }
    }
}
