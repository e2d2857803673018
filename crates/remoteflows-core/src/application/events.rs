use serde_json::Value;

use crate::domain::field_error::MutationError;
use crate::domain::step_state::NavigationError;

/// Callbacks a host registers on a flow. All methods default to no-ops.
pub trait FlowEvents: Send + Sync {
    /// A step submission succeeded; `response` is the API response, if any
    fn on_success(&self, _step: &str, _response: &Value) {}

    /// A step submission failed
    fn on_error(&self, _step: &str, _error: &MutationError) {}

    /// Back navigation was refused
    fn on_back_error(&self, _error: &NavigationError) {}
}

/// Events handler that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl FlowEvents for NoopEvents {}
