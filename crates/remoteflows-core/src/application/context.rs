use remoteflows_monitoring::{ErrorReport, ErrorReporter, TracingErrorReporter};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::events::{FlowEvents, NoopEvents};
use crate::domain::api::RemoteApi;
use crate::error::FlowError;

/// Collaborators shared by every flow
#[derive(Clone)]
pub struct FlowContext {
    /// Gateway access
    pub api: Arc<dyn RemoteApi>,
    /// Host callbacks
    pub events: Arc<dyn FlowEvents>,
    /// Sink for unexpected errors
    pub reporter: Arc<dyn ErrorReporter>,
}

impl FlowContext {
    /// Context with no-op events and tracing based error reporting
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self {
            api,
            events: Arc::new(NoopEvents),
            reporter: Arc::new(TracingErrorReporter),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn FlowEvents>) -> Self {
        self.events = events;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Deliver a failed submission to the host and hand the error back.
    pub(crate) fn fail(&self, flow: &str, step: &str, error: FlowError) -> FlowError {
        if error.is_unexpected() {
            error!(flow, step, error = %error, "Unexpected flow error");
            self.reporter
                .report(ErrorReport::new(flow, step, error.to_string()));
        } else {
            warn!(flow, step, code = error.error_code(), error = %error, "Step submission failed");
        }
        self.events.on_error(step, &error.to_mutation_error());
        error
    }

    /// Deliver a refused navigation to the host and hand the error back.
    pub(crate) fn refuse(&self, error: FlowError) -> FlowError {
        if let FlowError::NavigationGuard(navigation) = &error {
            self.events.on_back_error(navigation);
        }
        error
    }

    pub(crate) fn succeed(&self, flow: &str, step: &str, response: &Value) {
        debug!(flow, step, "Step submitted");
        self.events.on_success(step, response);
    }
}

impl std::fmt::Debug for FlowContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowContext").finish_non_exhaustive()
    }
}
