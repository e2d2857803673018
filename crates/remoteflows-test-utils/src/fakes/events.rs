use parking_lot::Mutex;
use remoteflows_core::{FlowEvents, MutationError, NavigationError};
use serde_json::Value;
use std::sync::Arc;

/// One callback received by [`RecordingEvents`]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedEvent {
    Success { step: String, response: Value },
    Error { step: String, error: MutationError },
    BackError(NavigationError),
}

/// Events handler that keeps every callback for later inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingEvents {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// Steps that reported success, in order
    pub fn successes(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                RecordedEvent::Success { step, .. } => Some(step.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<(String, MutationError)> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                RecordedEvent::Error { step, error } => Some((step.clone(), error.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn back_errors(&self) -> Vec<NavigationError> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                RecordedEvent::BackError(error) => Some(error.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl FlowEvents for RecordingEvents {
    fn on_success(&self, step: &str, response: &Value) {
        self.events.lock().push(RecordedEvent::Success {
            step: step.to_string(),
            response: response.clone(),
        });
    }

    fn on_error(&self, step: &str, error: &MutationError) {
        self.events.lock().push(RecordedEvent::Error {
            step: step.to_string(),
            error: error.clone(),
        });
    }

    fn on_back_error(&self, error: &NavigationError) {
        self.events.lock().push(RecordedEvent::BackError(error.clone()));
    }
}
