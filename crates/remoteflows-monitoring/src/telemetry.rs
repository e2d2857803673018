//! Error telemetry.
//!
//! Flows report errors they cannot attribute to the user (undecodable
//! responses, broken schemas) to an [`ErrorReporter`], keyed by flow and step.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::error;

/// One unexpected error with its flow context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Flow name, e.g. `onboarding`
    pub flow: String,
    /// Step name at the time of the error
    pub step: String,
    /// Error description
    pub message: String,
    /// When the error was reported
    pub occurred_at: DateTime<Utc>,
}

impl ErrorReport {
    pub fn new(flow: impl Into<String>, step: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            flow: flow.into(),
            step: step.into(),
            message: message.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// Sink for unexpected errors
pub trait ErrorReporter: Send + Sync {
    /// Record an error report
    fn report(&self, report: ErrorReport);
}

/// Reporter that forwards to the `tracing` error level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, report: ErrorReport) {
        error!(
            flow = %report.flow,
            step = %report.step,
            occurred_at = %report.occurred_at,
            "{}",
            report.message
        );
    }
}

/// Reporter that keeps reports in memory
#[derive(Debug, Default)]
pub struct MemoryErrorReporter {
    reports: Mutex<Vec<ErrorReport>>,
}

impl MemoryErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all reports so far
    pub fn reports(&self) -> Vec<ErrorReport> {
        self.reports.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }
}

impl ErrorReporter for MemoryErrorReporter {
    fn report(&self, report: ErrorReport) {
        self.reports.lock().push(report);
    }
}
