//! Monitoring for RemoteFlows: structured logging and error telemetry.

use serde::{Deserialize, Serialize};

pub mod logging;
pub mod telemetry;

pub use logging::init_logging;
pub use telemetry::{ErrorReport, ErrorReporter, MemoryErrorReporter, TracingErrorReporter};

/// Configuration for initializing the monitoring system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Service name attached to every log line
    pub service_name: String,
    /// Log level filter (e.g., "info,remoteflows_core=debug"); `RUST_LOG` wins when set
    pub log_filter: String,
    /// Emit JSON lines instead of human readable output
    pub json_logs: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: "remoteflows".to_string(),
            log_filter: "info".to_string(),
            json_logs: false,
        }
    }
}
