//!
//! RemoteFlows - embeddable multi-step form flows for the Remote API
//!
//! This crate re-exports the workspace crates under one roof:
//!
//! - [`jsf`] turns JSON Schemas into renderable fields, validation and API payloads
//! - [`flows`] holds the step state machine, error normalization and the flows
//! - [`client`] is the authenticated HTTP client implementing the gateway traits
//! - [`monitoring`] sets up logging and error reporting
//!
//! A typical host builds a client, wraps it in a [`FlowContext`] and loads a flow:
//!
//! ```no_run
//! use remoteflows::client::{create_client, ClientConfig};
//! use remoteflows::{CostCalculatorFlow, CostCalculatorOptions, FlowContext};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_client(None, ClientConfig::load())?;
//! let ctx = FlowContext::new(Arc::new(client));
//! let flow = CostCalculatorFlow::load(ctx, CostCalculatorOptions::default()).await?;
//! println!("{} countries available", flow.countries().len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub use remoteflows_client as client;
pub use remoteflows_core as flows;
pub use remoteflows_jsf as jsf;
pub use remoteflows_monitoring as monitoring;

pub use remoteflows_core::{
    ContractorOnboardingFlow, ContractorOnboardingOptions, CostCalculatorFlow,
    CostCalculatorOptions, CreateCompanyFlow, CreateCompanyOptions, FlowContext, FlowError,
    FlowEvents, MutationError, OnboardingFlow, OnboardingOptions, TerminationFlow,
    TerminationOptions,
};
