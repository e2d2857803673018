//!
//! RemoteFlows Client - authenticated access to the Remote API gateway
//!
//! [`ApiClient`] implements every API trait of `remoteflows-core`, so a
//! client can be handed to any flow through a `FlowContext`. Tokens come from
//! a host supplied [`CredentialProvider`] and are cached per client.

#![forbid(unsafe_code)]

/// Access tokens and session caching
pub mod auth;

/// HTTP transport
pub mod client;

/// Configuration loading
pub mod config;

/// Gateway endpoints
pub mod endpoints;

/// Error types
pub mod error;

pub use auth::{credentials_fn, AccessToken, CredentialProvider, Session, SessionCache};
pub use client::{create_client, ApiClient};
pub use config::{ClientConfig, Environment, ProxyConfig, RetryPolicy};
pub use error::{AuthError, ClientError};
