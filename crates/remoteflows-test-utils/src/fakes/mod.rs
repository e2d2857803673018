/// Recording `FlowEvents` implementation
pub mod events;

/// In-memory gateway
pub mod remote_api;
