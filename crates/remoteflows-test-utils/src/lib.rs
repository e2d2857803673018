//! Testing utilities for RemoteFlows.
//!
//! An in-memory fake of every API trait, an events handler that records
//! callbacks, and schema fixtures shaped like the gateway's responses.

pub mod fakes;
pub mod fixtures;

pub use fakes::events::{RecordedEvent, RecordingEvents};
pub use fakes::remote_api::{FakeRemoteApi, RecordedCall};
