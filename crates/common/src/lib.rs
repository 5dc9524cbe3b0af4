//! Shared types, configuration, and error taxonomy for the Courier broker.
//!
//! This crate has no dependency on the web framework or the broker runtime:
//! it defines the wire-level value objects (`ChannelName`, `Message`,
//! `EventEnvelope`, `TokenPayload`), the configuration schema, and the error
//! taxonomy that `courier-core` and `courier-api` both build on.

pub mod config;
pub mod error;
pub mod tracing_setup;
pub mod types;

pub use config::CourierConfig;
pub use error::{CourierError, Result};
pub use types::*;
