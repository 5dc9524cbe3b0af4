//! Broker runtime for Courier: channel registry, connection lifecycle,
//! fan-out, and the ingress-side policy filters (auth, validation, rate
//! limiting). Transport-agnostic; `courier-api` drives this crate from
//! axum handlers and a WebSocket loop.

pub mod auth;
pub mod broadcast;
pub mod connection;
pub mod lifecycle;
pub mod ratelimit;
pub mod registry;
pub mod stats;
pub mod validate;

pub use auth::authorizer::ChannelAuthorizer;
pub use auth::token::TokenVerifier;
pub use broadcast::BroadcastEngine;
pub use connection::{ClientHandle, CloseReason, ConnectionState};
pub use lifecycle::{HealthStatus, LifecycleSupervisor};
pub use ratelimit::RateLimiter;
pub use registry::{ChannelRegistry, ChannelSnapshot};
pub use stats::{StatsCollector, StatsSnapshot};
pub use validate::event::EventValidator;
pub use validate::message::{ClientMessage, MessageValidator, ServerMessage, ValidationResult};
