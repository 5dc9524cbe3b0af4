//! # Courier
//!
//! In-process publish/subscribe broker: HTTP producers publish event
//! envelopes, connected WebSocket clients fan out every event on their
//! subscribed channel.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   Ingress API        │ <- POST /publish, /publish/{channel}
//! ├─────────────────────┤
//! │   Subscriber Stream  │ <- GET /subscribe/{channel} (WebSocket)
//! ├─────────────────────┤
//! │   Broadcast Engine   │ <- courier-core: fan-out, backpressure
//! ├─────────────────────┤
//! │   Channel Registry   │ <- courier-core: channel -> subscriber set
//! └─────────────────────┘
//! ```
//!
//! ## Usage Pattern
//!
//! 1. Client connects **GET** `/subscribe/{channel}?token=<bearer>`.
//! 2. Producer posts **POST** `/publish` with `{channel, data}`.
//! 3. Every current subscriber of `channel` receives the event as a frame.
//!
//! ## Control Surface
//!
//! - **GET** `/health`: health probe, `shutting_down` during drain.
//! - **GET** `/stats`: counters and gauges.
//! - **GET** `/api-doc/openapi.json`: raw OpenAPI specification.
//! - Browse `/docs`: interactive Swagger UI.

pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod types;

pub use server::CourierServer;
