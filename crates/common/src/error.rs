//! Error taxonomy.
//!
//! Each variant is a closed case of the failure modes the broker reports.
//! Surfacing a variant as an HTTP status or a WebSocket close code is the
//! job of `courier-api`; this crate only carries the data.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CourierError {
    /// Structural or semantic rejection of an envelope or frame. Not retried.
    #[error("validation failed: {0:?}")]
    Validation(Vec<String>),

    /// Missing, malformed, or expired token.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Token valid, channel denied.
    #[error("authorization denied: {0}")]
    Authorization(String),

    /// Token bucket exhausted; retriable after `retry_after_secs`.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Channel-full or global-cap; retriable later.
    #[error("capacity exceeded: {0}")]
    Capacity(String),

    /// Outbound queue overflow; the connection is evicted, not the publisher.
    #[error("slow consumer evicted")]
    SlowConsumer,

    /// Read/write failure; the connection transitions to Closing.
    #[error("transport error: {0}")]
    TransportIo(String),

    /// Shutdown in progress.
    #[error("shutting down")]
    ShuttingDown,

    /// Unexpected; logged with context, never drops other connections.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for CourierError {
    fn from(err: anyhow::Error) -> Self {
        CourierError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for CourierError {
    fn from(err: serde_json::Error) -> Self {
        CourierError::Validation(vec![format!("invalid json: {err}")])
    }
}

pub type Result<T> = std::result::Result<T, CourierError>;
