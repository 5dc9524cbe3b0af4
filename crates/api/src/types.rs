//! Wire-level request/response shapes for the Courier HTTP surfaces.
//! Internal broker types (`courier_core`) never derive
//! `ToSchema`/are never serialized directly; these structs are the
//! boundary.

use chrono::{DateTime, Utc};
use courier_common::types::EventEnvelope;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

/// `POST /publish` body: the preferred ingress shape.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PublishRequest {
    pub channel: String,
    pub data: EventEnvelope,
}

/// Shared response for both ingress endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublishResponse {
    pub status: String,
    pub channel: String,
    pub event_type: String,
    pub clients_reached: usize,
    pub timestamp: DateTime<Utc>,
}

/// Error body returned by every Courier HTTP endpoint: a uniform
/// `{error, code, timestamp}` shape across every failure path.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: Option<String>,
    pub violations: Vec<String>,
    pub retry_after_secs: Option<u64>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn simple(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: Some(code.to_string()),
            violations: Vec::new(),
            retry_after_secs: None,
            timestamp: Utc::now(),
        }
    }

    pub fn validation(violations: Vec<String>) -> Self {
        Self {
            error: "validation failed".to_string(),
            code: Some("VALIDATION_FAILED".to_string()),
            violations,
            retry_after_secs: None,
            timestamp: Utc::now(),
        }
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self {
            error: "rate limited".to_string(),
            code: Some("RATE_LIMITED".to_string()),
            violations: Vec::new(),
            retry_after_secs: Some(retry_after_secs),
            timestamp: Utc::now(),
        }
    }
}

/// `GET /health` response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub active_connections: usize,
    pub active_channels: usize,
    pub components: HashMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

/// `GET /stats` response.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub total_connects: u64,
    pub total_disconnects: u64,
    pub disconnects_by_reason: HashMap<String, u64>,
    pub messages_published: u64,
    pub messages_published_by_channel: HashMap<String, u64>,
    pub validation_failures: u64,
    pub rate_limit_denials: u64,
    pub slow_consumer_evictions: u64,
    pub channels: Vec<ChannelStats>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChannelStats {
    pub name: String,
    pub ephemeral: bool,
    pub subscriber_count: usize,
}
