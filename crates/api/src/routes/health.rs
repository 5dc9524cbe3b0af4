//! Control API health probe.

use crate::server::AppState;
use crate::types::HealthResponse;
use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use courier_core::HealthStatus;
use std::collections::HashMap;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Healthy or degraded", body = HealthResponse),
        (status = 503, description = "Shutting down", body = HealthResponse),
    ),
    tag = "control"
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let status = state.lifecycle.status();
    let code = match status {
        HealthStatus::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };

    let mut components = HashMap::new();
    components.insert("registry".to_string(), "ok".to_string());
    components.insert("broadcast".to_string(), "ok".to_string());
    components.insert(
        "auth".to_string(),
        if state.token_verifier.is_some() { "ok" } else { "disabled" }.to_string(),
    );

    let body = HealthResponse {
        status: match status {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::ShuttingDown => "shutting_down",
        }
        .to_string(),
        uptime_seconds: state.lifecycle.uptime_seconds(),
        active_connections: state.registry.total_client_count(),
        active_channels: state.registry.channel_count(),
        components,
        timestamp: Utc::now(),
    };

    (code, Json(body))
}
