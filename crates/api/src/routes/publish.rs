//! Ingress API: both publish endpoints funnel through the
//! same pipeline: publisher header, rate limiter, event validator,
//! broadcast engine, each step extracting, validating, instrumenting,
//! and logging in turn.

use crate::server::AppState;
use crate::types::{ErrorResponse, PublishRequest, PublishResponse};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use chrono::Utc;
use courier_common::types::{ChannelName, EventEnvelope, Message};
use courier_core::EventValidator;
use tracing::{info, instrument, warn};

const PUBLISHER_HEADER: &str = "x-publisher-id";

type PublishResult = Result<Json<PublishResponse>, (StatusCode, Json<ErrorResponse>)>;

/// `POST /publish`: preferred ingress shape, channel in the body.
#[utoipa::path(
    post,
    path = "/publish",
    request_body = PublishRequest,
    responses(
        (status = 200, description = "Event published", body = PublishResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
        (status = 503, description = "Shutting down", body = ErrorResponse),
    ),
    tag = "ingress"
)]
#[instrument(skip(state, headers, req), fields(channel = %req.channel))]
pub async fn publish(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PublishRequest>,
) -> PublishResult {
    do_publish(state, headers, req.channel, req.data).await
}

/// `POST /publish/{channel}`: legacy ingress shape, channel in the URL
/// path, envelope as the whole body.
#[utoipa::path(
    post,
    path = "/publish/{channel}",
    request_body = EventEnvelope,
    responses(
        (status = 200, description = "Event published", body = PublishResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
        (status = 503, description = "Shutting down", body = ErrorResponse),
    ),
    tag = "ingress"
)]
#[instrument(skip(state, headers, envelope), fields(channel = %channel))]
pub async fn publish_legacy(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    headers: HeaderMap,
    Json(envelope): Json<EventEnvelope>,
) -> PublishResult {
    do_publish(state, headers, channel, envelope).await
}

async fn do_publish(
    state: AppState,
    headers: HeaderMap,
    channel_raw: String,
    envelope: EventEnvelope,
) -> PublishResult {
    if state.lifecycle.is_shutting_down() {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::simple("server is shutting down", "SHUTTING_DOWN")),
        ));
    }

    let publisher_id = headers
        .get(PUBLISHER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let Some(publisher_id) = publisher_id else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::simple(
                format!("missing required header '{PUBLISHER_HEADER}'"),
                "MISSING_PUBLISHER_HEADER",
            )),
        ));
    };

    if let Err(retry_after) = state.rate_limiter.try_acquire(&publisher_id, &envelope.event_type) {
        warn!(%publisher_id, event_type = %envelope.event_type, "rate limited");
        state.stats.record_rate_limit_denial();
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse::rate_limited(retry_after.as_secs().max(1))),
        ));
    }

    let validator = EventValidator::new(&state.config);
    let violations = validator.validate(&envelope, Some(publisher_id.as_str()));
    if !violations.is_empty() {
        warn!(%publisher_id, ?violations, "publish rejected: validation failed");
        state.stats.record_validation_failure();
        return Err((StatusCode::BAD_REQUEST, Json(ErrorResponse::validation(violations))));
    }

    let channel = match ChannelName::parse(&channel_raw) {
        Ok(c) => c,
        Err(err) => {
            state.stats.record_validation_failure();
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::validation(vec![err.to_string()])),
            ));
        }
    };

    let envelope_value = match serde_json::to_value(&envelope) {
        Ok(v) => v,
        Err(err) => {
            state.stats.record_validation_failure();
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::validation(vec![err.to_string()])),
            ));
        }
    };

    let message = match Message::new(envelope_value) {
        Ok(m) => m,
        Err(err) => {
            state.stats.record_validation_failure();
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::validation(vec![err.to_string()])),
            ));
        }
    };

    let clients_reached = state.broadcast.publish(&channel, &message);

    info!(%publisher_id, channel = %channel, clients_reached, "event published");

    Ok(Json(PublishResponse {
        status: "published".to_string(),
        channel: channel.to_string(),
        event_type: envelope.event_type,
        clients_reached,
        timestamp: Utc::now(),
    }))
}
