//! Control API statistics snapshot.

use crate::server::AppState;
use crate::types::{ChannelStats, StatsResponse};
use axum::{extract::State, response::Json};
use chrono::Utc;

#[utoipa::path(
    get,
    path = "/stats",
    responses((status = 200, description = "Counters and gauges", body = StatsResponse)),
    tag = "control"
)]
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let snapshot = state.stats.snapshot();
    let channels = state
        .registry
        .list_channels()
        .into_iter()
        .map(|c| ChannelStats {
            name: c.name,
            ephemeral: c.ephemeral,
            subscriber_count: c.subscriber_count,
        })
        .collect();

    Json(StatsResponse {
        total_connects: snapshot.total_connects,
        total_disconnects: snapshot.total_disconnects,
        disconnects_by_reason: snapshot.disconnects_by_reason.into_iter().collect(),
        messages_published: snapshot.messages_published,
        messages_published_by_channel: snapshot.messages_published_by_channel.into_iter().collect(),
        validation_failures: snapshot.validation_failures,
        rate_limit_denials: snapshot.rate_limit_denials,
        slow_consumer_evictions: snapshot.slow_consumer_evictions,
        channels,
        timestamp: Utc::now(),
    })
}
