//! Subscriber transport: `subscribe` upgrades the connection, then
//! `handle_socket` splits the stream into a spawned send task (forwarding
//! the outbound queue and heartbeats) and a receive loop running in the
//! caller's task. Cleanup always removes the client from the registry
//! before the transport actually closes.

use crate::server::AppState;
use axum::extract::ws::{CloseFrame, Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use courier_common::types::ChannelName;
use courier_core::{ClientHandle, ClientMessage, CloseReason, ConnectionState, MessageValidator, ServerMessage};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

#[derive(Debug, Deserialize)]
pub struct SubscribeQuery {
    pub token: Option<String>,
}

#[utoipa::path(
    get,
    path = "/subscribe/{channel}",
    responses(
        (status = 101, description = "Switching protocols to the subscriber stream"),
        (status = 400, description = "Malformed channel name"),
    ),
    tag = "streaming"
)]
#[instrument(skip(state, ws, query), fields(channel = %channel_raw))]
pub async fn subscribe(
    State(state): State<AppState>,
    Path(channel_raw): Path<String>,
    Query(query): Query<SubscribeQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, channel_raw, query.token))
}

async fn handle_socket(socket: WebSocket, state: AppState, channel_raw: String, token: Option<String>) {
    let channel = match ChannelName::parse(&channel_raw) {
        Ok(c) => c,
        Err(err) => {
            close_with(socket, CloseReason::PolicyViolation, &err.to_string()).await;
            return;
        }
    };

    if state.lifecycle.is_shutting_down() {
        close_with(socket, CloseReason::ShuttingDown, "server is shutting down").await;
        return;
    }

    let user_id = match authenticate(&state, token.as_deref()) {
        Ok(id) => id,
        Err(reason) => {
            close_with(socket, CloseReason::PolicyViolation, reason).await;
            return;
        }
    };

    if let Some(uid) = &user_id {
        if !state.authorizer.authorize(uid, &channel) {
            warn!(user_id = %uid, channel = %channel, "unauthorized channel");
            close_with(socket, CloseReason::PolicyViolation, "unauthorized channel").await;
            return;
        }
    }

    let (handle, outbound_rx) =
        ClientHandle::new(channel.clone(), user_id.clone(), state.config.outbound_queue_capacity);

    if let Err(err) = state.registry.subscribe(&channel, handle.clone()) {
        warn!(channel = %channel, "subscribe rejected: {err}");
        close_with(socket, CloseReason::PolicyViolation, "capacity exceeded").await;
        return;
    }

    handle.set_state(ConnectionState::Subscribed);
    state.stats.record_connect();
    info!(client_id = %handle.id, channel = %channel, user_id = ?user_id, "client subscribed");

    let (mut ws_tx, mut ws_rx) = socket.split();

    let ack = ServerMessage::Subscribed { channel: channel.to_string() };
    if let Ok(text) = serde_json::to_string(&ack) {
        let _ = ws_tx.send(WsMessage::Text(text)).await;
    }

    let heartbeat_interval = Duration::from_secs(state.config.heartbeat_interval_seconds.max(1));
    let mut shutdown_rx = state.lifecycle.subscribe_shutdown();
    let send_task = tokio::spawn(send_loop(ws_tx, outbound_rx, handle.clone(), heartbeat_interval, shutdown_rx.clone()));

    let close_reason = receive_loop(&mut ws_rx, &state, &handle, heartbeat_interval, &mut shutdown_rx).await;

    handle.set_state(ConnectionState::Closing);
    state.registry.unsubscribe(&channel, handle.id);
    // A slow-consumer eviction already recorded its own disconnect
    // (`BroadcastEngine::publish` -> `StatsCollector::record_eviction`)
    // the moment the outbound queue filled; counting it again here would
    // double every eviction.
    if close_reason != CloseReason::SlowConsumer {
        state.stats.record_disconnect(close_reason);
    }
    state.registry.reap_if_empty_ephemeral(&channel);

    send_task.abort();
    info!(client_id = %handle.id, channel = %channel, reason = close_reason.reason_text(), "client disconnected");
}

/// Forwards broadcast-engine deliveries (already serialized once, shared
/// as `Arc<str>`, by the broadcast engine) to the socket and sends
/// periodic heartbeats; exits on shutdown or a closed outbound queue.
async fn send_loop(
    mut ws_tx: futures::stream::SplitSink<WebSocket, WsMessage>,
    mut outbound_rx: mpsc::Receiver<Arc<str>>,
    handle: Arc<ClientHandle>,
    heartbeat_interval: Duration,
    mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(heartbeat_interval);
    loop {
        tokio::select! {
            maybe_frame = outbound_rx.recv() => {
                match maybe_frame {
                    Some(frame) => {
                        if ws_tx.send(WsMessage::Text(frame.to_string())).await.is_err() {
                            break;
                        }
                        handle.record_activity();
                    }
                    None => break,
                }
            }
            _ = ticker.tick() => {
                if ws_tx.send(WsMessage::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_ok() && *shutdown_rx.borrow() {
                    let _ = ws_tx
                        .send(WsMessage::Close(Some(CloseFrame {
                            code: CloseReason::ShuttingDown.close_code(),
                            reason: CloseReason::ShuttingDown.reason_text().into(),
                        })))
                        .await;
                    break;
                }
            }
        }
    }
}

/// Drains client->server frames. Validation failures reply
/// with an error frame but do not close the connection; only protocol
/// abuse (oversize/malformed) and terminal transport conditions do.
///
/// Each tick of `liveness_ticker` also checks for heartbeat timeout: if
/// neither an inbound frame nor a real outbound send has landed in
/// `2 * heartbeat_interval`, the connection is dead and is reaped here.
async fn receive_loop(
    ws_rx: &mut futures::stream::SplitStream<WebSocket>,
    state: &AppState,
    handle: &Arc<ClientHandle>,
    heartbeat_interval: Duration,
    shutdown_rx: &mut tokio::sync::watch::Receiver<bool>,
) -> CloseReason {
    let validator = MessageValidator::new(&state.config);
    let mut liveness_ticker = tokio::time::interval(heartbeat_interval);
    let max_idle = heartbeat_interval * 2;

    loop {
        tokio::select! {
            _ = liveness_ticker.tick() => {
                if handle.is_stale(max_idle) {
                    return CloseReason::HeartbeatTimeout;
                }
                if !handle.is_subscribed() {
                    return CloseReason::SlowConsumer;
                }
            }
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        handle.record_activity();
                        if state.config.legacy_ping_pong && text.trim() == "ping" {
                            continue;
                        }
                        let result = validator.validate(&text);
                        if !result.is_valid() {
                            state.stats.record_validation_failure();
                            continue;
                        }
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Ping) | Ok(ClientMessage::Other) => {}
                            Ok(ClientMessage::Subscribe { .. }) | Ok(ClientMessage::Unsubscribe { .. }) => {}
                            Err(_) => state.stats.record_validation_failure(),
                        }
                    }
                    Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => {
                        handle.record_activity();
                    }
                    Some(Ok(WsMessage::Close(_))) | None => return CloseReason::PeerClosed,
                    Some(Ok(WsMessage::Binary(_))) => {
                        handle.record_activity();
                    }
                    Some(Err(_)) => return CloseReason::TransportError,
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_ok() && *shutdown_rx.borrow() {
                    return CloseReason::ShuttingDown;
                }
            }
        }

        if !handle.is_subscribed() {
            return CloseReason::SlowConsumer;
        }
    }
}

fn authenticate(state: &AppState, token: Option<&str>) -> Result<Option<String>, &'static str> {
    if !state.config.auth.required {
        return Ok(match (token, &state.token_verifier) {
            (Some(t), Some(verifier)) => verifier.verify(t).ok().map(|p| p.user_id),
            _ => None,
        });
    }

    let Some(token) = token else {
        return Err("missing token");
    };
    let verifier = state.token_verifier.as_ref().ok_or("authentication not configured")?;
    verifier.verify(token).map(|p| Some(p.user_id)).map_err(|_| "invalid token")
}

async fn close_with(socket: WebSocket, reason: CloseReason, detail: &str) {
    let mut socket = socket;
    let _ = socket
        .send(WsMessage::Close(Some(CloseFrame {
            code: reason.close_code(),
            reason: format!("{}: {detail}", reason.reason_text()).into(),
        })))
        .await;
}
