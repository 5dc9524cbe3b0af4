//! Per-connection state machine: a connection owns its outbound queue
//! and is looked up by the registry through a cheap `Arc` clone, never a
//! strong back-reference.

use chrono::{DateTime, Utc};
use courier_common::types::{ChannelName, ClientId};
use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Handshaking = 0,
    Subscribed = 1,
    Closing = 2,
    Closed = 3,
}

impl ConnectionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ConnectionState::Handshaking,
            1 => ConnectionState::Subscribed,
            2 => ConnectionState::Closing,
            _ => ConnectionState::Closed,
        }
    }
}

/// Why a connection was transitioned to `Closing`, surfaced in statistics
/// and transport close reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    PeerClosed,
    HeartbeatTimeout,
    SlowConsumer,
    PolicyViolation,
    ShuttingDown,
    TransportError,
}

impl CloseReason {
    /// WebSocket close code.
    pub fn close_code(self) -> u16 {
        match self {
            CloseReason::ShuttingDown => 1001,
            _ => 1008,
        }
    }

    pub fn reason_text(self) -> &'static str {
        match self {
            CloseReason::PeerClosed => "peer closed",
            CloseReason::HeartbeatTimeout => "heartbeat timeout",
            CloseReason::SlowConsumer => "slow consumer evicted",
            CloseReason::PolicyViolation => "policy violation",
            CloseReason::ShuttingDown => "server shutting down",
            CloseReason::TransportError => "transport error",
        }
    }
}

/// Handle shared between the connection's own send/receive tasks and the
/// registry. Cloning is cheap (`Arc` internals); identity is `id`.
#[derive(Debug)]
pub struct ClientHandle {
    pub id: ClientId,
    pub channel_name: ChannelName,
    pub user_id: Option<String>,
    pub connected_at: DateTime<Utc>,
    state: AtomicU8,
    last_activity_ms: AtomicI64,
    outbound: mpsc::Sender<Arc<str>>,
}

impl ClientHandle {
    /// Builds the handle and the receiving half of its outbound queue.
    /// `capacity` is `outbound_queue_capacity` from configuration. Each
    /// queued item is a pre-serialized wire frame shared (via `Arc`)
    /// across every subscriber it's delivered to.
    pub fn new(
        channel_name: ChannelName,
        user_id: Option<String>,
        capacity: usize,
    ) -> (Arc<Self>, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let now = Utc::now();
        let handle = Arc::new(Self {
            id: ClientId::new(),
            channel_name,
            user_id,
            connected_at: now,
            state: AtomicU8::new(ConnectionState::Handshaking as u8),
            last_activity_ms: AtomicI64::new(now.timestamp_millis()),
            outbound: tx,
        });
        (handle, rx)
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub fn is_subscribed(&self) -> bool {
        self.state() == ConnectionState::Subscribed
    }

    /// Marks the connection alive as of now. Called on every inbound
    /// frame and every successful delivery of a real message, never on
    /// the heartbeat ping itself.
    pub fn record_activity(&self) {
        self.last_activity_ms.store(Utc::now().timestamp_millis(), Ordering::Release);
    }

    /// True once `max_idle` has elapsed since the last recorded activity.
    pub fn is_stale(&self, max_idle: Duration) -> bool {
        let last = self.last_activity_ms.load(Ordering::Acquire);
        let elapsed_ms = Utc::now().timestamp_millis().saturating_sub(last);
        elapsed_ms >= max_idle.as_millis() as i64
    }

    /// Non-blocking enqueue used by the broadcast engine. `Err` signals
    /// that the outbound queue is full (slow consumer); the caller must
    /// evict, never block waiting for room.
    pub fn try_send(&self, frame: Arc<str>) -> Result<(), Arc<str>> {
        self.outbound.try_send(frame).map_err(|err| match err {
            mpsc::error::TrySendError::Full(f) => f,
            mpsc::error::TrySendError::Closed(f) => f,
        })
    }
}
