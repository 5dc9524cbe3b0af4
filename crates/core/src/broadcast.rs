//! Broadcast Engine: snapshot subscribers, enqueue non-blocking, evict
//! on a full queue rather than waiting.

use crate::connection::{CloseReason, ConnectionState};
use crate::registry::ChannelRegistry;
use crate::stats::StatsCollector;
use crate::validate::message::ServerMessage;
use courier_common::types::{ChannelName, Message};
use std::sync::Arc;
use tracing::{instrument, warn};

pub struct BroadcastEngine {
    registry: Arc<ChannelRegistry>,
    stats: Arc<StatsCollector>,
}

impl BroadcastEngine {
    pub fn new(registry: Arc<ChannelRegistry>, stats: Arc<StatsCollector>) -> Self {
        Self { registry, stats }
    }

    /// Serializes `message` into the wire frame for `channel` exactly
    /// once, then enqueues the shared `Arc<str>` onto every current
    /// subscriber, so fan-out to N subscribers costs one JSON encode, not
    /// N. Returns the count of successful enqueues ("clients reached").
    /// Iterates a snapshot, so membership changes mid-call never produce
    /// a torn read.
    #[instrument(skip(self, message), fields(channel = %channel))]
    pub fn publish(&self, channel: &ChannelName, message: &Message) -> usize {
        let subscribers = self.registry.snapshot_subscribers(channel);
        if subscribers.is_empty() {
            self.stats.record_publish(channel.as_str(), 0);
            return 0;
        }

        let event = ServerMessage::Event {
            channel: channel.to_string(),
            data: message.data(),
        };
        let frame: Arc<str> = match serde_json::to_string(&event) {
            Ok(text) => Arc::from(text),
            Err(err) => {
                warn!(channel = %channel, "failed to serialize outbound frame: {err}");
                self.stats.record_publish(channel.as_str(), 0);
                return 0;
            }
        };

        let mut reached = 0usize;
        for client in subscribers {
            if !client.is_subscribed() {
                continue;
            }
            match client.try_send(frame.clone()) {
                Ok(()) => reached += 1,
                Err(_dropped) => {
                    warn!(client_id = %client.id, channel = %channel, "slow consumer, evicting");
                    client.set_state(ConnectionState::Closing);
                    self.registry.unsubscribe(channel, client.id);
                    self.stats.record_eviction(CloseReason::SlowConsumer);
                }
            }
        }

        self.stats.record_publish(channel.as_str(), reached);
        reached
    }
}
