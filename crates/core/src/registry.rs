//! Channel Registry: a `DashMap` of channels, each owning its own
//! `DashMap` of subscribers, so fan-out on one channel never contends
//! with subscribe/unsubscribe on another.

use crate::connection::ClientHandle;
use chrono::{DateTime, Utc};
use courier_common::types::{ChannelId, ChannelName, ClientId};
use courier_common::CourierError;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct ChannelEntry {
    id: ChannelId,
    created_at: DateTime<Utc>,
    ephemeral: bool,
    subscribers: DashMap<ClientId, Arc<ClientHandle>>,
}

/// Snapshot of one channel for `/stats`.
#[derive(Debug, Clone)]
pub struct ChannelSnapshot {
    pub name: String,
    pub id: ChannelId,
    pub created_at: DateTime<Utc>,
    pub ephemeral: bool,
    pub subscriber_count: usize,
}

/// Owns `channel_name -> subscriber set`. `max_clients_per_channel`
/// and `max_total_clients` are enforced here so a single `subscribe` call is
/// the only place capacity is checked.
pub struct ChannelRegistry {
    channels: DashMap<ChannelName, Arc<ChannelEntry>>,
    max_clients_per_channel: usize,
    max_total_clients: Option<usize>,
    total_clients: AtomicUsize,
}

impl ChannelRegistry {
    pub fn new(max_clients_per_channel: usize, max_total_clients: Option<usize>) -> Self {
        Self {
            channels: DashMap::new(),
            max_clients_per_channel,
            max_total_clients,
            total_clients: AtomicUsize::new(0),
        }
    }

    /// Creates the channel entry if absent; idempotent. `ephemeral` only
    /// takes effect on first creation.
    pub fn ensure_channel(&self, name: &ChannelName, ephemeral: bool) -> ChannelId {
        let entry = self.channels.entry(name.clone()).or_insert_with(|| {
            Arc::new(ChannelEntry {
                id: ChannelId::new(),
                created_at: Utc::now(),
                ephemeral,
                subscribers: DashMap::new(),
            })
        });
        entry.id
    }

    /// Inserts `client` into `name`'s subscriber set, creating the channel
    /// if needed. Idempotent for the same `client.id`. Fails with `Capacity` if the per-channel or global cap
    /// would be exceeded.
    pub fn subscribe(
        &self,
        name: &ChannelName,
        client: Arc<ClientHandle>,
    ) -> Result<ChannelId, CourierError> {
        self.ensure_channel(name, name.is_ephemeral());
        let entry = self
            .channels
            .get(name)
            .expect("just ensured")
            .clone();

        if entry.subscribers.contains_key(&client.id) {
            return Ok(entry.id);
        }

        if entry.subscribers.len() >= self.max_clients_per_channel {
            return Err(CourierError::Capacity(format!(
                "channel {name} is at capacity ({})",
                self.max_clients_per_channel
            )));
        }
        if let Some(max_total) = self.max_total_clients {
            if self.total_clients.load(Ordering::Relaxed) >= max_total {
                return Err(CourierError::Capacity(
                    "global client capacity reached".to_string(),
                ));
            }
        }

        entry.subscribers.insert(client.id, client);
        self.total_clients.fetch_add(1, Ordering::Relaxed);
        Ok(entry.id)
    }

    /// No-op if `client_id` isn't present.
    pub fn unsubscribe(&self, name: &ChannelName, client_id: ClientId) {
        if let Some(entry) = self.channels.get(name) {
            if entry.subscribers.remove(&client_id).is_some() {
                self.total_clients.fetch_sub(1, Ordering::Relaxed);
            }
        }
    }

    /// A point-in-time copy of the subscriber set, safe to iterate without
    /// holding any registry lock.
    pub fn snapshot_subscribers(&self, name: &ChannelName) -> Vec<Arc<ClientHandle>> {
        match self.channels.get(name) {
            Some(entry) => entry
                .subscribers
                .iter()
                .map(|kv| kv.value().clone())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn list_channels(&self) -> Vec<ChannelSnapshot> {
        self.channels
            .iter()
            .map(|kv| ChannelSnapshot {
                name: kv.key().as_str().to_string(),
                id: kv.value().id,
                created_at: kv.value().created_at,
                ephemeral: kv.value().ephemeral,
                subscriber_count: kv.value().subscribers.len(),
            })
            .collect()
    }

    pub fn total_client_count(&self) -> usize {
        self.total_clients.load(Ordering::Relaxed)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Drops an empty, ephemeral channel. Called from `handle_socket`
    /// right after the unsubscribe that may have emptied it, so an
    /// ephemeral channel never outlives its last subscriber.
    pub fn reap_if_empty_ephemeral(&self, name: &ChannelName) {
        if let Some(entry) = self.channels.get(name) {
            if entry.ephemeral && entry.subscribers.is_empty() {
                drop(entry);
                self.channels.remove(name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> ChannelName {
        ChannelName::parse(s).unwrap()
    }

    #[test]
    fn subscribe_then_unsubscribe_returns_to_empty() {
        let registry = ChannelRegistry::new(10, None);
        let (client, _rx) = ClientHandle::new(name("global"), None, 4);
        registry.subscribe(&name("global"), client.clone()).unwrap();
        assert_eq!(registry.total_client_count(), 1);
        assert_eq!(registry.snapshot_subscribers(&name("global")).len(), 1);

        registry.unsubscribe(&name("global"), client.id);
        assert_eq!(registry.total_client_count(), 0);
        assert!(registry.snapshot_subscribers(&name("global")).is_empty());
    }

    #[test]
    fn subscribe_is_idempotent_for_same_client() {
        let registry = ChannelRegistry::new(10, None);
        let (client, _rx) = ClientHandle::new(name("global"), None, 4);
        registry.subscribe(&name("global"), client.clone()).unwrap();
        registry.subscribe(&name("global"), client.clone()).unwrap();
        assert_eq!(registry.total_client_count(), 1);
    }

    #[test]
    fn unsubscribe_unknown_client_is_noop() {
        let registry = ChannelRegistry::new(10, None);
        registry.unsubscribe(&name("global"), ClientId::new());
        assert_eq!(registry.total_client_count(), 0);
    }

    #[test]
    fn subscribe_rejects_over_capacity() {
        let registry = ChannelRegistry::new(1, None);
        let (a, _rx_a) = ClientHandle::new(name("global"), None, 4);
        let (b, _rx_b) = ClientHandle::new(name("global"), None, 4);
        registry.subscribe(&name("global"), a).unwrap();
        assert!(registry.subscribe(&name("global"), b).is_err());
    }

    #[test]
    fn dynamic_channel_created_on_first_publish_has_zero_subscribers() {
        let registry = ChannelRegistry::new(10, None);
        registry.ensure_channel(&name("forge.job.abc-123"), true);
        let snapshot = registry
            .list_channels()
            .into_iter()
            .find(|c| c.name == "forge.job.abc-123")
            .unwrap();
        assert_eq!(snapshot.subscriber_count, 0);
        assert!(snapshot.ephemeral);
    }
}
