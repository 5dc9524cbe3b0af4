//! Statistics Collector: counters and gauges exposed by
//! `GET /stats`. Plain atomics, since these are simple monotonic counters and
//! per-channel maps, so a lock-free approach is the more idiomatic fit
//! here than a lock around a struct.

use crate::connection::CloseReason;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Default)]
pub struct StatsSnapshot {
    pub total_connects: u64,
    pub total_disconnects: u64,
    pub disconnects_by_reason: Vec<(String, u64)>,
    pub messages_published: u64,
    pub messages_published_by_channel: Vec<(String, u64)>,
    pub validation_failures: u64,
    pub rate_limit_denials: u64,
    pub slow_consumer_evictions: u64,
}

pub struct StatsCollector {
    total_connects: AtomicU64,
    total_disconnects: AtomicU64,
    disconnects_by_reason: DashMap<&'static str, u64>,
    messages_published: AtomicU64,
    messages_published_by_channel: DashMap<String, u64>,
    validation_failures: AtomicU64,
    rate_limit_denials: AtomicU64,
    slow_consumer_evictions: AtomicU64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            total_connects: AtomicU64::new(0),
            total_disconnects: AtomicU64::new(0),
            disconnects_by_reason: DashMap::new(),
            messages_published: AtomicU64::new(0),
            messages_published_by_channel: DashMap::new(),
            validation_failures: AtomicU64::new(0),
            rate_limit_denials: AtomicU64::new(0),
            slow_consumer_evictions: AtomicU64::new(0),
        }
    }

    pub fn record_connect(&self) {
        self.total_connects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disconnect(&self, reason: CloseReason) {
        self.total_disconnects.fetch_add(1, Ordering::Relaxed);
        *self
            .disconnects_by_reason
            .entry(reason.reason_text())
            .or_insert(0) += 1;
    }

    pub fn record_eviction(&self, reason: CloseReason) {
        self.slow_consumer_evictions.fetch_add(1, Ordering::Relaxed);
        self.record_disconnect(reason);
    }

    pub fn record_publish(&self, channel: &str, clients_reached: usize) {
        self.messages_published.fetch_add(1, Ordering::Relaxed);
        *self
            .messages_published_by_channel
            .entry(channel.to_string())
            .or_insert(0) += clients_reached as u64;
    }

    pub fn record_validation_failure(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limit_denial(&self) {
        self.rate_limit_denials.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_connects: self.total_connects.load(Ordering::Relaxed),
            total_disconnects: self.total_disconnects.load(Ordering::Relaxed),
            disconnects_by_reason: self
                .disconnects_by_reason
                .iter()
                .map(|kv| (kv.key().to_string(), *kv.value()))
                .collect(),
            messages_published: self.messages_published.load(Ordering::Relaxed),
            messages_published_by_channel: self
                .messages_published_by_channel
                .iter()
                .map(|kv| (kv.key().clone(), *kv.value()))
                .collect(),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            rate_limit_denials: self.rate_limit_denials.load(Ordering::Relaxed),
            slow_consumer_evictions: self.slow_consumer_evictions.load(Ordering::Relaxed),
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}
