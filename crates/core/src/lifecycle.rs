//! Lifecycle Supervisor: startup/shutdown orchestration.
//! The supervisor owns the health flag and broadcasts it over a
//! `tokio::sync::watch` channel so every connection task can cheaply poll
//! "are we shutting down" without a registry round-trip.

use serde::Serialize;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    ShuttingDown,
}

impl HealthStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => HealthStatus::Healthy,
            1 => HealthStatus::Degraded,
            _ => HealthStatus::ShuttingDown,
        }
    }
}

pub struct LifecycleSupervisor {
    state: AtomicU8,
    started_at: Instant,
    shutdown_deadline: Duration,
    shutdown_tx: watch::Sender<bool>,
}

impl LifecycleSupervisor {
    pub fn new(shutdown_deadline_seconds: u64) -> Self {
        let (shutdown_tx, _rx) = watch::channel(false);
        Self {
            state: AtomicU8::new(HealthStatus::Healthy as u8),
            started_at: Instant::now(),
            shutdown_deadline: Duration::from_secs(shutdown_deadline_seconds),
            shutdown_tx,
        }
    }

    pub fn status(&self) -> HealthStatus {
        HealthStatus::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn mark_degraded(&self) {
        self.state.store(HealthStatus::Degraded as u8, Ordering::Release);
    }

    /// Flips health to `shutting_down`. New
    /// subscribe attempts and publishes must consult `is_shutting_down`
    /// after this and reject.
    pub fn begin_shutdown(&self) {
        self.state.store(HealthStatus::ShuttingDown as u8, Ordering::Release);
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.status() == HealthStatus::ShuttingDown
    }

    /// Subscribers use this to wake up on shutdown without polling.
    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn shutdown_deadline(&self) -> Duration {
        self.shutdown_deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_healthy_and_accepting() {
        let supervisor = LifecycleSupervisor::new(30);
        assert_eq!(supervisor.status(), HealthStatus::Healthy);
        assert!(!supervisor.is_shutting_down());
    }

    #[test]
    fn begin_shutdown_flips_status_and_notifies_subscribers() {
        let supervisor = LifecycleSupervisor::new(30);
        let mut rx = supervisor.subscribe_shutdown();
        supervisor.begin_shutdown();
        assert_eq!(supervisor.status(), HealthStatus::ShuttingDown);
        assert!(supervisor.is_shutting_down());
        assert!(*rx.borrow_and_update());
    }
}
