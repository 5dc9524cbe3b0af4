//! Structured logging bootstrap: an `EnvFilter` seeded from a CLI/config
//! level that still honors `RUST_LOG` when set, plus a compact formatter.

use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global `tracing` subscriber. `default_level` is used
/// only when `RUST_LOG` is unset, so operators can always override it.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .ok();
}
