//! `CourierConfig`: the broker's configuration schema.
//!
//! Loaded from a TOML file with [`CourierConfig::load`]. The only
//! required key is `port`; `auth.secret` becomes required once
//! `auth.required` is set. Missing required keys are a startup-time fatal
//! error.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierConfig {
    #[serde(default = "default_host")]
    pub host: String,

    pub port: u16,

    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_seconds: u64,

    #[serde(default = "default_max_clients_per_channel")]
    pub max_clients_per_channel: usize,

    pub max_total_clients: Option<usize>,

    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,

    #[serde(default = "default_shutdown_deadline")]
    pub shutdown_deadline_seconds: u64,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub channels: ChannelsConfig,

    /// Whether the legacy text-only `ping`/`pong` convention is accepted on
    /// the subscriber stream.
    #[serde(default = "default_true")]
    pub legacy_ping_pong: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret used to verify bearer tokens. Required when `required`
    /// is true; checked at startup, not lazily on first subscribe.
    pub secret: Option<String>,

    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    #[serde(default)]
    pub required: bool,

    /// Clock-skew leeway applied to token expiry checks.
    #[serde(default)]
    pub leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: None,
            algorithm: default_algorithm(),
            required: false,
            leeway_seconds: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_max_event_bytes")]
    pub max_event_bytes: usize,

    #[serde(default = "default_max_string_length")]
    pub max_string_length: usize,

    #[serde(default = "default_max_array_length")]
    pub max_array_length: usize,

    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,

    #[serde(default)]
    pub allowed_event_types: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_event_bytes: default_max_event_bytes(),
            max_string_length: default_max_string_length(),
            max_array_length: default_max_array_length(),
            max_nesting_depth: default_max_nesting_depth(),
            allowed_event_types: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitRule {
    pub tokens_per_second: f64,
    pub burst_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_limit_rule")]
    pub default: RateLimitRule,

    #[serde(default)]
    pub per_type: HashMap<String, RateLimitRule>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            default: default_rate_limit_rule(),
            per_type: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelsConfig {
    /// Channels ensured at startup with `ephemeral = false`.
    #[serde(default)]
    pub preconfigured: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_heartbeat_interval() -> u64 {
    30
}
fn default_max_clients_per_channel() -> usize {
    100
}
fn default_outbound_queue_capacity() -> usize {
    256
}
fn default_shutdown_deadline() -> u64 {
    30
}
fn default_algorithm() -> String {
    "HS256".to_string()
}
fn default_max_event_bytes() -> usize {
    1_048_576
}
fn default_max_string_length() -> usize {
    10_000
}
fn default_max_array_length() -> usize {
    1_000
}
fn default_max_nesting_depth() -> usize {
    16
}
fn default_rate_limit_rule() -> RateLimitRule {
    RateLimitRule {
        tokens_per_second: 10.0,
        burst_size: 20,
    }
}
fn default_true() -> bool {
    true
}

impl CourierConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CourierConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Fatal startup-time validation.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.auth.required && self.auth.secret.is_none() {
            anyhow::bail!("auth.secret is required when auth.required = true");
        }
        Ok(())
    }

    pub fn rate_limit_for(&self, message_type: &str) -> RateLimitRule {
        self.rate_limit
            .per_type
            .get(message_type)
            .copied()
            .unwrap_or(self.rate_limit.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_minimal_config() {
        let toml = r#"
            port = 8080
        "#;
        let config: CourierConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.heartbeat_interval_seconds, 30);
        assert!(!config.auth.required);
        assert_eq!(config.validation.max_event_bytes, 1_048_576);
    }

    #[test]
    fn rejects_auth_required_without_secret() {
        let config = CourierConfig {
            host: default_host(),
            port: 8080,
            heartbeat_interval_seconds: 30,
            max_clients_per_channel: 100,
            max_total_clients: None,
            outbound_queue_capacity: 256,
            shutdown_deadline_seconds: 30,
            auth: AuthConfig {
                secret: None,
                algorithm: default_algorithm(),
                required: true,
                leeway_seconds: 0,
            },
            validation: ValidationConfig::default(),
            rate_limit: RateLimitConfig::default(),
            channels: ChannelsConfig::default(),
            legacy_ping_pong: true,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn per_type_rate_limit_overrides_default() {
        let toml = r#"
            port = 8080

            [rate_limit.default]
            tokens_per_second = 5.0
            burst_size = 10

            [rate_limit.per_type.ping]
            tokens_per_second = 1.0
            burst_size = 2
        "#;
        let config: CourierConfig = toml::from_str(toml).unwrap();
        let ping = config.rate_limit_for("ping");
        assert_eq!(ping.burst_size, 2);
        let other = config.rate_limit_for("trade.executed");
        assert_eq!(other.burst_size, 10);
    }
}
