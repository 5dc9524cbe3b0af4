//! Wire-level value objects: `ChannelName`, `Message`,
//! `EventEnvelope`, `TokenPayload`, and the identifiers that key the
//! registry.

use crate::error::CourierError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identity of a channel, assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub Uuid);

impl ChannelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identity of a live subscriber connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated channel name.
///
/// Grammar: `global | user.<id> | strategy.<id> | forge.job.<id> |
/// backtest.<id> | <other-allowed-name>`, `id ::= [a-z0-9_-]+`. Immutable
/// once constructed; `parse` is the only constructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelName(String);

const MAX_CHANNEL_NAME_LEN: usize = 100;

impl ChannelName {
    pub fn parse(raw: &str) -> Result<Self, CourierError> {
        if raw.is_empty() {
            return Err(CourierError::Validation(vec![
                "channel name must not be empty".to_string(),
            ]));
        }
        if raw.len() > MAX_CHANNEL_NAME_LEN {
            return Err(CourierError::Validation(vec![format!(
                "channel name exceeds {MAX_CHANNEL_NAME_LEN} characters"
            )]));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '-' | '_'))
        {
            return Err(CourierError::Validation(vec![
                "channel name contains characters outside [a-z0-9._-]".to_string(),
            ]));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_global(&self) -> bool {
        self.0 == "global"
    }

    pub fn is_user_scoped(&self) -> bool {
        self.0.starts_with("user.")
    }

    pub fn is_strategy_scoped(&self) -> bool {
        self.0.starts_with("strategy.")
    }

    pub fn is_forge_job(&self) -> bool {
        self.0.starts_with("forge.job.")
    }

    pub fn is_backtest(&self) -> bool {
        self.0.starts_with("backtest.")
    }

    /// Any of the `<prefix>.<id>` scoped forms.
    pub fn is_ephemeral(&self) -> bool {
        self.is_forge_job() || self.is_backtest()
    }

    /// The `<id>` suffix of a `prefix.<id>` name, if present.
    pub fn scoped_id(&self) -> Option<&str> {
        self.0.rsplit_once('.').map(|(_, id)| id)
    }
}

impl TryFrom<String> for ChannelName {
    type Error = CourierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ChannelName> for String {
    fn from(value: ChannelName) -> Self {
        value.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outbound message delivered to a subscriber.
///
/// Constructor rejects a non-object or empty `data`; accessors hand back
/// defensive copies so external code can't mutate a constructed `Message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    data: serde_json::Value,
    timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(data: serde_json::Value) -> Result<Self, CourierError> {
        let is_valid_object = data.as_object().map(|obj| !obj.is_empty()).unwrap_or(false);
        if !is_valid_object {
            return Err(CourierError::Validation(vec![
                "message data must be a non-empty object".to_string(),
            ]));
        }
        Ok(Self {
            data,
            timestamp: Utc::now(),
        })
    }

    pub fn data(&self) -> serde_json::Value {
        self.data.clone()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Inbound event at publish time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    #[serde(default)]
    pub correlation_id: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Decoded bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPayload {
    pub user_id: String,
    #[serde(default)]
    pub wallet_address: Option<String>,
    pub exp: i64,
    pub iat: i64,
}
