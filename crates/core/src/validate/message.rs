//! Message Validator and the client/server frame shapes for the
//! subscriber stream. The receive loop only ever acts on the control
//! variants; any other well-formed frame is acknowledged and discarded.

use courier_common::CourierConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client -> server control frames on the subscriber stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
    Subscribe { channel: String },
    Unsubscribe { channel: String },
    #[serde(other)]
    Other,
}

/// Server -> client frames, including the delivered event wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Pong,
    Subscribed { channel: String },
    Unsubscribed { channel: String },
    Event { channel: String, data: Value },
    Error { code: String, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub violations: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

pub struct MessageValidator<'a> {
    config: &'a CourierConfig,
}

impl<'a> MessageValidator<'a> {
    pub fn new(config: &'a CourierConfig) -> Self {
        Self { config }
    }

    /// Validates a raw client->server frame: must parse as JSON, respect
    /// the configured size/nesting/array limits. Control
    /// types (`ping`, `subscribe`, `unsubscribe`) need no further policy.
    pub fn validate(&self, raw: &str) -> ValidationResult {
        let mut violations = Vec::new();

        if raw.len() > self.config.validation.max_event_bytes {
            violations.push(format!(
                "frame size {} exceeds max_event_bytes {}",
                raw.len(),
                self.config.validation.max_event_bytes
            ));
            return ValidationResult { violations };
        }

        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(err) => {
                violations.push(format!("invalid json: {err}"));
                return ValidationResult { violations };
            }
        };

        super::event::check_value_limits(
            &value,
            0,
            self.config.validation.max_string_length,
            self.config.validation.max_array_length,
            self.config.validation.max_nesting_depth,
            &mut violations,
        );

        ValidationResult { violations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CourierConfig {
        toml::from_str("port = 8080").unwrap()
    }

    #[test]
    fn accepts_well_formed_control_frame() {
        let cfg = config();
        let validator = MessageValidator::new(&cfg);
        let result = validator.validate(r#"{"type":"ping"}"#);
        assert!(result.is_valid());
    }

    #[test]
    fn rejects_malformed_json() {
        let cfg = config();
        let validator = MessageValidator::new(&cfg);
        let result = validator.validate("{not json");
        assert!(!result.is_valid());
    }

    #[test]
    fn client_message_subscribe_round_trips() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"subscribe","channel":"global"}"#).unwrap();
        match msg {
            ClientMessage::Subscribe { channel } => assert_eq!(channel, "global"),
            _ => panic!("expected Subscribe"),
        }
    }

    #[test]
    fn unrecognized_client_frame_falls_back_to_other() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"garbage"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Other));
    }
}
