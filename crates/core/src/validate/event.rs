//! Event Validator: structural validation of inbound
//! publish envelopes, run before anything touches the registry. Collects
//! every violation rather than failing on the first, so the ingress
//! response can name all offending rules at once.

use courier_common::types::EventEnvelope;
use courier_common::CourierConfig;
use serde_json::Value;

pub struct EventValidator<'a> {
    config: &'a CourierConfig,
}

impl<'a> EventValidator<'a> {
    pub fn new(config: &'a CourierConfig) -> Self {
        Self { config }
    }

    /// Runs every structural check in order, returning every violation
    /// found rather than stopping at the first. An empty vec means the
    /// envelope is accepted.
    pub fn validate(&self, envelope: &EventEnvelope, expected_source: Option<&str>) -> Vec<String> {
        let mut violations = Vec::new();

        if envelope.event_type.is_empty() {
            violations.push("type must not be empty".to_string());
        }

        let whitelist = &self.config.validation.allowed_event_types;
        if !whitelist.is_empty() && !whitelist.contains(&envelope.event_type) {
            violations.push(format!("type '{}' is not in the allowed list", envelope.event_type));
        }

        if let Ok(serialized) = serde_json::to_vec(envelope) {
            if serialized.len() > self.config.validation.max_event_bytes {
                violations.push(format!(
                    "serialized envelope size {} exceeds max_event_bytes {}",
                    serialized.len(),
                    self.config.validation.max_event_bytes
                ));
            }
        }

        check_value_limits(
            &envelope.data,
            0,
            self.config.validation.max_string_length,
            self.config.validation.max_array_length,
            self.config.validation.max_nesting_depth,
            &mut violations,
        );

        if let (Some(expected), false) = (expected_source, envelope.source.is_empty()) {
            if envelope.source != expected {
                violations.push(format!(
                    "source '{}' does not match required publisher '{expected}'",
                    envelope.source
                ));
            }
        }

        violations
    }
}

pub(crate) fn check_value_limits(
    value: &Value,
    depth: usize,
    max_string_length: usize,
    max_array_length: usize,
    max_nesting_depth: usize,
    violations: &mut Vec<String>,
) {
    if depth > max_nesting_depth {
        violations.push(format!("nesting depth exceeds max_nesting_depth {max_nesting_depth}"));
        return;
    }

    match value {
        Value::String(s) if s.chars().count() > max_string_length => {
            violations.push(format!("string field exceeds max_string_length {max_string_length}"));
        }
        Value::Array(items) => {
            if items.len() > max_array_length {
                violations.push(format!("array exceeds max_array_length {max_array_length}"));
            }
            for item in items {
                check_value_limits(item, depth + 1, max_string_length, max_array_length, max_nesting_depth, violations);
            }
        }
        Value::Object(map) => {
            for v in map.values() {
                check_value_limits(v, depth + 1, max_string_length, max_array_length, max_nesting_depth, violations);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn config() -> CourierConfig {
        let mut cfg: CourierConfig = toml::from_str("port = 8080").unwrap();
        cfg.validation.max_event_bytes = 1024;
        cfg.validation.max_string_length = 8;
        cfg.validation.max_array_length = 2;
        cfg.validation.max_nesting_depth = 2;
        cfg
    }

    fn envelope(event_type: &str, data: Value) -> EventEnvelope {
        EventEnvelope {
            event_type: event_type.to_string(),
            timestamp: Utc::now(),
            source: "test-service".to_string(),
            correlation_id: None,
            data,
        }
    }

    #[test]
    fn accepts_well_formed_envelope() {
        let cfg = config();
        let validator = EventValidator::new(&cfg);
        let env = envelope("ping", serde_json::json!({"a": 1}));
        assert!(validator.validate(&env, None).is_empty());
    }

    #[test]
    fn rejects_oversize_string_field() {
        let cfg = config();
        let validator = EventValidator::new(&cfg);
        let env = envelope("ping", serde_json::json!({"a": "way too long a string"}));
        assert!(!validator.validate(&env, None).is_empty());
    }

    #[test]
    fn rejects_oversize_array() {
        let cfg = config();
        let validator = EventValidator::new(&cfg);
        let env = envelope("ping", serde_json::json!({"a": [1, 2, 3]}));
        assert!(!validator.validate(&env, None).is_empty());
    }

    #[test]
    fn rejects_type_outside_whitelist() {
        let mut cfg = config();
        cfg.validation.allowed_event_types = vec!["trade.executed".to_string()];
        let validator = EventValidator::new(&cfg);
        let env = envelope("ping", serde_json::json!({"a": 1}));
        assert!(!validator.validate(&env, None).is_empty());
    }

    #[test]
    fn rejects_source_mismatch() {
        let cfg = config();
        let validator = EventValidator::new(&cfg);
        let env = envelope("ping", serde_json::json!({"a": 1}));
        assert!(!validator.validate(&env, Some("other-service")).is_empty());
    }
}
