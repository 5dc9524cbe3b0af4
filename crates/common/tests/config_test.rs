use courier_common::CourierConfig;
use std::fs;
use tempfile::TempDir;

#[test]
fn loads_full_config_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("courier.toml");

    let config_content = r#"
host = "127.0.0.1"
port = 9090
heartbeat_interval_seconds = 15
max_clients_per_channel = 50
outbound_queue_capacity = 128
shutdown_deadline_seconds = 10

[auth]
secret = "test-secret"
required = true
leeway_seconds = 5

[validation]
max_event_bytes = 65536
allowed_event_types = ["trade.executed", "price.updated"]

[channels]
preconfigured = ["global", "strategy.default"]
"#;

    fs::write(&config_path, config_content).unwrap();

    let config = CourierConfig::load(config_path.to_str().unwrap()).unwrap();

    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 9090);
    assert!(config.auth.required);
    assert_eq!(config.auth.secret.as_deref(), Some("test-secret"));
    assert_eq!(config.validation.max_event_bytes, 65536);
    assert_eq!(config.channels.preconfigured.len(), 2);
}

#[test]
fn load_fails_fast_when_auth_required_without_secret() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("bad.toml");

    fs::write(
        &config_path,
        r#"
port = 8080

[auth]
required = true
"#,
    )
    .unwrap();

    let result = CourierConfig::load(config_path.to_str().unwrap());
    assert!(result.is_err());
}
