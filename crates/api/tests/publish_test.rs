use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use courier_api::CourierServer;
use courier_common::CourierConfig;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_config(extra: &str) -> CourierConfig {
    toml::from_str(&format!("port = 0\n{extra}")).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn publish_without_publisher_header_is_rejected() {
    let server = CourierServer::new(test_config("")).unwrap();
    let router = server.router();

    let req = Request::post("/publish")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"channel": "global", "data": {
                "type": "trade.executed",
                "timestamp": "2026-01-01T00:00:00Z",
                "source": "svc",
                "data": {"price": 1}
            }})
            .to_string(),
        ))
        .unwrap();

    let response = router.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn publish_with_no_subscribers_reaches_zero_clients() {
    let server = CourierServer::new(test_config("")).unwrap();
    let router = server.router();

    let req = Request::post("/publish")
        .header("content-type", "application/json")
        .header("x-publisher-id", "svc-1")
        .body(Body::from(
            json!({"channel": "global", "data": {
                "type": "trade.executed",
                "timestamp": "2026-01-01T00:00:00Z",
                "source": "svc-1",
                "data": {"price": 1}
            }})
            .to_string(),
        ))
        .unwrap();

    let response = router.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["clients_reached"], 0);
    assert_eq!(body["channel"], "global");
}

#[tokio::test]
async fn publish_accepts_envelope_with_no_nested_data() {
    let server = CourierServer::new(test_config("")).unwrap();
    let router = server.router();

    let req = Request::post("/publish")
        .header("content-type", "application/json")
        .header("x-publisher-id", "test")
        .body(Body::from(
            json!({"channel": "global", "data": {
                "type": "ping",
                "timestamp": "2025-01-01T00:00:00Z",
                "source": "test"
            }})
            .to_string(),
        ))
        .unwrap();

    let response = router.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["event_type"], "ping");
}

#[tokio::test]
async fn publish_legacy_path_accepts_bare_envelope() {
    let server = CourierServer::new(test_config("")).unwrap();
    let router = server.router();

    let req = Request::post("/publish/global")
        .header("content-type", "application/json")
        .header("x-publisher-id", "svc-1")
        .body(Body::from(
            json!({
                "type": "trade.executed",
                "timestamp": "2026-01-01T00:00:00Z",
                "source": "svc-1",
                "data": {"price": 1}
            })
            .to_string(),
        ))
        .unwrap();

    let response = router.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn publish_oversize_envelope_is_rejected() {
    let server = CourierServer::new(test_config(
        "[validation]\nmax_event_bytes = 64\n",
    ))
    .unwrap();
    let router = server.router();

    let big_string = "x".repeat(1000);
    let req = Request::post("/publish")
        .header("content-type", "application/json")
        .header("x-publisher-id", "svc-1")
        .body(Body::from(
            json!({"channel": "global", "data": {
                "type": "trade.executed",
                "timestamp": "2026-01-01T00:00:00Z",
                "source": "svc-1",
                "data": {"payload": big_string}
            }})
            .to_string(),
        ))
        .unwrap();

    let response = router.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(!body["violations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn publish_rejects_invalid_channel_name() {
    let server = CourierServer::new(test_config("")).unwrap();
    let router = server.router();

    let req = Request::post("/publish")
        .header("content-type", "application/json")
        .header("x-publisher-id", "svc-1")
        .body(Body::from(
            json!({"channel": "Has Spaces", "data": {
                "type": "trade.executed",
                "timestamp": "2026-01-01T00:00:00Z",
                "source": "svc-1",
                "data": {"price": 1}
            }})
            .to_string(),
        ))
        .unwrap();

    let response = router.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn publish_denies_after_rate_limit_exhausted() {
    let server = CourierServer::new(test_config(
        "[rate_limit.default]\ntokens_per_second = 0.01\nburst_size = 1\n",
    ))
    .unwrap();
    let router = server.router();

    let make_req = || {
        Request::post("/publish")
            .header("content-type", "application/json")
            .header("x-publisher-id", "svc-1")
            .body(Body::from(
                json!({"channel": "global", "data": {
                    "type": "trade.executed",
                    "timestamp": "2026-01-01T00:00:00Z",
                    "source": "svc-1",
                    "data": {"price": 1}
                }})
                .to_string(),
            ))
            .unwrap()
    };

    let first = router.clone().oneshot(make_req()).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = router.oneshot(make_req()).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}
