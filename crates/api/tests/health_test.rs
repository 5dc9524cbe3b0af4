use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use courier_api::CourierServer;
use courier_common::CourierConfig;
use serde_json::Value;
use tower::ServiceExt;

fn test_config() -> CourierConfig {
    toml::from_str("port = 0").unwrap()
}

#[tokio::test]
async fn health_reports_healthy_before_shutdown() {
    let server = CourierServer::new(test_config()).unwrap();
    let router = server.router();

    let req = Request::get("/health").body(Body::empty()).unwrap();
    let response = router.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["components"]["registry"], "ok");
    assert_eq!(body["components"]["auth"], "disabled");
}

#[tokio::test]
async fn stats_starts_at_zero_with_no_traffic() {
    let server = CourierServer::new(test_config()).unwrap();
    let router = server.router();

    let req = Request::get("/stats").body(Body::empty()).unwrap();
    let response = router.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["total_connects"], 0);
    assert_eq!(body["messages_published"], 0);
}

#[tokio::test]
async fn openapi_doc_is_served() {
    let server = CourierServer::new(test_config()).unwrap();
    let router = server.router();

    let req = Request::get("/api-doc/openapi.json").body(Body::empty()).unwrap();
    let response = router.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
