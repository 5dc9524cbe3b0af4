use axum::body::Body;
use axum::http::{Request, StatusCode};
use courier_api::CourierServer;
use courier_common::CourierConfig;
use tower::ServiceExt;

fn test_config() -> CourierConfig {
    toml::from_str("port = 0").unwrap()
}

#[tokio::test]
async fn subscribe_without_websocket_upgrade_headers_is_rejected() {
    let server = CourierServer::new(test_config()).unwrap();
    let router = server.router();

    let req = Request::get("/subscribe/global").body(Body::empty()).unwrap();
    let response = router.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
