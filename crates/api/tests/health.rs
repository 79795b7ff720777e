mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};

use common::{body_json, build_test_app, get, send, ScriptedGateway};

#[tokio::test]
async fn health_reports_provider_and_storage() {
    let app = build_test_app(ScriptedGateway::configured());

    let response = get(&app.router, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["providerConfigured"], true);
    assert_eq!(json["storage"], "memory");
    assert_eq!(json["storageHealthy"], true);
}

#[tokio::test]
async fn health_reports_unconfigured_provider() {
    let app = build_test_app(ScriptedGateway::unconfigured());

    let json = body_json(get(&app.router, "/health").await).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["providerConfigured"], false);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = build_test_app(ScriptedGateway::configured());

    let response = get(&app.router, "/api/v1/nonexistent").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn request_id_is_generated() {
    let app = build_test_app(ScriptedGateway::configured());

    let response = get(&app.router, "/health").await;
    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("response should carry x-request-id");
    // UUID v4 string form.
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

#[tokio::test]
async fn request_id_is_propagated() {
    let app = build_test_app(ScriptedGateway::configured());

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-me")
        .body(Body::empty())
        .unwrap();
    let response = send(&app.router, request).await;
    assert_eq!(response.headers().get("x-request-id").unwrap(), "trace-me");
}

#[tokio::test]
async fn cors_preflight_allows_dev_origin() {
    let app = build_test_app(ScriptedGateway::configured());

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/suppression/sync")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = send(&app.router, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "http://localhost:5173"
    );
}
