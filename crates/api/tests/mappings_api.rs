mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{build_test_app, delete, expect_json, get, post_json, ScriptedGateway};

const MAPPINGS: &str = "/api/v1/suppression/mappings";

#[tokio::test]
async fn upsert_and_list_mappings() {
    let app = build_test_app(ScriptedGateway::configured());

    let response = post_json(
        &app.router,
        MAPPINGS,
        json!({ "dashboardId": "local-7", "providerId": 555, "dashboardName": "Casino DE" }),
    )
    .await;
    let json = expect_json(response, StatusCode::OK).await;
    assert_eq!(json["data"]["key"], "local-7");
    assert_eq!(json["data"]["providerId"], "555");
    assert_eq!(json["data"]["ignored"], false);
    assert_eq!(json["data"]["displayName"], "Casino DE");

    // Omitted display name keeps the stored one.
    let response = post_json(
        &app.router,
        MAPPINGS,
        json!({ "key": "local-7", "value": "IGNORE" }),
    )
    .await;
    let json = expect_json(response, StatusCode::OK).await;
    assert_eq!(json["data"]["providerId"], "ignore");
    assert_eq!(json["data"]["ignored"], true);
    assert_eq!(json["data"]["displayName"], "Casino DE");

    let list = expect_json(get(&app.router, MAPPINGS).await, StatusCode::OK).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn mapping_overrides_resolution_during_sync() {
    let app = build_test_app(ScriptedGateway::configured().with_zones("555", &["z1"]));

    post_json(
        &app.router,
        MAPPINGS,
        json!({ "key": "local-7", "providerId": "555" }),
    )
    .await;

    let json = expect_json(
        post_json(
            &app.router,
            "/api/v1/suppression/sync",
            json!({ "campaignIds": [{ "id": "local-7" }] }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["added"], 1);
    assert_eq!(json["diagnostics"][0]["campaignId"], "555");
    assert_eq!(json["diagnostics"][0]["strategy"], "override");
}

#[tokio::test]
async fn ignored_mapping_skips_the_campaign() {
    let app = build_test_app(ScriptedGateway::configured().with_zones("555", &["z1"]));

    post_json(
        &app.router,
        MAPPINGS,
        json!({ "key": "local-7", "providerId": "ignore" }),
    )
    .await;

    let json = expect_json(
        post_json(
            &app.router,
            "/api/v1/suppression/sync",
            json!({ "campaignIds": ["local-7"] }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["campaigns"], 0);
    assert_eq!(json["ignored"], 1);
    assert_eq!(json["added"], 0);
    assert!(json["diagnostics"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn delete_mapping_by_path_and_query() {
    let app = build_test_app(ScriptedGateway::configured());
    for key in ["a", "b"] {
        post_json(&app.router, MAPPINGS, json!({ "key": key, "providerId": "1" })).await;
    }

    let response = delete(&app.router, "/api/v1/suppression/mappings/a").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = delete(&app.router, "/api/v1/suppression/mappings?key=b").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = delete(&app.router, "/api/v1/suppression/mappings/a").await;
    let json = expect_json(response, StatusCode::NOT_FOUND).await;
    assert_eq!(json["code"], "NOT_FOUND");

    let list = expect_json(get(&app.router, MAPPINGS).await, StatusCode::OK).await;
    assert!(list["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn delete_by_query_requires_key() {
    let app = build_test_app(ScriptedGateway::configured());

    let response = delete(&app.router, MAPPINGS).await;
    let json = expect_json(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn upsert_rejects_oversized_key() {
    let app = build_test_app(ScriptedGateway::configured());

    let response = post_json(
        &app.router,
        MAPPINGS,
        json!({ "key": "k".repeat(300), "providerId": "1" }),
    )
    .await;
    let json = expect_json(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}
