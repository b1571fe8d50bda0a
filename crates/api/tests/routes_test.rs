//! Router-level tests exercising the request surface without a database.
//!
//! Everything here returns before the first database round trip: extractor
//! rejections, path/query validation, and multipart validation.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use mediref_api::{AppState, create_router};
use mediref_core::storage::{GatewayConfig, StorageBackend, StorageGateway};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

fn test_app() -> Router {
    let root = std::env::temp_dir().join(format!("mediref-api-test-{}", Uuid::new_v4()));
    let gateway = StorageGateway::from_config(GatewayConfig::new(StorageBackend::local_fs(root)))
        .expect("fs gateway");
    create_router(AppState {
        db: Arc::new(DatabaseConnection::default()),
        storage: Arc::new(gateway),
    })
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_is_open() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_caller_identity_is_unauthorized() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/patients/{}/attachments", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "missing_caller_identity");
}

#[tokio::test]
async fn test_blank_caller_identity_is_unauthorized() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/encounters/{}/attachments", Uuid::new_v4()))
                .header("x-caller-id", "   ")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_owner_id_is_bad_request() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/patients/not-a-uuid/attachments")
                .header("x-caller-id", "tester")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_batch_listing_rejects_malformed_ids() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/encounters/attachments?encounter_ids=abc,def")
                .header("x-caller-id", "tester")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_encounter_ids");
}

#[tokio::test]
async fn test_batch_listing_rejects_empty_ids() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/encounters/attachments?encounter_ids=")
                .header("x-caller-id", "tester")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_inventory_listing_rejects_source_filter() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/api/v1/inventory-transfers/{}/attachments?source=document",
                    Uuid::new_v4()
                ))
                .header("x-caller-id", "tester")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "source_not_supported");
}

#[tokio::test]
async fn test_listing_rejects_unknown_source_value() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/api/v1/patients/{}/attachments?source=thumbnail",
                    Uuid::new_v4()
                ))
                .header("x-caller-id", "tester")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_source");
}

#[tokio::test]
async fn test_upload_without_file_part_is_bad_request() {
    let boundary = "X-MEDIREF-TEST";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"details\"\r\n\r\n\
         just text, no file\r\n\
         --{boundary}--\r\n"
    );

    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/patients/{}/attachments", Uuid::new_v4()))
                .header("x-caller-id", "tester")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "missing_file");
}

#[tokio::test]
async fn test_upload_rejects_unknown_type_value() {
    let boundary = "X-MEDIREF-TEST";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"type\"\r\n\r\n\
         selfie\r\n\
         --{boundary}--\r\n"
    );

    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/encounters/{}/attachments", Uuid::new_v4()))
                .header("x-caller-id", "tester")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_type");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/referrals")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
