//! Upload and delete integration tests.
//!
//! Run with: `cargo test -p outreach-api --test media_test`

mod helpers;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::multipart::MultipartForm;
use helpers::auth::TEST_API_TOKEN;
use helpers::fixtures::{create_test_jpeg, create_test_pdf, file_part};
use helpers::{media_path, setup_test_app, setup_test_app_with};
use outreach_core::{PolicyTable, StoredFileReference};
use serde_json::Value;

fn stored_files(body: &Value) -> Vec<StoredFileReference> {
    serde_json::from_value(body["data"]["files"].clone()).expect("files array")
}

#[tokio::test]
async fn test_upload_mixed_categories() {
    let app = setup_test_app().await;

    let form = MultipartForm::new()
        .add_part("photos", file_part(create_test_jpeg(64, 48), "porch.jpg", "image/jpeg"))
        .add_part("photos", file_part(create_test_jpeg(32, 32), "door.jpg", "image/jpeg"))
        .add_part("documents", file_part(create_test_pdf(), "consent.pdf", "application/pdf"));

    let response = app
        .client()
        .post(&media_path("visit-42"))
        .authorization_bearer(TEST_API_TOKEN)
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);

    let files = stored_files(&body);
    assert_eq!(files.len(), 3);
    assert!(files.iter().all(|f| f.owner_id == "visit-42"));
    assert_eq!(files[2].mime_type, "application/pdf");
    assert_eq!(app.stored_file_count(), 3);

    let served = app.client().get(&format!("/files/{}", files[0].path)).await;
    assert_eq!(served.status_code(), StatusCode::OK);
    assert_eq!(served.as_bytes().len() as u64, files[0].size_bytes);
}

#[tokio::test]
async fn test_unknown_field_is_ignored_with_warning() {
    let app = setup_test_app().await;

    let form = MultipartForm::new()
        .add_part("attachments", file_part(b"notes".to_vec(), "notes.txt", "text/plain"))
        .add_part("photos", file_part(create_test_jpeg(16, 16), "a.jpg", "image/jpeg"));

    let response = app
        .client()
        .post(&media_path("visit-1"))
        .authorization_bearer(TEST_API_TOKEN)
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(stored_files(&body).len(), 1);
    let warnings = body["data"]["warnings"].as_array().expect("warnings");
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].as_str().unwrap_or_default().contains("attachments"));
    assert_eq!(app.stored_file_count(), 1);
}

#[tokio::test]
async fn test_one_violation_rejects_whole_request() {
    let app = setup_test_app().await;

    let form = MultipartForm::new()
        .add_part("photos", file_part(create_test_jpeg(16, 16), "ok.jpg", "image/jpeg"))
        .add_part("photos", file_part(b"MZ".to_vec(), "setup.exe", "application/x-msdownload"))
        .add_part("documents", file_part(create_test_pdf(), "", "application/pdf"));

    let response = app
        .client()
        .post(&media_path("visit-1"))
        .authorization_bearer(TEST_API_TOKEN)
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().is_some());

    let errors = body["errors"].as_array().expect("errors array");
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["field"], "photos");
    assert!(errors[0]["error"]
        .as_str()
        .unwrap_or_default()
        .starts_with("setup.exe: invalid type"));
    assert_eq!(errors[1]["field"], "documents");
    assert!(errors[1]["error"]
        .as_str()
        .unwrap_or_default()
        .contains("invalid name"));

    assert_eq!(app.stored_file_count(), 0);
}

#[tokio::test]
async fn test_too_many_files_reported_once() {
    let app = setup_test_app().await;

    let form = MultipartForm::new()
        .add_part("avatar", file_part(create_test_jpeg(8, 8), "a.jpg", "image/jpeg"))
        .add_part("avatar", file_part(create_test_jpeg(8, 8), "b.jpg", "image/jpeg"));

    let response = app
        .client()
        .post(&media_path("user-9"))
        .authorization_bearer(TEST_API_TOKEN)
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    let errors = body["errors"].as_array().expect("errors array");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["field"], "avatar");
    assert!(errors[0]["error"]
        .as_str()
        .unwrap_or_default()
        .starts_with("too many files"));
}

#[tokio::test]
async fn test_payload_gate_rejects_request() {
    let app = setup_test_app_with(PolicyTable::defaults(), |config| {
        config.max_payload_bytes = Some(1024);
    })
    .await;

    let form = MultipartForm::new()
        .add_part("documents", file_part(vec![b'x'; 2048], "big.txt", "text/plain"));

    let response = app
        .client()
        .post(&media_path("visit-1"))
        .authorization_bearer(TEST_API_TOKEN)
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["errors"][0]["field"], "request");
    assert_eq!(app.stored_file_count(), 0);
}

#[tokio::test]
async fn test_upload_requires_token() {
    let app = setup_test_app().await;

    let form = MultipartForm::new()
        .add_part("photos", file_part(create_test_jpeg(8, 8), "a.jpg", "image/jpeg"));

    let response = app.client().post(&media_path("visit-1")).multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let form = MultipartForm::new()
        .add_part("photos", file_part(create_test_jpeg(8, 8), "a.jpg", "image/jpeg"));
    let response = app
        .client()
        .post(&media_path("visit-1"))
        .authorization_bearer("wrong-token")
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_delete_lifecycle() {
    let app = setup_test_app().await;

    let form = MultipartForm::new()
        .add_part("photos", file_part(create_test_jpeg(8, 8), "a.jpg", "image/jpeg"));
    let response = app
        .client()
        .post(&media_path("visit-5"))
        .authorization_bearer(TEST_API_TOKEN)
        .multipart(form)
        .await;
    let files = stored_files(&response.json());
    let reference = &files[0];

    let response = app
        .client()
        .delete(&media_path("visit-6"))
        .authorization_bearer(TEST_API_TOKEN)
        .json(reference)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = app
        .client()
        .delete(&media_path("visit-5"))
        .authorization_bearer(TEST_API_TOKEN)
        .json(reference)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(app.stored_file_count(), 0);

    let response = app
        .client()
        .delete(&media_path("visit-5"))
        .authorization_bearer(TEST_API_TOKEN)
        .json(reference)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "File not found");
}

#[tokio::test]
async fn test_delete_of_another_owners_file_is_forbidden() {
    let app = setup_test_app().await;

    let form = MultipartForm::new()
        .add_part("photos", file_part(create_test_jpeg(8, 8), "victim.jpg", "image/jpeg"));
    let response = app
        .client()
        .post(&media_path("visit-2"))
        .authorization_bearer(TEST_API_TOKEN)
        .multipart(form)
        .await;
    let mut forged = stored_files(&response.json()).remove(0);
    forged.owner_id = "visit-1".to_string();

    let response = app
        .client()
        .delete(&media_path("visit-1"))
        .authorization_bearer(TEST_API_TOKEN)
        .json(&forged)
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(app.stored_file_count(), 1);
}

#[tokio::test]
async fn test_health_and_openapi_are_public() {
    let app = setup_test_app().await;

    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["categories"].as_array().map(Vec::len), Some(4));

    let response = app.client().get("/api/openapi.json").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("req-123"),
        )
        .await;

    assert_eq!(
        response.header(HeaderName::from_static("x-request-id")),
        "req-123"
    );
}
