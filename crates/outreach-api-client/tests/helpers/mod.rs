//! Test helpers: real HTTP servers on ephemeral ports.
//!
//! Run from workspace root: `cargo test -p outreach-api-client`.

use axum::Router;
use outreach_api_client::ApiClient;
use outreach_core::{PolicyTable, ServerConfig};
use std::io::Cursor;
use std::time::Duration;
use tempfile::TempDir;

pub const TEST_API_TOKEN: &str = "client-test-token";

/// Serve `router` on 127.0.0.1 and return its base URL.
pub async fn spawn_router(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    format!("http://{}", addr)
}

/// Ingestion server with default policy over a temporary storage directory.
pub struct IngestionServer {
    pub base_url: String,
    pub temp_dir: TempDir,
}

pub async fn spawn_ingestion_server() -> IngestionServer {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        cors_origins: vec!["*".to_string()],
        storage_path: temp_dir.path().display().to_string(),
        public_base_url: "http://localhost/files".to_string(),
        api_token: Some(TEST_API_TOKEN.to_string()),
        max_payload_bytes: Some(150 * 1024 * 1024),
        max_request_body_bytes: 256 * 1024 * 1024,
    };

    let (_state, router) = outreach_api::setup::build_app(config, PolicyTable::defaults())
        .await
        .expect("Failed to build ingestion app");

    IngestionServer {
        base_url: spawn_router(router).await,
        temp_dir,
    }
}

pub fn client(base_url: &str) -> ApiClient {
    ApiClient::new(base_url, TEST_API_TOKEN, Duration::from_secs(30))
        .expect("Failed to create API client")
}

/// Solid-colour JPEG of the given dimensions.
pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([30, 90, 160]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Jpeg)
        .expect("Failed to encode JPEG fixture");
    out.into_inner()
}
