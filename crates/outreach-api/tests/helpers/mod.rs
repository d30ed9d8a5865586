//! Test helpers: build the router over a temporary storage directory.
//!
//! Run from workspace root: `cargo test -p outreach-api`.

pub mod auth;
pub mod fixtures;

use axum_test::TestServer;
use outreach_api::constants;
use outreach_api::setup;
use outreach_core::{PolicyTable, ServerConfig};
use tempfile::TempDir;

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

pub fn media_path(owner_id: &str) -> String {
    api_path(&format!("/owners/{}/media", owner_id))
}

/// Test application: server and owned storage directory.
pub struct TestApp {
    pub server: TestServer,
    pub temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Number of files currently stored on disk.
    pub fn stored_file_count(&self) -> usize {
        fn count(dir: &std::path::Path) -> usize {
            std::fs::read_dir(dir)
                .map(|entries| {
                    entries
                        .filter_map(Result::ok)
                        .map(|e| {
                            let path = e.path();
                            if path.is_dir() {
                                count(&path)
                            } else {
                                1
                            }
                        })
                        .sum()
                })
                .unwrap_or(0)
        }
        count(self.temp_dir.path())
    }
}

pub fn test_config(temp_dir: &TempDir) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        cors_origins: vec!["*".to_string()],
        storage_path: temp_dir.path().display().to_string(),
        public_base_url: "http://localhost/files".to_string(),
        api_token: Some(auth::TEST_API_TOKEN.to_string()),
        max_payload_bytes: Some(150 * 1024 * 1024),
        max_request_body_bytes: 256 * 1024 * 1024,
    }
}

/// Setup test app with default policy and local storage.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(PolicyTable::defaults(), |_| {}).await
}

pub async fn setup_test_app_with(
    policy: PolicyTable,
    customize: impl FnOnce(&mut ServerConfig),
) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = test_config(&temp_dir);
    customize(&mut config);

    let (_state, router) = setup::build_app(config, policy)
        .await
        .expect("Failed to build app");

    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp { server, temp_dir }
}
