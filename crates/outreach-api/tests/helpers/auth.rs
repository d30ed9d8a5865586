/// Bearer token configured on the test server.
pub const TEST_API_TOKEN: &str = "test-api-token-at-least-32-characters-long";
