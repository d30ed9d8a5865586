//! API constants

/// Prefix for versioned routes
pub const API_PREFIX: &str = "/api/v0";

/// Prefix under which stored files are served
pub const FILES_PREFIX: &str = "/files";

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";
