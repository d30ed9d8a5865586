//! Configuration module
//!
//! Upload policy, recompression profiles and server settings. Each is loaded once at
//! process start and passed to the components that need it.

pub mod policy;
pub mod server;

pub use policy::{
    parse_dimensions, CompressionConfig, PolicyEntry, PolicyError, PolicyTable,
    RecompressionProfile,
};
pub use server::ServerConfig;
