//! Image processing module
//!
//! - Format, dimension and animation inspection (processor)
//! - Envelope fitting and resampling (resize)

pub mod processor;
pub mod resize;

pub use processor::{ImageInfo, ImageProcessor};
pub use resize::ImageResize;
