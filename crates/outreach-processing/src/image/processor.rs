//! Image inspection: format sniffing, dimensions and animation detection

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

/// What a raster header says about an image, read without a full decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub animated: bool,
}

pub struct ImageProcessor;

impl ImageProcessor {
    /// Sniff format and dimensions. Fails when the bytes are not a supported image.
    pub fn inspect(data: &[u8]) -> Result<ImageInfo, image::ImageError> {
        let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        let format = reader.format().ok_or_else(|| {
            image::ImageError::Unsupported(image::error::UnsupportedError::from(
                image::error::ImageFormatHint::Unknown,
            ))
        })?;
        let (width, height) = reader.into_dimensions()?;

        Ok(ImageInfo {
            format,
            width,
            height,
            animated: Self::is_animated(format, data),
        })
    }

    /// Full decode of the first frame
    pub fn decode(data: &[u8]) -> Result<DynamicImage, image::ImageError> {
        ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .decode()
    }

    /// Multi-frame GIF, animated WebP or APNG
    pub fn is_animated(format: ImageFormat, data: &[u8]) -> bool {
        match format {
            ImageFormat::Gif => GifDecoder::new(Cursor::new(data))
                .map(|decoder| {
                    decoder
                        .into_frames()
                        .take(2)
                        .filter(|frame| frame.is_ok())
                        .count()
                        > 1
                })
                .unwrap_or(false),
            ImageFormat::Png => Self::png_has_animation_control(data),
            ImageFormat::WebP => Self::webp_has_animation_flag(data),
            _ => false,
        }
    }

    /// APNG files carry an `acTL` chunk before the first `IDAT`.
    fn png_has_animation_control(data: &[u8]) -> bool {
        let mut offset = 8;
        while offset + 8 <= data.len() {
            let length = u32::from_be_bytes([
                data[offset],
                data[offset + 1],
                data[offset + 2],
                data[offset + 3],
            ]) as usize;
            let chunk_type = &data[offset + 4..offset + 8];
            match chunk_type {
                b"acTL" => return true,
                b"IDAT" | b"IEND" => return false,
                _ => {}
            }
            offset = match offset.checked_add(12 + length) {
                Some(next) => next,
                None => return false,
            };
        }
        false
    }

    /// Extended WebP (`VP8X`) header with the animation bit set.
    fn webp_has_animation_flag(data: &[u8]) -> bool {
        const ANIMATION_FLAG: u8 = 0x02;
        data.len() > 20 && &data[12..16] == b"VP8X" && data[20] & ANIMATION_FLAG != 0
    }
}
