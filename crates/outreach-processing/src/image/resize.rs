use image::{DynamicImage, GenericImageView};

/// Envelope fitting and resampling
pub struct ImageResize;

impl ImageResize {
    /// Target dimensions for an image that must fit inside `max_width` x `max_height`.
    ///
    /// Returns `None` when the image already fits. Otherwise both sides are scaled by
    /// `min(max_width / width, max_height / height)` and floored, never below 1.
    pub fn fit_within(
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    ) -> Option<(u32, u32)> {
        if width == 0 || height == 0 || (width <= max_width && height <= max_height) {
            return None;
        }

        let scale = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
        let new_width = ((width as f64 * scale).floor() as u32).clamp(1, max_width);
        let new_height = ((height as f64 * scale).floor() as u32).clamp(1, max_height);

        Some((new_width, new_height))
    }

    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> image::imageops::FilterType {
        let width_ratio = orig_width as f32 / new_width as f32;
        let height_ratio = orig_height as f32 / new_height as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            image::imageops::FilterType::Triangle
        } else if max_ratio > 1.5 {
            image::imageops::FilterType::CatmullRom
        } else {
            image::imageops::FilterType::Lanczos3
        }
    }

    /// Resize image to exact dimensions
    pub fn resize_image(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        let filter = Self::select_filter(orig_width, orig_height, width, height);
        img.resize_exact(width, height, filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_already() {
        assert_eq!(ImageResize::fit_within(1920, 1080, 1920, 1080), None);
        assert_eq!(ImageResize::fit_within(100, 50, 320, 320), None);
    }

    #[test]
    fn test_landscape_bounded_by_width() {
        assert_eq!(ImageResize::fit_within(4000, 2000, 1920, 1080), Some((1920, 960)));
    }

    #[test]
    fn test_portrait_bounded_by_height() {
        assert_eq!(ImageResize::fit_within(3000, 4000, 1920, 1080), Some((810, 1080)));
    }

    #[test]
    fn test_avatar_square() {
        assert_eq!(ImageResize::fit_within(1000, 1000, 320, 320), Some((320, 320)));
    }

    #[test]
    fn test_extreme_ratio_never_zero() {
        assert_eq!(ImageResize::fit_within(100_000, 10, 320, 320), Some((320, 1)));
    }

    #[test]
    fn test_aspect_ratio_preserved_within_one_pixel() {
        let cases = [
            (4032, 3024),
            (3024, 4032),
            (2000, 1999),
            (7, 5000),
            (5000, 7),
            (1921, 1081),
            (12345, 6789),
        ];
        for (w, h) in cases {
            let (nw, nh) = ImageResize::fit_within(w, h, 1920, 1080).unwrap();
            assert!(nw <= 1920 && nh <= 1080, "{}x{} -> {}x{}", w, h, nw, nh);
            let expected_h = nw as f64 * h as f64 / w as f64;
            let expected_w = nh as f64 * w as f64 / h as f64;
            assert!(
                (nh as f64 - expected_h).abs() <= 1.0 || (nw as f64 - expected_w).abs() <= 1.0,
                "{}x{} -> {}x{}",
                w,
                h,
                nw,
                nh
            );
        }
    }

    #[test]
    fn test_select_filter() {
        assert_eq!(
            ImageResize::select_filter(4000, 4000, 1000, 1000),
            image::imageops::FilterType::Triangle
        );
        assert_eq!(
            ImageResize::select_filter(1000, 1000, 900, 900),
            image::imageops::FilterType::Lanczos3
        );
    }
}
