use crate::image::{ImageProcessor, ImageResize};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use outreach_core::validation::{normalize_mime_type, with_extension};
use outreach_core::{CandidateFile, CompressionConfig, MediaCategory, RecompressionProfile};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;

/// Canonical output format for recompressed images
pub const CANONICAL_MIME_TYPE: &str = "image/jpeg";
const CANONICAL_FORMAT: ImageFormat = ImageFormat::Jpeg;
const CANONICAL_EXTENSION: &str = "jpg";

/// Why a file was returned unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassThroughReason {
    /// Category or mime type has no recompression profile
    NotApplicable,
    /// Already canonical and inside the envelope
    AlreadyOptimal,
    /// Multi-frame image; recompressing would drop the animation
    Animated,
}

/// Structured warning for a file that could not be recompressed and was kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompressionWarning {
    pub file_name: String,
    pub kind: WarningKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    DecodeFailed,
    EncodeFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompressionOutcome {
    Resized {
        from: (u32, u32),
        to: (u32, u32),
    },
    Reencoded {
        source_format: String,
    },
    PassedThrough {
        reason: PassThroughReason,
    },
    Failed {
        warning: CompressionWarning,
    },
}

/// One result per accepted file. `output` replaces `original` for transfer only.
#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub original: CandidateFile,
    pub output: CandidateFile,
    pub original_size_bytes: u64,
    pub output_size_bytes: u64,
    pub outcome: CompressionOutcome,
}

impl CompressionResult {
    fn unchanged(file: CandidateFile, outcome: CompressionOutcome) -> Self {
        Self {
            original_size_bytes: file.size_bytes,
            output_size_bytes: file.size_bytes,
            output: file.clone(),
            original: file,
            outcome,
        }
    }

    pub fn warning(&self) -> Option<&CompressionWarning> {
        match &self.outcome {
            CompressionOutcome::Failed { warning } => Some(warning),
            _ => None,
        }
    }

    pub fn saved_bytes(&self) -> i64 {
        self.original_size_bytes as i64 - self.output_size_bytes as i64
    }
}

/// Emitted once per finished file, in input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionProgress {
    pub completed: usize,
    pub total: usize,
}

/// Totals over a batch of compression results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompressionStats {
    pub files: usize,
    pub recompressed: usize,
    pub passed_through: usize,
    pub failed: usize,
    pub bytes_before: u64,
    pub bytes_after: u64,
}

impl CompressionStats {
    pub fn from_results(results: &[CompressionResult]) -> Self {
        let mut stats = CompressionStats {
            files: results.len(),
            ..Default::default()
        };
        for result in results {
            stats.bytes_before += result.original_size_bytes;
            stats.bytes_after += result.output_size_bytes;
            match result.outcome {
                CompressionOutcome::Resized { .. } | CompressionOutcome::Reencoded { .. } => {
                    stats.recompressed += 1
                }
                CompressionOutcome::PassedThrough { .. } => stats.passed_through += 1,
                CompressionOutcome::Failed { .. } => stats.failed += 1,
            }
        }
        stats
    }
}

/// Shrinks accepted images to their category envelope before transfer.
#[derive(Debug, Clone, Default)]
pub struct Recompressor {
    config: Arc<CompressionConfig>,
}

impl Recompressor {
    pub fn new(config: Arc<CompressionConfig>) -> Self {
        Self { config }
    }

    /// Recompress one file. Never fails: undecodable images come back unchanged with a warning.
    pub fn compress(&self, file: CandidateFile, category: MediaCategory) -> CompressionResult {
        let profile = match self.config.profile_for(category) {
            Some(profile) if normalize_mime_type(&file.mime_type).starts_with("image/") => profile,
            _ => {
                return CompressionResult::unchanged(
                    file,
                    CompressionOutcome::PassedThrough {
                        reason: PassThroughReason::NotApplicable,
                    },
                )
            }
        };

        let start = Instant::now();
        let result = Self::compress_with_profile(file, &profile);

        match &result.outcome {
            CompressionOutcome::Failed { warning } => tracing::warn!(
                file_name = %warning.file_name,
                category = %category,
                kind = ?warning.kind,
                error = %warning.message,
                "Recompression failed, keeping original file"
            ),
            outcome => tracing::debug!(
                file_name = %result.original.name,
                category = %category,
                outcome = ?outcome,
                size_before = result.original_size_bytes,
                size_after = result.output_size_bytes,
                duration_ms = start.elapsed().as_millis() as u64,
                "Recompressed image"
            ),
        }

        result
    }

    fn compress_with_profile(file: CandidateFile, profile: &RecompressionProfile) -> CompressionResult {
        let info = match ImageProcessor::inspect(&file.data) {
            Ok(info) => info,
            Err(e) => return Self::fallback(file, WarningKind::DecodeFailed, e.to_string()),
        };

        if info.animated {
            return CompressionResult::unchanged(
                file,
                CompressionOutcome::PassedThrough {
                    reason: PassThroughReason::Animated,
                },
            );
        }

        let target = ImageResize::fit_within(info.width, info.height, profile.max_width, profile.max_height);
        if target.is_none() && info.format == CANONICAL_FORMAT {
            return CompressionResult::unchanged(
                file,
                CompressionOutcome::PassedThrough {
                    reason: PassThroughReason::AlreadyOptimal,
                },
            );
        }

        let img = match ImageProcessor::decode(&file.data) {
            Ok(img) => img,
            Err(e) => return Self::fallback(file, WarningKind::DecodeFailed, e.to_string()),
        };

        let (img, outcome) = match target {
            Some((width, height)) => (
                ImageResize::resize_image(&img, width, height),
                CompressionOutcome::Resized {
                    from: (info.width, info.height),
                    to: (width, height),
                },
            ),
            None => (
                img,
                CompressionOutcome::Reencoded {
                    source_format: format!("{:?}", info.format).to_lowercase(),
                },
            ),
        };

        let encoded = match encode_jpeg(&img, profile.quality_percent()) {
            Ok(encoded) => encoded,
            Err(e) => return Self::fallback(file, WarningKind::EncodeFailed, e.to_string()),
        };

        let output = CandidateFile::new(
            with_extension(&file.name, CANONICAL_EXTENSION),
            CANONICAL_MIME_TYPE,
            encoded,
        );

        CompressionResult {
            original_size_bytes: file.size_bytes,
            output_size_bytes: output.size_bytes,
            original: file,
            output,
            outcome,
        }
    }

    fn fallback(file: CandidateFile, kind: WarningKind, message: String) -> CompressionResult {
        let warning = CompressionWarning {
            file_name: file.name.clone(),
            kind,
            message,
        };
        CompressionResult::unchanged(file, CompressionOutcome::Failed { warning })
    }

    /// Recompress a batch with at most `concurrency` images in flight.
    ///
    /// Results keep input order and progress is reported once per file with a strictly
    /// increasing `completed` count.
    pub async fn compress_batch(
        &self,
        files: Vec<CandidateFile>,
        category: MediaCategory,
        concurrency: usize,
        progress: Option<&UnboundedSender<CompressionProgress>>,
    ) -> Vec<CompressionResult> {
        let total = files.len();
        let concurrency = concurrency.max(1);

        let mut pending = stream::iter(files.into_iter().map(|file| {
            let recompressor = self.clone();
            let fallback = file.clone();
            async move {
                match tokio::task::spawn_blocking(move || recompressor.compress(file, category)).await
                {
                    Ok(result) => result,
                    Err(e) => Self::fallback(fallback, WarningKind::EncodeFailed, e.to_string()),
                }
            }
        }))
        .buffered(concurrency);

        let mut results = Vec::with_capacity(total);
        while let Some(result) = pending.next().await {
            results.push(result);
            if let Some(tx) = progress {
                let _ = tx.send(CompressionProgress {
                    completed: results.len(),
                    total,
                });
            }
        }

        results
    }
}

/// Encode as baseline JPEG, flattening any alpha channel onto white.
fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Bytes, image::ImageError> {
    let rgb = if img.color().has_alpha() {
        flatten_onto_white(img)
    } else {
        img.to_rgb8()
    };

    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(rgb).write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality))?;
    Ok(Bytes::from(buffer))
}

fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    let (width, height) = img.dimensions();
    let rgba = img.to_rgba8();
    RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u16;
        let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}
