//! Per-category upload policy and recompression profiles.
//!
//! The table is built once at startup (environment variables, optionally replaced by a
//! JSON policy file) and then shared read-only by the validator, the recompressor and the
//! ingestion guard.

use crate::models::MediaCategory;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use utoipa::ToSchema;

const MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("Unknown media category: {0}")]
    UnknownCategory(String),
}

/// Limits governing one media category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PolicyEntry {
    pub category: MediaCategory,
    pub max_size_bytes: u64,
    pub max_count: usize,
    #[schema(value_type = Vec<String>)]
    pub allowed_mime_types: BTreeSet<String>,
    #[serde(default)]
    pub aggregate_ceiling_bytes: Option<u64>,
}

impl PolicyEntry {
    pub fn allows_mime_type(&self, normalized: &str) -> bool {
        self.allowed_mime_types.contains(normalized)
    }
}

/// Immutable lookup of policy by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyTable {
    entries: BTreeMap<MediaCategory, PolicyEntry>,
}

impl PolicyTable {
    pub fn new(entries: impl IntoIterator<Item = PolicyEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|mut entry| {
                    entry.allowed_mime_types = entry
                        .allowed_mime_types
                        .iter()
                        .map(|t| crate::validation::normalize_mime_type(t))
                        .collect();
                    (entry.category, entry)
                })
                .collect(),
        }
    }

    pub fn lookup(&self, category: MediaCategory) -> Result<&PolicyEntry, PolicyError> {
        self.entries
            .get(&category)
            .ok_or_else(|| PolicyError::UnknownCategory(category.to_string()))
    }

    /// Resolve a multipart field name to a registered category.
    /// Entry for a multipart field name; `None` when the field names no registered category.
    pub fn entry_for_field(&self, field: &str) -> Option<&PolicyEntry> {
        MediaCategory::from_field_name(field).and_then(|c| self.entries.get(&c))
    }

    pub fn categories(&self) -> impl Iterator<Item = MediaCategory> + '_ {
        self.entries.keys().copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = &PolicyEntry> {
        self.entries.values()
    }

    /// Built-in policy for every category, ignoring the environment.
    pub fn defaults() -> Self {
        let no_overrides = |_: &str| None::<String>;
        Self::new(
            MediaCategory::ALL
                .iter()
                .filter_map(|&category| entry_from_lookup(category, &no_overrides).ok()),
        )
    }

    /// Load from environment variables, then replace with `UPLOAD_POLICY_FILE` when set.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        if let Ok(path) = std::env::var("UPLOAD_POLICY_FILE") {
            return Self::from_file(&path);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment-shaped keys).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = lookup("UPLOAD_CATEGORIES")
            .unwrap_or_else(|| "photo,video,document,avatar".to_string());

        let mut entries = Vec::new();
        for name in enabled.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let category: MediaCategory = name
                .parse()
                .map_err(|e: String| anyhow::anyhow!("UPLOAD_CATEGORIES: {}", e))?;
            entries.push(entry_from_lookup(category, &lookup)?);
        }

        let table = Self::new(entries);
        table.validate()?;
        Ok(table)
    }

    /// Load a JSON policy file: `{"policies": [PolicyEntry, ...]}`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read policy file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Invalid policy file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self, anyhow::Error> {
        #[derive(Deserialize)]
        struct PolicyFile {
            policies: Vec<PolicyEntry>,
        }

        let file: PolicyFile = serde_json::from_str(raw)?;
        let mut seen = BTreeSet::new();
        for entry in &file.policies {
            if !seen.insert(entry.category) {
                return Err(anyhow::anyhow!(
                    "Category '{}' is defined more than once",
                    entry.category
                ));
            }
        }

        let table = Self::new(file.policies);
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.entries.is_empty() {
            return Err(anyhow::anyhow!(
                "At least one upload category must be enabled"
            ));
        }

        for entry in self.entries.values() {
            if entry.max_size_bytes == 0 {
                return Err(anyhow::anyhow!(
                    "{}: maximum file size must be greater than zero",
                    entry.category
                ));
            }
            if entry.max_count == 0 {
                return Err(anyhow::anyhow!(
                    "{}: maximum file count must be greater than zero",
                    entry.category
                ));
            }
            if entry.allowed_mime_types.is_empty() {
                return Err(anyhow::anyhow!(
                    "{}: at least one allowed type is required",
                    entry.category
                ));
            }
            if let Some(ceiling) = entry.aggregate_ceiling_bytes {
                if ceiling < entry.max_size_bytes {
                    return Err(anyhow::anyhow!(
                        "{}: aggregate ceiling must not be smaller than the per-file maximum",
                        entry.category
                    ));
                }
            }
        }

        Ok(())
    }
}

fn default_entry(category: MediaCategory) -> (u64, usize, &'static str, u64) {
    // (max size MB, max count, allowed types, aggregate ceiling MB; 0 = none)
    match category {
        MediaCategory::Photo => (
            10,
            10,
            "image/jpeg,image/png,image/webp,image/gif,image/heic",
            60,
        ),
        MediaCategory::Video => (100, 3, "video/mp4,video/quicktime,video/webm", 0),
        MediaCategory::Document => (
            20,
            5,
            "application/pdf,application/msword,application/vnd.openxmlformats-officedocument.wordprocessingml.document,text/plain",
            50,
        ),
        MediaCategory::Avatar => (5, 1, "image/jpeg,image/png,image/webp", 0),
    }
}

fn entry_from_lookup<F>(category: MediaCategory, lookup: &F) -> Result<PolicyEntry, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
{
    let prefix = category.as_str().to_uppercase();
    let (size_mb, count, types, ceiling_mb) = default_entry(category);

    let size_key = format!("{}_MAX_SIZE_MB", prefix);
    let ceiling_key = format!("{}_AGGREGATE_CEILING_MB", prefix);
    let max_size_bytes = mb_to_bytes(parse_or(lookup, &size_key, size_mb)?, &size_key)?;
    let max_count = parse_or(lookup, &format!("{}_MAX_COUNT", prefix), count)?;
    let ceiling_bytes = mb_to_bytes(parse_or(lookup, &ceiling_key, ceiling_mb)?, &ceiling_key)?;

    let allowed_mime_types = lookup(&format!("{}_ALLOWED_TYPES", prefix))
        .unwrap_or_else(|| types.to_string())
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    Ok(PolicyEntry {
        category,
        max_size_bytes,
        max_count,
        allowed_mime_types,
        aggregate_ceiling_bytes: (ceiling_bytes > 0).then_some(ceiling_bytes),
    })
}

fn mb_to_bytes(mb: u64, key: &str) -> Result<u64, anyhow::Error> {
    mb.checked_mul(MB)
        .ok_or_else(|| anyhow::anyhow!("{} is too large", key))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", key)),
        None => Ok(default),
    }
}

/// Pixel envelope and quality factor for one image category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecompressionProfile {
    pub max_width: u32,
    pub max_height: u32,
    /// Quality factor in (0, 1]
    pub quality: f32,
}

impl RecompressionProfile {
    pub const PHOTO: RecompressionProfile = RecompressionProfile {
        max_width: 1920,
        max_height: 1080,
        quality: 0.85,
    };

    pub const AVATAR: RecompressionProfile = RecompressionProfile {
        max_width: 320,
        max_height: 320,
        quality: 0.80,
    };

    /// Quality as an encoder percentage (1-100).
    pub fn quality_percent(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Parse an envelope such as "1920x1080".
pub fn parse_dimensions(s: &str) -> Result<(u32, u32), anyhow::Error> {
    let (w, h) = s
        .trim()
        .to_lowercase()
        .split_once('x')
        .map(|(w, h)| (w.trim().to_string(), h.trim().to_string()))
        .ok_or_else(|| anyhow::anyhow!("Invalid dimensions '{}', expected WIDTHxHEIGHT", s))?;
    let width: u32 = w
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid width in '{}'", s))?;
    let height: u32 = h
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid height in '{}'", s))?;
    if width == 0 || height == 0 {
        return Err(anyhow::anyhow!("Dimensions must be non-zero: '{}'", s));
    }
    Ok((width, height))
}

/// Recompression profiles for the image-bearing categories.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionConfig {
    pub photo: RecompressionProfile,
    pub avatar: RecompressionProfile,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            photo: RecompressionProfile::PHOTO,
            avatar: RecompressionProfile::AVATAR,
        }
    }
}

impl CompressionConfig {
    pub fn profile_for(&self, category: MediaCategory) -> Option<RecompressionProfile> {
        match category {
            MediaCategory::Photo => Some(self.photo),
            MediaCategory::Avatar => Some(self.avatar),
            MediaCategory::Video | MediaCategory::Document => None,
        }
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            photo: profile_from_lookup(&lookup, "PHOTO", RecompressionProfile::PHOTO)?,
            avatar: profile_from_lookup(&lookup, "AVATAR", RecompressionProfile::AVATAR)?,
        })
    }
}

fn profile_from_lookup<F>(
    lookup: &F,
    prefix: &str,
    default: RecompressionProfile,
) -> Result<RecompressionProfile, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
{
    let (max_width, max_height) = match lookup(&format!("{}_MAX_DIMENSIONS", prefix)) {
        Some(raw) => parse_dimensions(&raw)?,
        None => (default.max_width, default.max_height),
    };
    let quality: f32 = parse_or(lookup, &format!("{}_QUALITY", prefix), default.quality)?;
    if !(quality > 0.0 && quality <= 1.0) {
        return Err(anyhow::anyhow!(
            "{}_QUALITY must be in (0, 1], got {}",
            prefix,
            quality
        ));
    }

    Ok(RecompressionProfile {
        max_width,
        max_height,
        quality,
    })
}
