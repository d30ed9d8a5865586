use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Media category of an upload batch. Every batch belongs to exactly one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Photo,
    Video,
    Document,
    Avatar,
}

impl MediaCategory {
    pub const ALL: [MediaCategory; 4] = [
        MediaCategory::Photo,
        MediaCategory::Video,
        MediaCategory::Document,
        MediaCategory::Avatar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::Photo => "photo",
            MediaCategory::Video => "video",
            MediaCategory::Document => "document",
            MediaCategory::Avatar => "avatar",
        }
    }

    /// Multipart field name carrying files of this category.
    pub fn field_name(&self) -> &'static str {
        match self {
            MediaCategory::Photo => "photos",
            MediaCategory::Video => "videos",
            MediaCategory::Document => "documents",
            MediaCategory::Avatar => "avatar",
        }
    }

    pub fn from_field_name(field: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.field_name() == field)
    }

    /// Photo and avatar batches carry raster images and are eligible for recompression.
    pub fn is_image(&self) -> bool {
        matches!(self, MediaCategory::Photo | MediaCategory::Avatar)
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "photo" | "photos" => Ok(MediaCategory::Photo),
            "video" | "videos" => Ok(MediaCategory::Video),
            "document" | "documents" => Ok(MediaCategory::Document),
            "avatar" => Ok(MediaCategory::Avatar),
            other => Err(format!("unknown media category '{}'", other)),
        }
    }
}

/// A file selected for upload, held in memory for the duration of one upload operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub data: Bytes,
}

impl CandidateFile {
    /// Build a candidate whose size is taken from the bytes themselves.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size_bytes: data.len() as u64,
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Build a candidate with a claimed size that may differ from the payload.
    pub fn with_claimed_size(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size_bytes: u64,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }
}

/// Persisted pointer to an accepted file; the unit of bulk deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StoredFileReference {
    pub id: Uuid,
    /// Storage key relative to the storage root
    pub path: String,
    pub url: String,
    pub owner_id: String,
    pub category: MediaCategory,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub stored_at: DateTime<Utc>,
}
