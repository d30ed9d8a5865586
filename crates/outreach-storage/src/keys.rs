//! Shared key generation for storage backends.
//!
//! Key format: `{category}/{owner_id}/{uuid}-{filename}`.

use outreach_core::MediaCategory;
use uuid::Uuid;

const MAX_KEY_FILENAME_LENGTH: usize = 120;

/// Generate a storage key for a file owned by `owner_id`.
///
/// Owner id and file name are reduced to `[A-Za-z0-9._-]` so a key can never contain
/// path separators or traversal sequences.
pub fn generate_storage_key(
    id: Uuid,
    owner_id: &str,
    category: MediaCategory,
    filename: &str,
) -> String {
    format!(
        "{}/{}/{}-{}",
        category.as_str(),
        sanitize_segment(owner_id),
        id,
        sanitize_segment(filename)
    )
}

/// Key prefix under which every file of `owner_id` in `category` is stored.
pub fn owner_prefix(owner_id: &str, category: MediaCategory) -> String {
    format!("{}/{}/", category.as_str(), sanitize_segment(owner_id))
}

/// True when `key` names a file directly inside the owner's directory for `category`.
pub fn key_belongs_to(key: &str, owner_id: &str, category: MediaCategory) -> bool {
    match key.strip_prefix(&owner_prefix(owner_id, category)) {
        Some(rest) => !rest.is_empty() && !rest.contains('/') && !rest.contains(".."),
        None => false,
    }
}

fn sanitize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_KEY_FILENAME_LENGTH)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.replace("..", "_");
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}
