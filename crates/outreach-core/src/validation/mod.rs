//! Mime type helpers shared by the client validator and the ingestion guard.

/// Maximum file name length, in characters.
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Normalize a MIME type: strip parameters and lowercase
/// (e.g. "Image/JPEG; charset=utf-8" -> "image/jpeg").
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase()
}

/// Guess the canonical MIME type for a file name from its extension.
pub fn mime_for_filename(filename: &str) -> &'static str {
    let extension = match filename.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => return "application/octet-stream",
    };

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Replace the extension of a file name, or append one when missing.
pub fn with_extension(filename: &str, extension: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{}.{}", stem, extension),
        _ => format!("{}.{}", filename, extension),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_mime_type() {
        assert_eq!(normalize_mime_type("image/jpeg"), "image/jpeg");
        assert_eq!(normalize_mime_type("Image/PNG; charset=utf-8"), "image/png");
        assert_eq!(normalize_mime_type("  video/mp4 ;codecs=avc1"), "video/mp4");
    }

    #[test]
    fn test_mime_for_filename() {
        assert_eq!(mime_for_filename("visit.JPG"), "image/jpeg");
        assert_eq!(mime_for_filename("report.pdf"), "application/pdf");
        assert_eq!(mime_for_filename("noext"), "application/octet-stream");
    }

    #[test]
    fn test_with_extension() {
        assert_eq!(with_extension("photo.png", "jpg"), "photo.jpg");
        assert_eq!(with_extension("photo", "jpg"), "photo.jpg");
        assert_eq!(with_extension("archive.tar.gz", "jpg"), "archive.tar.jpg");
        assert_eq!(with_extension(".hidden", "jpg"), ".hidden.jpg");
    }
}
