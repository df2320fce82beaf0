//! Validation modules

pub mod filename;
pub mod signature;

pub use filename::{
    file_extension, sanitize_filename, unique_storage_name, FALLBACK_FILENAME, MAX_FILENAME_LENGTH,
};
pub use signature::{detect_signature, has_valid_signature, ImageSignature};

/// Normalize MIME type by stripping parameters (e.g. "image/jpeg; charset=utf-8" -> "image/jpeg").
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_mime_type() {
        assert_eq!(normalize_mime_type("image/PNG"), "image/png");
        assert_eq!(normalize_mime_type("image/jpeg; charset=utf-8"), "image/jpeg");
        assert_eq!(normalize_mime_type("  text/plain "), "text/plain");
    }
}
