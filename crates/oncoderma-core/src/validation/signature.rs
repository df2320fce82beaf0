//! Magic-number checks for the accepted image containers

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// JPEG SOI marker followed by an APP0 (JFIF), APP1 (Exif) or DQT segment
const JPEG_PREFIX: [u8; 3] = [0xFF, 0xD8, 0xFF];
const JPEG_FOURTH_BYTES: [u8; 3] = [0xE0, 0xE1, 0xDB];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSignature {
    Jpeg,
    Png,
}

/// Identify the container from its leading bytes
pub fn detect_signature(data: &[u8]) -> Option<ImageSignature> {
    if data.starts_with(&PNG_SIGNATURE) {
        return Some(ImageSignature::Png);
    }

    if data.len() >= 4 && data.starts_with(&JPEG_PREFIX) && JPEG_FOURTH_BYTES.contains(&data[3]) {
        return Some(ImageSignature::Jpeg);
    }

    None
}

pub fn has_valid_signature(data: &[u8]) -> bool {
    detect_signature(data).is_some()
}
