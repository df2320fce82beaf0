//! Filename sanitization and storage-name generation

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

pub const MAX_FILENAME_LENGTH: usize = 255;
pub const FALLBACK_FILENAME: &str = "unnamed_file";
const RESERVED_PREFIX: &str = "safe_";

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.\-]").expect("static regex"));

static RESERVED_STEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(CON|PRN|AUX|NUL|COM[1-9]|LPT[1-9])$").expect("static regex")
});

/// Split into (stem, extension) where the extension keeps its leading dot.
/// Leading dots belong to the stem, so ".env" has no extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if name[..idx].chars().any(|c| c != '.') => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}

/// Make a client-supplied filename safe to log and to derive an extension from.
///
/// The result only contains `[A-Za-z0-9_.-]`, never names a reserved device,
/// fits in 255 bytes and is never empty. Applying it twice is the same as once.
pub fn sanitize_filename(filename: &str) -> String {
    let name = truncate_to_limit(UNSAFE_CHARS.replace_all(filename, "").into_owned());

    // Checked after truncation, which can shorten the stem down to a device name
    let (stem, _) = split_extension(&name);
    let name = if RESERVED_STEM.is_match(stem) {
        truncate_to_limit(format!("{}{}", RESERVED_PREFIX, name))
    } else {
        name
    };

    if name.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        name
    }
}

/// Cut an ASCII name to [`MAX_FILENAME_LENGTH`], keeping the extension when it fits.
fn truncate_to_limit(name: String) -> String {
    if name.len() <= MAX_FILENAME_LENGTH {
        return name;
    }

    let (stem, ext) = split_extension(&name);
    if ext.len() < MAX_FILENAME_LENGTH {
        format!("{}{}", &stem[..MAX_FILENAME_LENGTH - ext.len()], ext)
    } else {
        name[..MAX_FILENAME_LENGTH].to_string()
    }
}

/// Lowercased extension (with dot) of a sanitized filename
pub fn file_extension(filename: &str) -> String {
    let (_, ext) = split_extension(filename);
    ext.to_lowercase()
}

/// Storage name for an upload: a random v4 id plus the sanitized extension
pub fn unique_storage_name(original_filename: &str) -> String {
    let safe = sanitize_filename(original_filename);
    format!("{}{}", Uuid::new_v4().simple(), file_extension(&safe))
}
