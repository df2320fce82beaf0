//! Image probing - independent decode of a persisted upload

use image::{ColorType, GenericImageView, ImageError, ImageFormat, ImageReader};
use std::io;
use std::path::{Path, PathBuf};

/// Facts read from a fully decoded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedImage {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub mode: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The bytes are not a decodable image
    #[error("image could not be decoded: {0}")]
    Undecodable(String),

    /// Decoding could not run to completion for reasons unrelated to the bytes
    #[error("image processing failed: {0}")]
    Processing(String),
}

/// Decode the file at `path` on the blocking pool and report its shape
pub async fn probe_image(path: &Path) -> Result<ProbedImage, ProbeError> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || probe_image_blocking(&path))
        .await
        .map_err(|e| ProbeError::Processing(format!("decode task failed: {}", e)))?
}

/// Read only the header dimensions, without decoding pixel data
pub async fn read_dimensions(path: &Path) -> Result<(u32, u32), ProbeError> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        image::image_dimensions(&path).map_err(classify_image_error)
    })
    .await
    .map_err(|e| ProbeError::Processing(format!("decode task failed: {}", e)))?
}

fn probe_image_blocking(path: &Path) -> Result<ProbedImage, ProbeError> {
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| ProbeError::Processing(format!("failed to open image: {}", e)))?;

    let format = reader.format().map(format_name);
    let img = reader.decode().map_err(classify_image_error)?;
    let (width, height) = img.dimensions();

    Ok(ProbedImage {
        width,
        height,
        format: format.unwrap_or_else(|| "UNKNOWN".to_string()),
        mode: color_mode(img.color()).to_string(),
    })
}

fn classify_image_error(err: ImageError) -> ProbeError {
    match err {
        ImageError::Decoding(e) => ProbeError::Undecodable(e.to_string()),
        ImageError::Unsupported(e) => ProbeError::Undecodable(e.to_string()),
        ImageError::IoError(e)
            if matches!(
                e.kind(),
                io::ErrorKind::UnexpectedEof | io::ErrorKind::InvalidData
            ) =>
        {
            ProbeError::Undecodable(e.to_string())
        }
        other => ProbeError::Processing(other.to_string()),
    }
}

fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "JPEG".to_string(),
        ImageFormat::Png => "PNG".to_string(),
        other => format!("{:?}", other).to_uppercase(),
    }
}

/// Short color-mode labels ("RGB", "RGBA", "L", ...)
fn color_mode(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "I;16",
        ColorType::La16 => "LA;16",
        ColorType::Rgb16 => "RGB;16",
        ColorType::Rgba16 => "RGBA;16",
        ColorType::Rgb32F => "RGBF",
        ColorType::Rgba32F => "RGBAF",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, RgbImage};
    use std::io::Cursor;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let img: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[tokio::test]
    async fn test_probe_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "ok.png", 200, 120);

        let probed = probe_image(&path).await.unwrap();
        assert_eq!(probed.width, 200);
        assert_eq!(probed.height, 120);
        assert_eq!(probed.format, "PNG");
        assert_eq!(probed.mode, "RGB");

        assert_eq!(read_dimensions(&path).await.unwrap(), (200, 120));
    }

    #[tokio::test]
    async fn test_truncated_png_is_undecodable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "full.png", 64, 64);
        let bytes = std::fs::read(&path).unwrap();
        let truncated = dir.path().join("truncated.png");
        std::fs::write(&truncated, &bytes[..bytes.len() / 3]).unwrap();

        let err = probe_image(&truncated).await.unwrap_err();
        assert!(matches!(err, ProbeError::Undecodable(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_missing_file_is_processing_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = probe_image(&dir.path().join("gone.png")).await.unwrap_err();
        assert!(matches!(err, ProbeError::Processing(_)));
    }
}
