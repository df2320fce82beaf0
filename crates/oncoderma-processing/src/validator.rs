//! Upload validator
//!
//! Ordered checks on an untrusted upload. The cheap byte-level checks run first
//! ([`UploadValidator::check_candidate`]); the decode checks need the bytes on
//! disk and run against a scoped temp file ([`UploadValidator::verify_persisted`]).

use std::future::Future;
use std::path::{Path, PathBuf};

use oncoderma_core::models::{ImageDimensions, ImageMetadata, ValidationErrorCode};
use oncoderma_core::validation::{has_valid_signature, normalize_mime_type};
use oncoderma_core::Config;

use crate::image::{probe_image, ProbeError};
use crate::temp_file::TempFileManager;

/// Raw upload as received from the client
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    pub data: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

/// Why an upload was turned away
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct UploadRejection {
    pub code: ValidationErrorCode,
    pub message: String,
}

impl UploadRejection {
    pub fn new(code: ValidationErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Accepted uploads carry their decoded metadata
pub type ValidationVerdict = Result<ImageMetadata, UploadRejection>;

#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_file_size: usize,
    allowed_content_types: Vec<String>,
    min_dimension: u32,
}

impl UploadValidator {
    pub fn new(max_file_size: usize, allowed_content_types: Vec<String>, min_dimension: u32) -> Self {
        Self {
            max_file_size,
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|ct| ct.to_lowercase())
                .collect(),
            min_dimension,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_file_size_bytes,
            config.allowed_content_types.clone(),
            config.min_image_dimension,
        )
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.allowed_content_types
    }

    pub fn min_dimension(&self) -> u32 {
        self.min_dimension
    }

    pub fn validate_content_type(&self, content_type: &str) -> Result<(), UploadRejection> {
        let normalized = normalize_mime_type(content_type);
        if !self.allowed_content_types.iter().any(|ct| ct == &normalized) {
            return Err(UploadRejection::new(
                ValidationErrorCode::InvalidFileType,
                "Invalid file type. Only JPG and PNG images are allowed",
            ));
        }
        Ok(())
    }

    pub fn validate_file_size(&self, size: usize) -> Result<(), UploadRejection> {
        if size == 0 {
            return Err(UploadRejection::new(
                ValidationErrorCode::EmptyFile,
                "The file is empty",
            ));
        }

        if size > self.max_file_size {
            return Err(UploadRejection::new(
                ValidationErrorCode::FileSizeExceeded,
                format!(
                    "The file is too large. Maximum {:.1}MB",
                    self.max_file_size as f64 / (1024.0 * 1024.0)
                ),
            ));
        }

        Ok(())
    }

    pub fn validate_signature(&self, data: &[u8]) -> Result<(), UploadRejection> {
        if !has_valid_signature(data) {
            return Err(UploadRejection::new(
                ValidationErrorCode::InvalidFileSignature,
                "The file is not a valid image",
            ));
        }
        Ok(())
    }

    /// Content type, then size, then magic bytes
    pub fn check_candidate(&self, candidate: &UploadCandidate) -> Result<(), UploadRejection> {
        self.validate_content_type(&candidate.content_type)?;
        self.validate_file_size(candidate.data.len())?;
        self.validate_signature(&candidate.data)?;
        Ok(())
    }

    /// Decode the persisted bytes and enforce the minimum dimensions
    pub async fn verify_persisted(
        &self,
        path: &Path,
        candidate: &UploadCandidate,
    ) -> ValidationVerdict {
        let probed = probe_image(path).await.map_err(|e| match e {
            ProbeError::Undecodable(reason) => {
                tracing::debug!(reason = %reason, "Upload failed independent decode");
                UploadRejection::new(
                    ValidationErrorCode::InvalidImage,
                    "The file is not a valid image or is corrupted",
                )
            }
            ProbeError::Processing(reason) => {
                tracing::warn!(reason = %reason, "Unexpected failure while decoding upload");
                UploadRejection::new(
                    ValidationErrorCode::ImageProcessingError,
                    "Error processing the image. Check that it is a valid file",
                )
            }
        })?;

        if probed.width < self.min_dimension || probed.height < self.min_dimension {
            return Err(UploadRejection::new(
                ValidationErrorCode::ImageTooSmall,
                format!(
                    "The image is too small. Minimum {}x{} pixels",
                    self.min_dimension, self.min_dimension
                ),
            ));
        }

        Ok(ImageMetadata {
            size: candidate.data.len(),
            content_type: normalize_mime_type(&candidate.content_type),
            dimensions: ImageDimensions {
                width: probed.width,
                height: probed.height,
            },
            format: probed.format,
            mode: probed.mode,
        })
    }

    /// Run every check, then hand the still-present temp file and its metadata
    /// to `then`. The file is removed once `then` completes.
    pub async fn validate_then<F, Fut, T>(
        &self,
        candidate: &UploadCandidate,
        temp_files: &TempFileManager,
        then: F,
    ) -> Result<T, UploadRejection>
    where
        F: FnOnce(PathBuf, ImageMetadata) -> Fut,
        Fut: Future<Output = T>,
    {
        self.check_candidate(candidate)?;

        temp_files
            .with_temp(&candidate.data, &candidate.filename, move |path| async move {
                let metadata = self.verify_persisted(&path, candidate).await?;
                Ok::<_, UploadRejection>(then(path, metadata).await)
            })
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to persist upload");
                Err(UploadRejection::new(
                    ValidationErrorCode::ImageProcessingError,
                    "Error processing the image. Check that it is a valid file",
                ))
            })
    }
}
