//! Multipart extraction for the analysis upload

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use oncoderma_core::AppError;

pub const FILE_FIELD: &str = "file";

#[derive(Debug)]
pub struct UploadedFile {
    pub data: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("Upload body too large: {}", e.body_text()))
    } else {
        AppError::InvalidInput(format!("Failed to read multipart body: {}", e.body_text()))
    }
}

/// Read the `file` field.
///
/// `Ok(None)` when no usable file was sent: the field is missing or its
/// filename is empty. Other fields are drained and ignored.
pub async fn extract_multipart_file(
    mut multipart: Multipart,
) -> Result<Option<UploadedFile>, AppError> {
    let mut upload: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        if upload.is_some() {
            return Err(AppError::InvalidInput(
                "Multiple file fields are not allowed; send exactly one field named 'file'"
                    .to_string(),
            ));
        }

        let filename = field.file_name().unwrap_or_default().trim().to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(multipart_error)?;

        if filename.is_empty() {
            continue;
        }

        upload = Some(UploadedFile {
            data: data.to_vec(),
            filename,
            content_type,
        });
    }

    Ok(upload)
}
