//! Test fixtures: image bytes generated with the `image` crate.

use axum_test::multipart::{MultipartForm, Part};
use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 120])
    });
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

/// Valid PNG signature followed by garbage
pub fn corrupt_png() -> Vec<u8> {
    let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0xAB; 64]);
    bytes
}

/// Multipart form with a single `file` field
pub fn file_form(data: Vec<u8>, filename: &str, mime_type: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(data).file_name(filename).mime_type(mime_type),
    )
}

pub const RAW_BOUNDARY: &str = "oncoderma-test-boundary";

/// `Content-Type` header value matching [`raw_file_body`]
pub fn raw_content_type() -> String {
    format!("multipart/form-data; boundary={}", RAW_BOUNDARY)
}

/// Hand-framed multipart body with a single `file` field, for requests whose
/// headers the test controls
pub fn raw_file_body(data: &[u8], filename: &str, mime_type: &str) -> Vec<u8> {
    let mut body = format!(
        "--{RAW_BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {mime_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{RAW_BOUNDARY}--\r\n").as_bytes());
    body
}
