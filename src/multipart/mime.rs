//! Filename-based image content types.
//!
//! The vendor validates the declared part type, so it is derived from the
//! filename alone and never from the uploaded bytes.

use std::path::Path;

pub const IMAGE_JPEG: &str = "image/jpeg";
pub const IMAGE_PNG: &str = "image/png";
pub const IMAGE_WEBP: &str = "image/webp";

pub fn detect_image_mime_type(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => IMAGE_JPEG,
        "png" => IMAGE_PNG,
        "webp" => IMAGE_WEBP,
        other if other.starts_with("jp") => IMAGE_JPEG,
        _ => IMAGE_PNG,
    }
}
