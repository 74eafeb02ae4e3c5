//! Image edit: rebuild the inbound multipart form into the vendor envelope.
//!
//! Part order on the wire is `model`, pass-through text fields, image files,
//! then an optional `mask`.

use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::multipart::{detect_image_mime_type, FormFile, MultipartEnvelope};
use crate::types::ImageEditRequest;
use crate::{Error, ErrorContext, Result};

const IMAGE_KEY: &str = "image";
const IMAGE_ARRAY_KEY: &str = "image[]";
const MASK_KEY: &str = "mask";
const MODEL_KEY: &str = "model";

static INDEXED_IMAGE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^image\[(\d+)\]$").expect("static regex"));

/// Image files from the first key that carries any: `image`, then `image[]`,
/// then every `image[N]` ordered by N.
fn collect_images(req: &ImageEditRequest) -> Vec<&FormFile> {
    let form = &req.form;
    for key in [IMAGE_KEY, IMAGE_ARRAY_KEY] {
        let files = form.files(key);
        if !files.is_empty() {
            return files.iter().collect();
        }
    }

    let mut indexed: Vec<(u64, &str)> = form
        .file_keys()
        .filter_map(|key| {
            INDEXED_IMAGE_KEY
                .captures(key)
                .and_then(|c| c.get(1))
                .and_then(|n| n.as_str().parse::<u64>().ok())
                .map(|n| (n, key))
        })
        .collect();
    indexed.sort_by_key(|(n, _)| *n);
    indexed
        .into_iter()
        .flat_map(|(_, key)| form.files(key))
        .collect()
}

fn too_large(file: &FormFile, limit: usize) -> Error {
    Error::validation_with_context(
        format!("multipart form exceeds {} bytes", limit),
        ErrorContext::new()
            .with_details(format!("file {} does not fit", file.filename))
            .with_source("image_edit"),
    )
}

/// Read `file` within what is left of the form budget.
async fn read_within(file: &FormFile, total: &mut usize, limit: usize) -> Result<Bytes> {
    let remaining = limit.saturating_sub(*total);
    let data = file
        .read_at_most(remaining)
        .await?
        .ok_or_else(|| too_large(file, limit))?;
    *total += data.len();
    Ok(data)
}

pub async fn convert_image_edit(
    req: &ImageEditRequest,
    max_form_bytes: usize,
) -> Result<MultipartEnvelope> {
    let form = &req.form;
    if !form.has_files() {
        return Err(Error::validation_with_context(
            "multipart form carries no files",
            ErrorContext::new().with_source("image_edit"),
        ));
    }

    let images = collect_images(req);
    if images.is_empty() {
        return Err(Error::validation_with_context(
            "image is required",
            ErrorContext::new()
                .with_field_path(IMAGE_KEY)
                .with_source("image_edit"),
        ));
    }

    let mut envelope = MultipartEnvelope::new();
    envelope.text(MODEL_KEY, req.image.model.clone());
    for (key, value) in form.fields() {
        if key != MODEL_KEY {
            envelope.text(key.clone(), value.clone());
        }
    }

    let part_name = if images.len() == 1 {
        IMAGE_KEY
    } else {
        IMAGE_ARRAY_KEY
    };
    let mut total = 0usize;
    for file in images {
        let data = read_within(file, &mut total, max_form_bytes).await?;
        envelope.file(
            part_name,
            file.filename.clone(),
            detect_image_mime_type(&file.filename),
            data,
        );
    }

    if let Some(mask) = form.files(MASK_KEY).first() {
        let data = read_within(mask, &mut total, max_form_bytes).await?;
        envelope.file(
            MASK_KEY,
            mask.filename.clone(),
            detect_image_mime_type(&mask.filename),
            data,
        );
    }

    tracing::debug!(
        parts = envelope.parts().len(),
        bytes = total,
        "rebuilt image edit form"
    );
    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multipart::{InboundForm, PartBody};
    use crate::types::ImageRequest;

    fn request(form: InboundForm) -> ImageEditRequest {
        ImageEditRequest {
            image: ImageRequest::new("doubao-seededit-3-0", "make it blue"),
            form,
        }
    }

    fn file_names(env: &MultipartEnvelope) -> Vec<(&str, &str)> {
        env.parts()
            .iter()
            .filter_map(|p| match &p.body {
                PartBody::File { filename, .. } => Some((p.name.as_str(), filename.as_str())),
                PartBody::Text(_) => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_single_image_uses_plain_key() {
        let form = InboundForm::new()
            .with_field("prompt", "make it blue")
            .with_file("image", FormFile::from_bytes("photo.JPG", vec![1u8, 2, 3]));
        let env = convert_image_edit(&request(form), 1024).await.unwrap();
        assert_eq!(file_names(&env), vec![("image", "photo.JPG")]);
        match &env.parts()[2].body {
            PartBody::File { content_type, .. } => assert_eq!(content_type, "image/jpeg"),
            PartBody::Text(_) => panic!("expected file part"),
        }
    }

    #[tokio::test]
    async fn test_two_images_and_mask() {
        let form = InboundForm::new()
            .with_field("model", "ignored-inbound-model")
            .with_field("prompt", "p")
            .with_field("size", "1024x1024")
            .with_file("image[]", FormFile::from_bytes("a.png", vec![1u8]))
            .with_file("image[]", FormFile::from_bytes("b.webp", vec![2u8]))
            .with_file("mask", FormFile::from_bytes("mask.png", vec![3u8]));
        let env = convert_image_edit(&request(form), 1024).await.unwrap();

        let models: Vec<_> = env.parts().iter().filter(|p| p.name == "model").collect();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].body, PartBody::Text("doubao-seededit-3-0".into()));
        assert_eq!(env.parts()[0].name, "model");
        assert_eq!(env.parts()[1].name, "prompt");
        assert_eq!(env.parts()[2].name, "size");
        assert_eq!(
            file_names(&env),
            vec![("image[]", "a.png"), ("image[]", "b.webp"), ("mask", "mask.png")]
        );
    }

    #[tokio::test]
    async fn test_plain_image_key_wins_over_array_key() {
        let form = InboundForm::new()
            .with_file("image", FormFile::from_bytes("a.png", vec![0u8]))
            .with_file("image[]", FormFile::from_bytes("b.png", vec![0u8]))
            .with_file("image[0]", FormFile::from_bytes("c.png", vec![0u8]));
        let env = convert_image_edit(&request(form), 1024).await.unwrap();
        assert_eq!(file_names(&env), vec![("image", "a.png")]);
    }

    #[tokio::test]
    async fn test_array_key_wins_over_indexed_keys() {
        let form = InboundForm::new()
            .with_file("image[1]", FormFile::from_bytes("c.png", vec![0u8]))
            .with_file("image[]", FormFile::from_bytes("a.png", vec![0u8]))
            .with_file("image[]", FormFile::from_bytes("b.png", vec![0u8]));
        let env = convert_image_edit(&request(form), 1024).await.unwrap();
        assert_eq!(
            file_names(&env),
            vec![("image[]", "a.png"), ("image[]", "b.png")]
        );
    }

    #[tokio::test]
    async fn test_indexed_keys_sorted_numerically() {
        let form = InboundForm::new()
            .with_file("image[10]", FormFile::from_bytes("ten.png", vec![0u8]))
            .with_file("image[2]", FormFile::from_bytes("two.png", vec![0u8]))
            .with_file("image[x]", FormFile::from_bytes("skip.png", vec![0u8]));
        let env = convert_image_edit(&request(form), 1024).await.unwrap();
        assert_eq!(
            file_names(&env),
            vec![("image[]", "two.png"), ("image[]", "ten.png")]
        );
    }

    #[tokio::test]
    async fn test_missing_image_rejected() {
        let only_mask = InboundForm::new().with_file("mask", FormFile::from_bytes("m.png", vec![0u8]));
        let err = convert_image_edit(&request(only_mask), 1024).await.unwrap_err();
        assert!(err.to_string().contains("image is required"));

        let no_files = InboundForm::new().with_field("prompt", "p");
        let err = convert_image_edit(&request(no_files), 1024).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_form_size_limit() {
        let form = InboundForm::new()
            .with_file("image", FormFile::from_bytes("big.png", vec![0u8; 64]));
        let err = convert_image_edit(&request(form), 32).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }
}
