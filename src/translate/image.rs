//! Image generation body.

use serde_json::{Map, Value};

use crate::types::ImageRequest;
use crate::{Error, ErrorContext, Result};

/// Serialize the fixed fields, then overlay every vendor-only parameter.
///
/// Image-to-image on this vendor goes through the generations endpoint with an
/// `image` parameter, so the extension keys must reach the wire; they win over
/// fixed fields of the same name.
pub fn convert_image_generation(request: &ImageRequest) -> Result<Value> {
    let mut body: Map<String, Value> = match serde_json::to_value(request)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for (key, raw) in &request.extra {
        let value: Value = serde_json::from_str(raw).map_err(|e| {
            Error::serialization_with_context(
                format!("unmarshal extra field {} failed: {}", key, e),
                ErrorContext::new()
                    .with_field_path(key.clone())
                    .with_source("image_generation"),
            )
        })?;
        body.insert(key.clone(), value);
    }
    Ok(Value::Object(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_keys_reach_top_level() {
        let req = ImageRequest::new("doubao-seedream-4-0", "a red fox")
            .with_extra("image", r#""https://example.com/fox.png""#)
            .with_extra("sequential_image_generation", "true");
        let body = convert_image_generation(&req).unwrap();
        assert_eq!(body["model"], "doubao-seedream-4-0");
        assert_eq!(body["prompt"], "a red fox");
        assert_eq!(body["image"], "https://example.com/fox.png");
        assert_eq!(body["sequential_image_generation"], true);
    }

    #[test]
    fn test_extension_wins_on_collision() {
        let mut req = ImageRequest::new("m", "p").with_extra("size", r#""2K""#);
        req.size = Some("1024x1024".into());
        let body = convert_image_generation(&req).unwrap();
        assert_eq!(body["size"], "2K");
    }

    #[test]
    fn test_malformed_extension_names_key() {
        let req = ImageRequest::new("m", "p").with_extra("guidance_scale", "{oops");
        let err = convert_image_generation(&req).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Serialization);
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("guidance_scale")
        );
    }
}
