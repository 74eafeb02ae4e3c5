//! End-to-end conversions through the adaptor, without network I/O.

mod common;

use std::sync::Arc;

use common::{default_adaptor, MemoryStreaming};
use serde_json::Value;
use volcengine_relay::multipart::{FormFile, InboundForm, PartBody};
use volcengine_relay::router::{STREAMING_TTS_URL, SYNC_TTS_URL};
use volcengine_relay::{
    AudioRequest, CanonicalRequest, Capability, ErrorKind, ImageEditRequest, ImageRequest,
    PreparedRequest, RelayContext, TransportKind,
};

fn adaptor() -> volcengine_relay::Adaptor {
    default_adaptor(Arc::new(MemoryStreaming::new(&[])))
}

#[tokio::test]
async fn test_image_generation_carries_extension_keys() {
    let adaptor = adaptor();
    let body = br#"{"model":"doubao-seedream-4-0-250828","prompt":"a lighthouse at dusk",
        "size":"2K","image":"https://example.com/ref.png","sequential_image_generation":true}"#;
    let request = ImageRequest::from_json_body(body).unwrap();
    let mut ctx = RelayContext::new(Capability::ImageGeneration, &request.model, "sk-test");

    let prepared = adaptor
        .convert(&mut ctx, CanonicalRequest::ImageGeneration(request))
        .await
        .unwrap();
    let PreparedRequest::Json(out) = prepared else {
        panic!("expected JSON body");
    };
    assert_eq!(out["model"], "doubao-seedream-4-0-250828");
    assert_eq!(out["prompt"], "a lighthouse at dusk");
    assert_eq!(out["size"], "2K");
    assert_eq!(out["image"], "https://example.com/ref.png");
    assert_eq!(out["sequential_image_generation"], true);
    assert!(adaptor
        .request_url(&ctx)
        .unwrap()
        .ends_with("/api/v3/images/generations"));
}

#[tokio::test]
async fn test_audio_without_metadata_streams() {
    let adaptor = adaptor();
    let mut ctx = RelayContext::new(Capability::AudioSpeech, "doubao-tts", "app-1|token-1");
    let request = AudioRequest::new("doubao-tts", "今天天气不错", "alloy");

    let prepared = adaptor
        .convert(&mut ctx, CanonicalRequest::Audio(request))
        .await
        .unwrap();
    let PreparedRequest::Speech(vendor) = prepared else {
        panic!("expected speech request");
    };
    assert_eq!(vendor.request.operation, "submit");
    assert!(vendor.request.model.is_empty());
    assert_eq!(vendor.audio.rate, 24000);
    assert_eq!(ctx.transport, TransportKind::Streaming);
    assert!(ctx.is_stream);
    assert_eq!(adaptor.request_url(&ctx).unwrap(), STREAMING_TTS_URL);

    let headers = adaptor.request_headers(&ctx).unwrap();
    assert_eq!(headers["authorization"], "Bearer;token-1");
    assert_eq!(headers["content-type"], "application/json");
}

#[tokio::test]
async fn test_audio_query_override_goes_synchronous() {
    let adaptor = adaptor();
    let mut ctx = RelayContext::new(Capability::AudioSpeech, "doubao-tts", "app-1|token-1");
    let request = AudioRequest::new("doubao-tts", "hello", "shimmer")
        .with_metadata(r#"{"request":{"operation":"query"}}"#);

    let prepared = adaptor
        .convert(&mut ctx, CanonicalRequest::Audio(request))
        .await
        .unwrap();
    let PreparedRequest::Speech(vendor) = prepared else {
        panic!("expected speech request");
    };
    assert_eq!(vendor.request.operation, "query");
    assert_eq!(vendor.audio.voice_type, "zh_female_meilinvyou_moon_bigtts");
    assert_eq!(vendor.audio.speed_ratio, 1.0);
    assert_eq!(ctx.transport, TransportKind::Rest);
    assert!(!ctx.is_stream);
    assert_eq!(adaptor.request_url(&ctx).unwrap(), SYNC_TTS_URL);
}

#[tokio::test]
async fn test_audio_explicit_submit_override_streams() {
    let adaptor = adaptor();
    let mut ctx = RelayContext::new(Capability::AudioSpeech, "doubao-tts", "app-1|token-1");
    let request = AudioRequest::new("doubao-tts", "hello", "nova")
        .with_metadata(r#"{"request":{"operation":"submit","silence_duration":100}}"#);

    let PreparedRequest::Speech(vendor) = adaptor
        .convert(&mut ctx, CanonicalRequest::Audio(request))
        .await
        .unwrap()
    else {
        panic!("expected speech request");
    };
    assert_eq!(vendor.request.operation, "submit");
    assert_eq!(ctx.transport, TransportKind::Streaming);
    assert!(ctx.is_stream);
    assert_eq!(adaptor.request_url(&ctx).unwrap(), STREAMING_TTS_URL);
}

#[tokio::test]
async fn test_per_call_base_url_overrides_configured_one() {
    let adaptor = adaptor();
    let mut ctx = RelayContext::new(Capability::AudioSpeech, "doubao-tts", "app-1|token-1")
        .with_base_url("https://tts-gw.example.com/");
    adaptor
        .convert(
            &mut ctx,
            CanonicalRequest::Audio(AudioRequest::new("doubao-tts", "hi", "alloy")),
        )
        .await
        .unwrap();
    assert_eq!(
        adaptor.request_url(&ctx).unwrap(),
        "https://tts-gw.example.com/v1/audio/speech"
    );
}

#[tokio::test]
async fn test_image_edit_two_images_and_mask() {
    let adaptor = adaptor();
    let form = InboundForm::new()
        .with_field("model", "doubao-seededit-3-0-i2i-250628")
        .with_field("prompt", "replace the sky")
        .with_field("watermark", "false")
        .with_file("image[]", FormFile::from_bytes("left.jpeg", vec![0xFF, 0xD8]))
        .with_file("image[]", FormFile::from_bytes("right.PNG", vec![0x89, 0x50]))
        .with_file("mask", FormFile::from_bytes("mask.png", vec![0x00]));
    let request = ImageEditRequest {
        image: ImageRequest::new("doubao-seededit-3-0-i2i-250628", "replace the sky"),
        form,
    };
    let mut ctx = RelayContext::new(Capability::ImageEdit, "doubao-seededit-3-0-i2i-250628", "sk");

    let prepared = adaptor
        .convert(&mut ctx, CanonicalRequest::ImageEdit(request))
        .await
        .unwrap();
    let PreparedRequest::Multipart(envelope) = prepared else {
        panic!("expected multipart body");
    };

    let files: Vec<(&str, &str, &str)> = envelope
        .parts()
        .iter()
        .filter_map(|p| match &p.body {
            PartBody::File {
                filename,
                content_type,
                ..
            } => Some((p.name.as_str(), filename.as_str(), content_type.as_str())),
            PartBody::Text(_) => None,
        })
        .collect();
    assert_eq!(
        files,
        vec![
            ("image[]", "left.jpeg", "image/jpeg"),
            ("image[]", "right.PNG", "image/png"),
            ("mask", "mask.png", "image/png"),
        ]
    );

    let texts: Vec<(&str, &str)> = envelope
        .parts()
        .iter()
        .filter_map(|p| match &p.body {
            PartBody::Text(v) => Some((p.name.as_str(), v.as_str())),
            PartBody::File { .. } => None,
        })
        .collect();
    assert_eq!(
        texts,
        vec![
            ("model", "doubao-seededit-3-0-i2i-250628"),
            ("prompt", "replace the sky"),
            ("watermark", "false"),
        ]
    );

    let headers = adaptor.request_headers(&ctx).unwrap();
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(headers["authorization"], "Bearer sk");
}

#[tokio::test]
async fn test_thinking_alias_on_chat() {
    let adaptor = adaptor();
    let mut ctx = RelayContext::new(Capability::ChatCompletions, "deepseek-r1-thinking", "sk");
    let body: Value = serde_json::json!({"model": "deepseek-r1-thinking", "messages": []});
    let PreparedRequest::Json(out) = adaptor
        .convert(&mut ctx, CanonicalRequest::Chat(body))
        .await
        .unwrap()
    else {
        panic!("expected JSON body");
    };
    assert_eq!(out["model"], "deepseek-r1");
    assert_eq!(out["thinking"]["type"], "enabled");
}

#[tokio::test]
async fn test_unimplemented_formats_fail_clearly() {
    let adaptor = adaptor();
    let mut ctx = RelayContext::new(Capability::ChatCompletions, "doubao", "sk");
    let err = adaptor
        .convert(&mut ctx, CanonicalRequest::GeminiChat(serde_json::json!({})))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedCapability);
    assert!(err.to_string().contains("not implemented"));

    let err = adaptor
        .convert(&mut ctx, CanonicalRequest::Responses(serde_json::json!({})))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedCapability);
}

#[tokio::test]
async fn test_shape_and_capability_must_agree() {
    let adaptor = adaptor();
    let mut ctx = RelayContext::new(Capability::Embeddings, "doubao", "sk");
    let err = adaptor
        .convert(&mut ctx, CanonicalRequest::Chat(serde_json::json!({})))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_channel_identity() {
    let adaptor = adaptor();
    assert_eq!(adaptor.channel_name(), "volcengine");
    assert!(adaptor.model_list().contains(&"doubao-tts"));
}
