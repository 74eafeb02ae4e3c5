//! 语音合成 — OpenAI 形态请求到豆包 TTS 请求
//!
//! Speech synthesis: OpenAI-shaped request to the vendor TTS envelope.
//!
//! The translator builds a default envelope, merges the caller's metadata onto
//! it, and only then decides the transport: `request.operation == "submit"`
//! means a streamed session, anything else a synchronous call.

use serde_json::Map;

use crate::auth::{parse_app_credential, redact};
use crate::merge::merge_into;
use crate::types::audio::{
    VendorApp, VendorAudio, VendorReqInfo, VendorUser, APP_TOKEN_PLACEHOLDER, DEFAULT_CLUSTER,
    DEFAULT_FRONTEND_TYPE, DEFAULT_SAMPLE_RATE, DEFAULT_UID, OPERATION_SUBMIT,
};
use crate::types::{
    AudioFormat, AudioRequest, Capability, RelayContext, TransportKind, VendorAudioRequest,
};
use crate::{Error, ErrorContext, Result};

pub const DEFAULT_VOICE_TYPE: &str = "zh_female_cancan_mars_bigtts";
pub const DEFAULT_SPEED_RATIO: f64 = 1.0;

/// OpenAI voice names and the vendor voices that stand in for them.
pub const VOICE_MAP: &[(&str, &str)] = &[
    ("alloy", "zh_female_cancan_mars_bigtts"),
    ("echo", "zh_male_yangguangqingnian_mars_bigtts"),
    ("fable", "zh_female_shuangkuaisisi_moon_bigtts"),
    ("onyx", "zh_male_wennuanahu_moon_bigtts"),
    ("nova", "zh_female_linjianvhai_moon_bigtts"),
    ("shimmer", "zh_female_meilinvyou_moon_bigtts"),
];

/// Unknown names are taken as native vendor voice types.
pub fn map_voice_type(voice: &str) -> String {
    if voice.is_empty() {
        return DEFAULT_VOICE_TYPE.to_string();
    }
    VOICE_MAP
        .iter()
        .find(|(name, _)| *name == voice)
        .map(|(_, vendor)| (*vendor).to_string())
        .unwrap_or_else(|| voice.to_string())
}

/// Transport is decided by the merged operation alone.
pub fn select_transport(request: &VendorAudioRequest) -> TransportKind {
    if request.is_submit() {
        TransportKind::Streaming
    } else {
        TransportKind::Rest
    }
}

/// Default envelope before caller overrides.
pub fn default_request(app_id: &str, req: &AudioRequest) -> VendorAudioRequest {
    VendorAudioRequest {
        app: VendorApp {
            appid: app_id.to_string(),
            token: APP_TOKEN_PLACEHOLDER.to_string(),
            cluster: DEFAULT_CLUSTER.to_string(),
            extra: Map::new(),
        },
        user: VendorUser {
            uid: DEFAULT_UID.to_string(),
            extra: Map::new(),
        },
        audio: VendorAudio {
            voice_type: map_voice_type(&req.voice),
            encoding: AudioFormat::from_str(req.response_format.as_deref().unwrap_or(""))
                .vendor_encoding()
                .to_string(),
            speed_ratio: req.speed.unwrap_or(DEFAULT_SPEED_RATIO),
            rate: DEFAULT_SAMPLE_RATE,
            extra: Map::new(),
        },
        request: VendorReqInfo {
            reqid: uuid::Uuid::new_v4().to_string(),
            text: req.input.clone(),
            operation: OPERATION_SUBMIT.to_string(),
            model: String::new(),
            with_frontend: 1,
            frontend_type: DEFAULT_FRONTEND_TYPE.to_string(),
            text_type: String::new(),
            extra: Map::new(),
        },
        extra: Map::new(),
    }
}

/// Build the vendor request and record the transport decision on `ctx`.
pub fn convert_audio(ctx: &mut RelayContext, req: &AudioRequest) -> Result<VendorAudioRequest> {
    if ctx.capability != Capability::AudioSpeech {
        return Err(Error::unsupported_with_context(
            format!("unsupported audio relay mode: {}", ctx.capability),
            ErrorContext::new().with_source("audio"),
        ));
    }

    let credential = parse_app_credential(&ctx.credential)?;
    let default = default_request(&credential.app_id, req);
    let merged = match req.metadata.as_deref() {
        Some(raw) => merge_into(&default, raw, "audio.metadata")?,
        None => default,
    };

    let transport = select_transport(&merged);
    ctx.transport = transport;
    ctx.is_stream = transport == TransportKind::Streaming;
    ctx.response_encoding = Some(merged.audio.encoding.clone());
    ctx.requested_format = Some(AudioFormat::from_str(
        req.response_format.as_deref().unwrap_or("mp3"),
    ));
    ctx.audio_request = Some(merged.clone());

    tracing::debug!(
        app_id = %redact(&credential.app_id),
        operation = %merged.request.operation,
        transport = ?transport,
        voice_type = %merged.audio.voice_type,
        "audio transport selected"
    );
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RelayContext {
        RelayContext::new(Capability::AudioSpeech, "tts-1", "app-123|tok-456")
    }

    #[test]
    fn test_defaults_without_metadata() {
        let mut ctx = ctx();
        let req = AudioRequest::new("tts-1", "你好", "alloy");
        let out = convert_audio(&mut ctx, &req).unwrap();
        assert_eq!(out.app.appid, "app-123");
        assert_eq!(out.app.token, "access_token");
        assert_eq!(out.app.cluster, "volcano_tts");
        assert_eq!(out.user.uid, "openai_relay_user");
        assert_eq!(out.audio.voice_type, "zh_female_cancan_mars_bigtts");
        assert_eq!(out.audio.encoding, "mp3");
        assert_eq!(out.audio.speed_ratio, 1.0);
        assert_eq!(out.audio.rate, 24000);
        assert_eq!(out.request.operation, "submit");
        assert!(out.request.model.is_empty());
        assert_eq!(out.request.with_frontend, 1);
        assert!(uuid::Uuid::parse_str(&out.request.reqid).is_ok());
        assert_eq!(ctx.transport, TransportKind::Streaming);
        assert!(ctx.is_stream);

        let wire = serde_json::to_value(&out).unwrap();
        assert!(wire["request"].get("model").is_none());
    }

    #[test]
    fn test_query_override_keeps_other_defaults() {
        let mut ctx = ctx();
        let req = AudioRequest::new("tts-1", "hi", "nova")
            .with_metadata(r#"{"request":{"operation":"query"}}"#);
        let out = convert_audio(&mut ctx, &req).unwrap();
        assert_eq!(out.request.operation, "query");
        assert_eq!(out.audio.voice_type, "zh_female_linjianvhai_moon_bigtts");
        assert_eq!(out.audio.speed_ratio, 1.0);
        assert_eq!(ctx.transport, TransportKind::Rest);
        assert!(!ctx.is_stream);
        assert_eq!(ctx.audio_request.as_ref(), Some(&out));
    }

    #[test]
    fn test_override_keys_match_fields_ignoring_case() {
        let mut ctx = ctx();
        let req = AudioRequest::new("tts-1", "hi", "nova")
            .with_metadata(r#"{"request":{"Operation":"query"}}"#);
        let out = convert_audio(&mut ctx, &req).unwrap();
        assert_eq!(out.request.operation, "query");
        assert!(out.request.extra.is_empty());
        assert_eq!(ctx.transport, TransportKind::Rest);
    }

    #[test]
    fn test_unknown_override_fields_survive() {
        let mut ctx = ctx();
        let req = AudioRequest::new("tts-1", "hi", "")
            .with_metadata(r#"{"audio":{"volume_ratio":1.5},"request":{"silence_duration":200}}"#);
        let out = convert_audio(&mut ctx, &req).unwrap();
        let wire = serde_json::to_value(&out).unwrap();
        assert_eq!(wire["audio"]["volume_ratio"], 1.5);
        assert_eq!(wire["request"]["silence_duration"], 200);
        assert_eq!(out.audio.voice_type, DEFAULT_VOICE_TYPE);
    }

    #[test]
    fn test_mistyped_override_is_serialization_error() {
        let mut ctx = ctx();
        let req = AudioRequest::new("tts-1", "hi", "alloy")
            .with_metadata(r#"{"audio":{"rate":"fast"}}"#);
        let err = convert_audio(&mut ctx, &req).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Serialization);
    }

    #[test]
    fn test_bad_credential_and_mode() {
        let mut bad = RelayContext::new(Capability::AudioSpeech, "tts-1", "no-delimiter");
        let req = AudioRequest::new("tts-1", "hi", "alloy");
        assert_eq!(
            convert_audio(&mut bad, &req).unwrap_err().kind(),
            crate::error::ErrorKind::Auth
        );

        let mut stt = RelayContext::new(Capability::AudioTranscription, "whisper", "a|b");
        assert_eq!(
            convert_audio(&mut stt, &req).unwrap_err().kind(),
            crate::error::ErrorKind::UnsupportedCapability
        );
    }

    #[test]
    fn test_voice_map() {
        assert_eq!(map_voice_type("echo"), "zh_male_yangguangqingnian_mars_bigtts");
        assert_eq!(map_voice_type("BV001_streaming"), "BV001_streaming");
    }

    #[test]
    fn test_caller_speed_and_format() {
        let mut ctx = ctx();
        let mut req = AudioRequest::new("tts-1", "hi", "alloy");
        req.speed = Some(1.25);
        req.response_format = Some("wav".into());
        let out = convert_audio(&mut ctx, &req).unwrap();
        assert_eq!(out.audio.speed_ratio, 1.25);
        assert_eq!(out.audio.encoding, "wav");
        assert_eq!(ctx.requested_format, Some(AudioFormat::Wav));
        assert_eq!(ctx.response_encoding.as_deref(), Some("wav"));
    }
}
