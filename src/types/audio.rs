//! 语音合成类型 — 豆包 TTS 请求结构与音频格式
//!
//! Vendor TTS request envelope and the caller-facing audio formats.
//!
//! Every level of [`VendorAudioRequest`] keeps unknown caller-supplied keys in
//! an `extra` map so metadata overrides such as `audio.volume_ratio` survive the
//! round trip through the typed structure.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Literal the vendor requires in `app.token`. The real token travels in the
/// `Authorization` header.
pub const APP_TOKEN_PLACEHOLDER: &str = "access_token";
pub const DEFAULT_CLUSTER: &str = "volcano_tts";
pub const DEFAULT_UID: &str = "openai_relay_user";
pub const DEFAULT_SAMPLE_RATE: u32 = 24000;
pub const DEFAULT_FRONTEND_TYPE: &str = "unitTson";

/// Operation that asks for a streamed synthesis session; any other value is
/// answered with a single synchronous HTTP reply.
pub const OPERATION_SUBMIT: &str = "submit";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorAudioRequest {
    pub app: VendorApp,
    pub user: VendorUser,
    pub audio: VendorAudio,
    pub request: VendorReqInfo,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorApp {
    pub appid: String,
    pub token: String,
    pub cluster: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorUser {
    pub uid: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorAudio {
    pub voice_type: String,
    pub encoding: String,
    pub speed_ratio: f64,
    pub rate: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorReqInfo {
    pub reqid: String,
    pub text: String,
    pub operation: String,
    /// Must stay empty; the TTS endpoint answers 403 when a model is present.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model: String,
    pub with_frontend: i32,
    pub frontend_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VendorAudioRequest {
    pub fn is_submit(&self) -> bool {
        self.request.operation == OPERATION_SUBMIT
    }
}

/// Supported audio formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Opus,
    Aac,
    Flac,
    Wav,
    Pcm,
}

impl AudioFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Opus => "audio/opus",
            Self::Aac => "audio/aac",
            Self::Flac => "audio/flac",
            Self::Wav => "audio/wav",
            Self::Pcm => "audio/pcm",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "opus" | "ogg_opus" => Self::Opus,
            "aac" => Self::Aac,
            "flac" => Self::Flac,
            "wav" => Self::Wav,
            "pcm" => Self::Pcm,
            _ => Self::Mp3,
        }
    }

    /// Encoding name on the vendor wire. The vendor has no aac/flac output and
    /// falls back to mp3 for those.
    pub fn vendor_encoding(&self) -> &'static str {
        match self {
            Self::Opus => "ogg_opus",
            Self::Wav => "wav",
            Self::Pcm => "pcm",
            Self::Mp3 | Self::Aac | Self::Flac => "mp3",
        }
    }
}

/// Audio payload handed back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioOutput {
    pub data: Vec<u8>,
    /// Format the caller asked for.
    pub format: AudioFormat,
    /// Encoding the vendor actually produced.
    pub encoding: String,
}

impl AudioOutput {
    pub fn content_type(&self) -> &'static str {
        AudioFormat::from_str(&self.encoding).mime_type()
    }
}
