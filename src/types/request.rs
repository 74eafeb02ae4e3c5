//! Canonical (provider-agnostic) requests as received from the relay.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::capability::Capability;
use super::video::VideoTaskRequest;
use crate::multipart::InboundForm;
use crate::{Error, ErrorContext, Result};

/// Image generation request: the fixed OpenAI-style fields plus vendor-only
/// parameters kept as raw JSON text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub model: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<bool>,
    /// Vendor-only parameters, key to raw JSON text.
    #[serde(skip)]
    pub extra: BTreeMap<String, String>,
}

const IMAGE_FIELDS: [&str; 9] = [
    "model",
    "prompt",
    "n",
    "size",
    "quality",
    "response_format",
    "style",
    "user",
    "watermark",
];

impl ImageRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, raw_json: impl Into<String>) -> Self {
        self.extra.insert(key.into(), raw_json.into());
        self
    }

    /// Parse an inbound JSON body; keys outside the fixed set land in `extra`.
    pub fn from_json_body(body: &[u8]) -> Result<Self> {
        let map: Map<String, Value> = serde_json::from_slice(body)?;
        let mut request: Self = serde_json::from_value(Value::Object(map.clone()))?;
        for (key, value) in map {
            if !IMAGE_FIELDS.contains(&key.as_str()) {
                request.extra.insert(key, value.to_string());
            }
        }
        Ok(request)
    }
}

/// Image edit: the image fields plus the inbound multipart form.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEditRequest {
    pub image: ImageRequest,
    pub form: InboundForm,
}

/// Speech synthesis request in the OpenAI shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioRequest {
    pub model: String,
    pub input: String,
    #[serde(default)]
    pub voice: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<String>,
    /// Raw JSON merged onto the vendor request.
    #[serde(skip)]
    pub metadata: Option<String>,
}

impl AudioRequest {
    pub fn new(model: impl Into<String>, input: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            voice: voice.into(),
            ..Self::default()
        }
    }

    pub fn with_metadata(mut self, raw_json: impl Into<String>) -> Self {
        self.metadata = Some(raw_json.into());
        self
    }

    pub fn from_json_body(body: &[u8]) -> Result<Self> {
        let map: Map<String, Value> = serde_json::from_slice(body)?;
        let metadata = map.get("metadata").map(|m| m.to_string());
        let mut request: Self = serde_json::from_value(Value::Object(map)).map_err(|e| {
            Error::serialization_with_context(
                e.to_string(),
                ErrorContext::new().with_source("audio_request"),
            )
        })?;
        request.metadata = metadata;
        Ok(request)
    }
}

/// One inbound call, in the shape the relay framework produced.
#[derive(Debug, Clone)]
pub enum CanonicalRequest {
    /// OpenAI chat-completions body.
    Chat(Value),
    /// Anthropic messages body, for the Claude compatibility format.
    ClaudeMessages(Value),
    /// Gemini generateContent body.
    GeminiChat(Value),
    /// OpenAI Responses body.
    Responses(Value),
    Embedding(Value),
    Rerank(Value),
    ImageGeneration(ImageRequest),
    ImageEdit(ImageEditRequest),
    Audio(AudioRequest),
    Video(VideoTaskRequest),
}

impl CanonicalRequest {
    /// Capability this request shape serves, where the shape alone decides it.
    pub fn capability(&self) -> Option<Capability> {
        match self {
            Self::Chat(_) | Self::ClaudeMessages(_) | Self::GeminiChat(_) => {
                Some(Capability::ChatCompletions)
            }
            Self::Embedding(_) => Some(Capability::Embeddings),
            Self::Rerank(_) => Some(Capability::Rerank),
            Self::ImageGeneration(_) => Some(Capability::ImageGeneration),
            Self::ImageEdit(_) => Some(Capability::ImageEdit),
            Self::Video(_) => Some(Capability::VideoTask),
            // Audio requests serve speech as well as transcription modes.
            Self::Audio(_) | Self::Responses(_) => None,
        }
    }
}
