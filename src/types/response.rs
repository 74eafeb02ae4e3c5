//! Canonical results returned to the relay.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::audio::AudioOutput;
use crate::transport::streaming::AudioFrameStream;
use crate::BoxStream;

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    /// Read an OpenAI-style `usage` object; missing counters are zero.
    pub fn from_openai(body: &Value) -> Option<Self> {
        let u = body.get("usage")?;
        let prompt_tokens = u["prompt_tokens"].as_u64().unwrap_or(0);
        let completion_tokens = u["completion_tokens"].as_u64().unwrap_or(0);
        let total_tokens = u["total_tokens"]
            .as_u64()
            .unwrap_or(prompt_tokens + completion_tokens);
        Some(Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        })
    }

    pub fn prompt_only(tokens: u64) -> Self {
        Self {
            prompt_tokens: tokens,
            completion_tokens: 0,
            total_tokens: tokens,
        }
    }
}

/// What the adaptor hands back for one call.
pub enum RelayOutput {
    /// Single JSON reply from the vendor.
    Json {
        status: u16,
        body: Value,
        usage: Option<Usage>,
    },
    /// Server-sent events passed through as produced.
    EventStream(BoxStream<'static, Bytes>),
    /// Synchronous speech synthesis result.
    Audio { output: AudioOutput, usage: Usage },
    /// Live speech synthesis session; frames arrive in vendor order.
    AudioStream(AudioFrameStream),
}

impl std::fmt::Debug for RelayOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json { status, usage, .. } => f
                .debug_struct("Json")
                .field("status", status)
                .field("usage", usage)
                .finish_non_exhaustive(),
            Self::EventStream(_) => f.write_str("EventStream"),
            Self::Audio { output, usage } => f
                .debug_struct("Audio")
                .field("bytes", &output.data.len())
                .field("encoding", &output.encoding)
                .field("usage", usage)
                .finish(),
            Self::AudioStream(_) => f.write_str("AudioStream"),
        }
    }
}
