//! Capability, relay format and transport selectors.

use serde::{Deserialize, Serialize};

/// What the inbound call asks the vendor to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ChatCompletions,
    Embeddings,
    ImageGeneration,
    ImageEdit,
    AudioSpeech,
    AudioTranscription,
    AudioTranslation,
    Rerank,
    VideoTask,
}

impl Capability {
    pub const ALL: [Capability; 9] = [
        Capability::ChatCompletions,
        Capability::Embeddings,
        Capability::ImageGeneration,
        Capability::ImageEdit,
        Capability::AudioSpeech,
        Capability::AudioTranscription,
        Capability::AudioTranslation,
        Capability::Rerank,
        Capability::VideoTask,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChatCompletions => "chat_completions",
            Self::Embeddings => "embeddings",
            Self::ImageGeneration => "image_generation",
            Self::ImageEdit => "image_edit",
            Self::AudioSpeech => "audio_speech",
            Self::AudioTranscription => "audio_transcription",
            Self::AudioTranslation => "audio_translation",
            Self::Rerank => "rerank",
            Self::VideoTask => "video_task",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }

    /// Capabilities whose credential is an `appid|token` pair rather than a bearer key.
    pub fn needs_app_credential(&self) -> bool {
        matches!(self, Self::AudioSpeech)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire dialect the caller spoke. Anything but `OpenAi` is a compatibility mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayFormat {
    #[default]
    OpenAi,
    Claude,
    Gemini,
    OpenAiResponses,
}

impl RelayFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Claude => "claude",
            Self::Gemini => "gemini",
            Self::OpenAiResponses => "openai_responses",
        }
    }
}

/// How the vendor call is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Ordinary request/response over HTTP.
    #[default]
    Rest,
    /// Persistent duplex session owned by the streaming collaborator.
    Streaming,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_str_roundtrip_table() {
        for cap in Capability::ALL {
            assert_eq!(Capability::from_str(cap.as_str()), Some(cap));
        }
        assert_eq!(Capability::from_str("moderation"), None);
    }

    #[test]
    fn test_only_speech_needs_app_credential() {
        let needing: Vec<_> = Capability::ALL
            .into_iter()
            .filter(|c| c.needs_app_credential())
            .collect();
        assert_eq!(needing, vec![Capability::AudioSpeech]);
    }
}
