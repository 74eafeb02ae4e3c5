//! 路由决策 — (能力, 模型, 兼容格式, 传输方式) → 上游端点
//!
//! Endpoint resolution. Precedence is fixed and checked in this order:
//!
//! 1. a compatibility relay format with its own endpoint (Claude → chat);
//! 2. the capability's row in [`ARK_ROUTES`];
//! 3. speech synthesis, which depends on the base URL and transport selection.
//!
//! Anything that falls through is [`Error::UnsupportedCapability`].

use crate::config::DEFAULT_BASE_URL;
use crate::types::{Capability, RelayFormat, TransportKind};
use crate::{Error, ErrorContext, Result};

pub const STREAMING_TTS_URL: &str = "wss://openspeech.bytedance.com/api/v1/tts/ws_binary";
pub const SYNC_TTS_URL: &str = "https://openspeech.bytedance.com/api/v1/tts";
pub const CUSTOM_SPEECH_PATH: &str = "/v1/audio/speech";

pub const CHAT_PATH: &str = "/api/v3/chat/completions";
pub const BOT_CHAT_PATH: &str = "/api/v3/bots/chat/completions";

/// Model-name prefix of the vendor's bot (application) variants.
const BOT_MODEL_PREFIX: &str = "bot";

/// Fixed Ark paths. Image edits share the generations endpoint; the vendor
/// tells edits apart by payload.
pub const ARK_ROUTES: &[(Capability, &str)] = &[
    (Capability::Embeddings, "/api/v3/embeddings"),
    (Capability::ImageGeneration, "/api/v3/images/generations"),
    (Capability::ImageEdit, "/api/v3/images/generations"),
    (Capability::Rerank, "/api/v3/rerank"),
    (Capability::VideoTask, "/api/v3/contents/generations/tasks"),
];

/// Inputs to endpoint resolution.
#[derive(Debug, Clone, Copy)]
pub struct RouteQuery<'a> {
    pub capability: Capability,
    pub upstream_model: &'a str,
    pub relay_format: RelayFormat,
    pub transport: TransportKind,
    /// Channel base URL; `None` or empty means the vendor default.
    pub base_url: Option<&'a str>,
}

impl<'a> RouteQuery<'a> {
    pub fn from_context(ctx: &'a crate::types::RelayContext) -> Self {
        Self {
            capability: ctx.capability,
            upstream_model: &ctx.upstream_model,
            relay_format: ctx.relay_format,
            transport: ctx.transport,
            base_url: ctx.base_url.as_deref(),
        }
    }

    fn effective_base(&self) -> &'a str {
        self.base_url
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    /// Whether the channel points somewhere other than the vendor default.
    ///
    /// Only a trailing slash and ASCII case are normalized; other aliases of
    /// the default host count as custom.
    pub fn has_custom_base(&self) -> bool {
        !self.effective_base().eq_ignore_ascii_case(DEFAULT_BASE_URL)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Path under the channel base URL.
    Ark(&'static str),
    /// Vendor speech session endpoint.
    SpeechStream,
    /// Vendor synchronous speech endpoint.
    SpeechSync,
    /// Generic speech endpoint under a custom base URL.
    CustomSpeech,
}

impl Endpoint {
    pub fn url(&self, base: &str) -> String {
        let base = base.trim_end_matches('/');
        match self {
            Self::Ark(path) => format!("{}{}", base, path),
            Self::SpeechStream => STREAMING_TTS_URL.to_string(),
            Self::SpeechSync => SYNC_TTS_URL.to_string(),
            Self::CustomSpeech => format!("{}{}", base, CUSTOM_SPEECH_PATH),
        }
    }

    /// Transport the endpoint must be served with.
    pub fn transport(&self) -> TransportKind {
        match self {
            Self::SpeechStream => TransportKind::Streaming,
            _ => TransportKind::Rest,
        }
    }
}

fn chat_endpoint(model: &str) -> Endpoint {
    if model.starts_with(BOT_MODEL_PREFIX) {
        Endpoint::Ark(BOT_CHAT_PATH)
    } else {
        Endpoint::Ark(CHAT_PATH)
    }
}

pub fn resolve_endpoint(query: &RouteQuery<'_>) -> Result<Endpoint> {
    if query.relay_format == RelayFormat::Claude {
        return Ok(chat_endpoint(query.upstream_model));
    }

    if query.capability == Capability::ChatCompletions {
        return Ok(chat_endpoint(query.upstream_model));
    }

    if let Some((_, path)) = ARK_ROUTES.iter().find(|(c, _)| *c == query.capability) {
        return Ok(Endpoint::Ark(*path));
    }

    if query.capability == Capability::AudioSpeech {
        if query.has_custom_base() {
            return Ok(Endpoint::CustomSpeech);
        }
        return Ok(match query.transport {
            TransportKind::Streaming => Endpoint::SpeechStream,
            TransportKind::Rest => Endpoint::SpeechSync,
        });
    }

    Err(Error::unsupported_with_context(
        format!("unsupported relay mode: {}", query.capability),
        ErrorContext::new()
            .with_details(format!("relay format {}", query.relay_format.as_str()))
            .with_source("router"),
    ))
}

/// Resolve the full target URL.
pub fn resolve_url(query: &RouteQuery<'_>) -> Result<String> {
    let endpoint = resolve_endpoint(query)?;
    let url = endpoint.url(query.effective_base());
    tracing::debug!(
        capability = %query.capability,
        transport = ?query.transport,
        url = %url,
        "resolved upstream endpoint"
    );
    Ok(url)
}
