//! Per-call relay context.

use super::audio::{AudioFormat, VendorAudioRequest};
use super::capability::{Capability, RelayFormat, TransportKind};

/// Scratch state for one inbound call, threaded by reference through every
/// stage. Created fresh per call and dropped once the reply is normalized.
#[derive(Debug, Clone)]
pub struct RelayContext {
    pub capability: Capability,
    pub relay_format: RelayFormat,
    /// Model name the caller asked for.
    pub origin_model: String,
    /// Model name sent upstream; translators may rewrite it.
    pub upstream_model: String,
    /// Bearer key, or `appid|token` for audio synthesis.
    pub credential: String,
    /// Channel base URL; `None` means the vendor default.
    pub base_url: Option<String>,
    pub is_stream: bool,
    pub transport: TransportKind,
    /// Vendor encoding resolved for audio output.
    pub response_encoding: Option<String>,
    /// Audio format the caller asked for.
    pub requested_format: Option<AudioFormat>,
    /// Fully merged vendor request, kept for the streaming handoff.
    pub audio_request: Option<VendorAudioRequest>,
}

impl RelayContext {
    pub fn new(
        capability: Capability,
        model: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        let model = model.into();
        Self {
            capability,
            relay_format: RelayFormat::OpenAi,
            origin_model: model.clone(),
            upstream_model: model,
            credential: credential.into(),
            base_url: None,
            is_stream: false,
            transport: TransportKind::Rest,
            response_encoding: None,
            requested_format: None,
            audio_request: None,
        }
    }

    pub fn with_relay_format(mut self, format: RelayFormat) -> Self {
        self.relay_format = format;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}
