//! 渠道适配器 — 组合鉴权、转换、路由、分发与归一化
//!
//! The channel adaptor. One [`Adaptor`] is built per channel and shared; each
//! call threads its own [`RelayContext`] through:
//!
//! convert → request_url → request_headers → dispatch
//!
//! [`Adaptor::relay`] runs the whole sequence.

use std::sync::Arc;

use reqwest::header::HeaderMap;
use serde_json::Value;
use tracing::Instrument;

use crate::auth;
use crate::config::AdaptorConfig;
use crate::multipart::MultipartEnvelope;
use crate::normalize::normalize_tts_response;
use crate::relay::RestRelay;
use crate::router::{resolve_endpoint, RouteQuery};
use crate::translate;
use crate::transport::streaming::start_session;
use crate::transport::{HttpTransport, OutboundBody, StreamingTransport};
use crate::types::{
    CanonicalRequest, Capability, RelayContext, RelayFormat, RelayOutput, TransportKind,
    VendorAudioRequest,
};
use crate::{Error, ErrorContext, Result};

pub const CHANNEL_NAME: &str = "volcengine";

pub const MODEL_LIST: &[&str] = &[
    "doubao-seed-1-6-250615",
    "doubao-seed-1-6-thinking-250715",
    "doubao-seed-1-6-flash-250715",
    "doubao-1-5-pro-32k-250115",
    "doubao-1-5-pro-256k-250115",
    "doubao-1-5-lite-32k-250115",
    "doubao-1-5-vision-pro-32k-250115",
    "deepseek-r1-250528",
    "deepseek-v3-250324",
    "doubao-embedding-text-240715",
    "doubao-embedding-vision-250615",
    "doubao-seedream-3-0-t2i-250415",
    "doubao-seedream-4-0-250828",
    "doubao-seededit-3-0-i2i-250628",
    "doubao-seedance-1-0-pro-250528",
    "doubao-seedance-1-0-lite-i2v-250428",
    "doubao-tts",
];

/// Vendor payload produced by [`Adaptor::convert`].
#[derive(Debug, Clone, PartialEq)]
pub enum PreparedRequest {
    Json(Value),
    Multipart(MultipartEnvelope),
    Speech(VendorAudioRequest),
}

pub struct Adaptor {
    config: AdaptorConfig,
    http: HttpTransport,
    rest: Arc<dyn RestRelay>,
    streaming: Arc<dyn StreamingTransport>,
}

impl std::fmt::Debug for Adaptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adaptor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Adaptor {
    pub fn new(
        config: AdaptorConfig,
        rest: Arc<dyn RestRelay>,
        streaming: Arc<dyn StreamingTransport>,
    ) -> Result<Self> {
        config.validate()?;
        let http = HttpTransport::new(&config)?;
        Ok(Self {
            config,
            http,
            rest,
            streaming,
        })
    }

    pub fn config(&self) -> &AdaptorConfig {
        &self.config
    }

    pub fn channel_name(&self) -> &'static str {
        CHANNEL_NAME
    }

    pub fn model_list(&self) -> &'static [&'static str] {
        MODEL_LIST
    }

    /// Translate the canonical request into the vendor payload.
    ///
    /// May rewrite `ctx.upstream_model` and, for speech, records the merged
    /// request and transport decision on `ctx`.
    pub async fn convert(
        &self,
        ctx: &mut RelayContext,
        request: CanonicalRequest,
    ) -> Result<PreparedRequest> {
        if let Some(shape) = request.capability() {
            if shape != ctx.capability {
                return Err(Error::validation_with_context(
                    format!("{} request sent for {}", shape, ctx.capability),
                    ErrorContext::new().with_source("adaptor"),
                ));
            }
        }

        match request {
            CanonicalRequest::ClaudeMessages(body) => {
                ctx.relay_format = RelayFormat::Claude;
                let chat = self.rest.convert_claude_request(ctx, body)?;
                Ok(PreparedRequest::Json(translate::chat::convert_chat(ctx, chat)?))
            }
            CanonicalRequest::GeminiChat(_) => {
                Err(Error::not_implemented("gemini request conversion"))
            }
            CanonicalRequest::Responses(_) => {
                Err(Error::not_implemented("responses request conversion"))
            }
            CanonicalRequest::Chat(body) => {
                ctx.is_stream = body["stream"].as_bool().unwrap_or(false);
                Ok(PreparedRequest::Json(translate::chat::convert_chat(ctx, body)?))
            }
            CanonicalRequest::Embedding(body) => Ok(PreparedRequest::Json(
                translate::chat::convert_passthrough(body, "embeddings")?,
            )),
            CanonicalRequest::Rerank(body) => Ok(PreparedRequest::Json(
                translate::chat::convert_passthrough(body, "rerank")?,
            )),
            CanonicalRequest::ImageGeneration(req) => Ok(PreparedRequest::Json(
                translate::image::convert_image_generation(&req)?,
            )),
            CanonicalRequest::ImageEdit(req) => Ok(PreparedRequest::Multipart(
                translate::image_edit::convert_image_edit(&req, self.config.max_form_bytes)
                    .await?,
            )),
            CanonicalRequest::Audio(req) => Ok(PreparedRequest::Speech(
                translate::audio::convert_audio(ctx, &req)?,
            )),
            CanonicalRequest::Video(req) => Ok(PreparedRequest::Json(
                translate::video::convert_video(ctx, &req)?,
            )),
        }
    }

    fn route_query<'a>(&'a self, ctx: &'a RelayContext) -> RouteQuery<'a> {
        let mut query = RouteQuery::from_context(ctx);
        if query.base_url.is_none() {
            query.base_url = self.config.base_url.as_deref();
        }
        query
    }

    pub fn request_url(&self, ctx: &RelayContext) -> Result<String> {
        crate::router::resolve_url(&self.route_query(ctx))
    }

    pub fn request_headers(&self, ctx: &RelayContext) -> Result<HeaderMap> {
        auth::request_headers(ctx)
    }

    /// Execute the prepared call and normalize the reply.
    pub async fn dispatch(
        &self,
        ctx: &RelayContext,
        prepared: PreparedRequest,
    ) -> Result<RelayOutput> {
        let query = self.route_query(ctx);
        let endpoint = resolve_endpoint(&query)?;
        let url = self.request_url(ctx)?;
        let headers = self.request_headers(ctx)?;

        match prepared {
            PreparedRequest::Speech(request) => match endpoint.transport() {
                TransportKind::Streaming => {
                    tracing::info!(url = %url, "handing speech request to streaming session");
                    let stream = start_session(
                        self.streaming.as_ref(),
                        &url,
                        &headers,
                        &request,
                        self.config.stream_buffer,
                    )
                    .await?;
                    Ok(RelayOutput::AudioStream(stream))
                }
                TransportKind::Rest => {
                    let body = OutboundBody::Json(serde_json::to_value(&request)?);
                    let resp = self.http.post(&url, headers, &body).await?;
                    normalize_tts_response(ctx, resp).await
                }
            },
            PreparedRequest::Json(body) => {
                self.rest
                    .execute(ctx, &url, headers, OutboundBody::Json(body))
                    .await
            }
            PreparedRequest::Multipart(envelope) => {
                self.rest
                    .execute(ctx, &url, headers, OutboundBody::Multipart(envelope))
                    .await
            }
        }
    }

    /// Full control flow for one inbound call.
    pub async fn relay(
        &self,
        ctx: &mut RelayContext,
        request: CanonicalRequest,
    ) -> Result<RelayOutput> {
        let span = tracing::info_span!(
            "relay",
            channel = CHANNEL_NAME,
            capability = %ctx.capability,
            model = %ctx.origin_model
        );

        async {
            if ctx.capability == Capability::AudioSpeech {
                tracing::debug!(credential = %auth::redact(&ctx.credential), "speech call");
            }
            let prepared = self.convert(ctx, request).await?;
            self.dispatch(ctx, prepared).await
        }
        .instrument(span)
        .await
    }
}
