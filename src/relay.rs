//! REST 兄弟适配器 — OpenAI 兼容协议的请求执行与响应处理
//!
//! The REST sibling. Every non-speech capability is served by an
//! OpenAI-compatible endpoint, so one [`RestRelay`] executes those calls and
//! normalizes their replies. It also owns the Claude-to-chat conversion.
//!
//! Differences handled when converting Anthropic Messages bodies:
//! - the top-level `system` parameter becomes a leading system message;
//! - typed content blocks become OpenAI content parts (text, image);
//! - `stop_sequences` becomes `stop`.

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::HeaderMap;
use serde_json::{json, Map, Value};

use crate::config::AdaptorConfig;
use crate::normalize::upstream_error;
use crate::transport::{HttpTransport, OutboundBody, TransportError};
use crate::types::{RelayContext, RelayOutput, Usage};
use crate::{Error, ErrorContext, Result};

#[async_trait]
pub trait RestRelay: Send + Sync {
    /// Convert an Anthropic Messages body to chat-completions.
    fn convert_claude_request(&self, ctx: &mut RelayContext, body: Value) -> Result<Value>;

    /// Execute one call and normalize the reply.
    async fn execute(
        &self,
        ctx: &RelayContext,
        url: &str,
        headers: HeaderMap,
        body: OutboundBody,
    ) -> Result<RelayOutput>;
}

#[derive(Debug, Clone)]
pub struct OpenAiCompatibleRelay {
    http: HttpTransport,
}

impl OpenAiCompatibleRelay {
    pub fn new(http: HttpTransport) -> Self {
        Self { http }
    }

    pub fn from_config(config: &AdaptorConfig) -> Result<Self> {
        Ok(Self::new(HttpTransport::new(config)?))
    }

    pub async fn handle_response(
        &self,
        ctx: &RelayContext,
        resp: reqwest::Response,
    ) -> Result<RelayOutput> {
        if !resp.status().is_success() {
            return Err(upstream_error(resp).await);
        }

        let is_event_stream = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/event-stream"));
        if ctx.is_stream || is_event_stream {
            let stream = resp
                .bytes_stream()
                .map_err(|e| Error::Transport(TransportError::Http(e)));
            return Ok(RelayOutput::EventStream(Box::pin(stream)));
        }

        let status = resp.status().as_u16();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;
        let body: Value = serde_json::from_slice(&bytes).map_err(|e| {
            Error::serialization_with_context(
                format!("unreadable upstream reply: {}", e),
                ErrorContext::new().with_source(ctx.capability.as_str()),
            )
        })?;
        let usage = Usage::from_openai(&body);
        Ok(RelayOutput::Json {
            status,
            body,
            usage,
        })
    }
}

#[async_trait]
impl RestRelay for OpenAiCompatibleRelay {
    fn convert_claude_request(&self, ctx: &mut RelayContext, body: Value) -> Result<Value> {
        let out = claude_to_chat(&ctx.upstream_model, &body)?;
        ctx.is_stream = out["stream"].as_bool().unwrap_or(false);
        Ok(out)
    }

    async fn execute(
        &self,
        ctx: &RelayContext,
        url: &str,
        headers: HeaderMap,
        body: OutboundBody,
    ) -> Result<RelayOutput> {
        let resp = self.http.post(url, headers, &body).await?;
        self.handle_response(ctx, resp).await
    }
}

fn convert_block(block: &Value) -> Option<Value> {
    match block["type"].as_str()? {
        "text" => Some(json!({"type": "text", "text": block["text"]})),
        "image" => {
            let source = &block["source"];
            let url = match source["type"].as_str()? {
                "base64" => format!(
                    "data:{};base64,{}",
                    source["media_type"].as_str().unwrap_or("image/png"),
                    source["data"].as_str()?
                ),
                "url" => source["url"].as_str()?.to_string(),
                _ => return None,
            };
            Some(json!({"type": "image_url", "image_url": {"url": url}}))
        }
        other => {
            tracing::debug!(block = other, "dropping unsupported content block");
            None
        }
    }
}

fn convert_content(content: &Value) -> Value {
    match content {
        Value::Array(blocks) => Value::Array(blocks.iter().filter_map(convert_block).collect()),
        other => other.clone(),
    }
}

fn system_text(system: &Value) -> Option<String> {
    match system {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(blocks) => {
            let text: Vec<&str> = blocks.iter().filter_map(|b| b["text"].as_str()).collect();
            (!text.is_empty()).then(|| text.join("\n"))
        }
        _ => None,
    }
}

/// Anthropic Messages body to chat-completions body.
pub fn claude_to_chat(model: &str, body: &Value) -> Result<Value> {
    let messages_in = body["messages"].as_array().ok_or_else(|| {
        Error::validation_with_context(
            "messages must be an array",
            ErrorContext::new()
                .with_field_path("messages")
                .with_source("claude"),
        )
    })?;

    let mut messages = Vec::with_capacity(messages_in.len() + 1);
    if let Some(system) = system_text(&body["system"]) {
        messages.push(json!({"role": "system", "content": system}));
    }
    for m in messages_in {
        messages.push(json!({
            "role": m["role"].as_str().unwrap_or("user"),
            "content": convert_content(&m["content"]),
        }));
    }

    let mut out = Map::new();
    out.insert("model".into(), Value::String(model.to_string()));
    out.insert("messages".into(), Value::Array(messages));
    for key in ["max_tokens", "temperature", "top_p"] {
        if let Some(v) = body.get(key).filter(|v| !v.is_null()) {
            out.insert(key.into(), v.clone());
        }
    }
    if let Some(stop) = body.get("stop_sequences").filter(|v| !v.is_null()) {
        out.insert("stop".into(), stop.clone());
    }
    if body["stream"].as_bool().unwrap_or(false) {
        out.insert("stream".into(), Value::Bool(true));
        out.insert("stream_options".into(), json!({"include_usage": true}));
    }
    Ok(Value::Object(out))
}
