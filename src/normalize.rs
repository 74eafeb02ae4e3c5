//! 响应归一化 — 上游回复到规范结果
//!
//! Vendor reply to canonical result, for the replies this adaptor handles
//! itself (synchronous speech) plus the shared upstream error mapping.
//!
//! The synchronous speech endpoint answers in one of three shapes:
//! raw audio bytes, a JSON envelope with `code == 3000` and base64 `data`,
//! or a JSON envelope describing a failure.

use base64::Engine;
use serde::Deserialize;
use serde_json::Value;

use crate::types::{AudioFormat, AudioOutput, RelayContext, RelayOutput, Usage};
use crate::{Error, ErrorContext, Result};

/// Success code in the vendor speech envelope.
pub const TTS_SUCCESS_CODE: i64 = 3000;

/// Status reported for a failed envelope delivered with HTTP 200.
const BAD_GATEWAY: u16 = 502;

#[derive(Debug, Deserialize)]
struct TtsEnvelope {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<String>,
}

/// Best-effort error message from a vendor JSON body.
pub fn extract_error_message(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    v.pointer("/error/message")
        .or_else(|| v.get("message"))
        .or_else(|| v.get("error"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

/// Map a non-2xx reply to [`Error::Upstream`].
pub async fn upstream_error(resp: reqwest::Response) -> Error {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let message = extract_error_message(&body)
        .unwrap_or_else(|| format!("upstream returned status {}", status));
    tracing::warn!(status, message = %message, "upstream request failed");
    Error::upstream(status, message, body)
}

fn looks_like_json(content_type: Option<&str>, body: &[u8]) -> bool {
    if content_type.is_some_and(|ct| ct.contains("json")) {
        return true;
    }
    body.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{')
}

/// Decode a synchronous speech reply body.
pub fn parse_tts_reply(
    content_type: Option<&str>,
    body: &[u8],
    format: AudioFormat,
    encoding: &str,
) -> Result<AudioOutput> {
    if !looks_like_json(content_type, body) {
        if body.is_empty() {
            return Err(Error::upstream(BAD_GATEWAY, "empty audio reply", ""));
        }
        return Ok(AudioOutput {
            data: body.to_vec(),
            format,
            encoding: encoding.to_string(),
        });
    }

    let raw = String::from_utf8_lossy(body);
    let envelope: TtsEnvelope = serde_json::from_slice(body).map_err(|e| {
        Error::serialization_with_context(
            format!("unreadable speech reply: {}", e),
            ErrorContext::new().with_source("tts_response"),
        )
    })?;
    if envelope.code != TTS_SUCCESS_CODE {
        return Err(Error::upstream(
            BAD_GATEWAY,
            format!("speech synthesis failed ({}): {}", envelope.code, envelope.message),
            raw.into_owned(),
        ));
    }
    let data = envelope
        .data
        .filter(|d| !d.is_empty())
        .ok_or_else(|| Error::upstream(BAD_GATEWAY, "speech reply carries no audio", raw.as_ref()))?;
    let audio = base64::engine::general_purpose::STANDARD
        .decode(data.as_bytes())
        .map_err(|e| {
            Error::serialization_with_context(
                format!("invalid base64 audio: {}", e),
                ErrorContext::new()
                    .with_field_path("data")
                    .with_source("tts_response"),
            )
        })?;
    Ok(AudioOutput {
        data: audio,
        format,
        encoding: encoding.to_string(),
    })
}

/// Normalize the reply of a synchronous speech call.
pub async fn normalize_tts_response(
    ctx: &RelayContext,
    resp: reqwest::Response,
) -> Result<RelayOutput> {
    if !resp.status().is_success() {
        return Err(upstream_error(resp).await);
    }
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = resp.bytes().await.map_err(|e| {
        Error::Transport(crate::transport::TransportError::Http(e))
    })?;

    let format = ctx.requested_format.unwrap_or_default();
    let encoding = ctx
        .response_encoding
        .as_deref()
        .unwrap_or_else(|| format.vendor_encoding());
    let output = parse_tts_reply(content_type.as_deref(), &body, format, encoding)?;
    let usage = Usage::prompt_only(input_chars(ctx));
    tracing::debug!(bytes = output.data.len(), encoding = %output.encoding, "speech reply decoded");
    Ok(RelayOutput::Audio { output, usage })
}

fn input_chars(ctx: &RelayContext) -> u64 {
    ctx.audio_request
        .as_ref()
        .map(|r| r.request.text.chars().count() as u64)
        .unwrap_or(0)
}
