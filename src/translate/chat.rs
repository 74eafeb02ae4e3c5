//! Chat, embedding and rerank bodies.
//!
//! These already match the vendor's OpenAI-compatible schema and are forwarded
//! as-is, apart from the reasoning-mode model alias below.

use serde_json::{json, Value};

use crate::types::RelayContext;
use crate::{Error, ErrorContext, Result};

const THINKING_SUFFIX: &str = "-thinking";
const THINKING_FAMILY_PREFIX: &str = "deepseek";

/// `deepseek-*-thinking` is a relay-side alias: the vendor serves the base
/// model and switches reasoning on through a body field.
pub fn strip_thinking_alias(model: &str) -> Option<&str> {
    if model.starts_with(THINKING_FAMILY_PREFIX) {
        model.strip_suffix(THINKING_SUFFIX)
    } else {
        None
    }
}

pub fn convert_chat(ctx: &mut RelayContext, body: Value) -> Result<Value> {
    let mut body = require_object(body, "chat")?;
    if let Some(base) = strip_thinking_alias(&ctx.upstream_model) {
        let base = base.to_string();
        tracing::debug!(from = %ctx.upstream_model, to = %base, "enabling thinking mode");
        body["model"] = Value::String(base.clone());
        body["thinking"] = json!({ "type": "enabled" });
        ctx.upstream_model = base;
    }
    Ok(body)
}

/// Embedding and rerank bodies pass through untouched.
pub fn convert_passthrough(body: Value, source: &str) -> Result<Value> {
    require_object(body, source)
}

fn require_object(body: Value, source: &str) -> Result<Value> {
    if body.is_object() {
        Ok(body)
    } else {
        Err(Error::validation_with_context(
            "request body must be a JSON object",
            ErrorContext::new().with_source(source.to_string()),
        ))
    }
}
