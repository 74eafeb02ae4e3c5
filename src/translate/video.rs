//! Video generation task body.

use serde_json::Value;

use crate::types::{RelayContext, VideoTaskRequest};
use crate::Result;

/// Validate the task and serialize it. The context model wins over an empty
/// body model.
pub fn convert_video(ctx: &RelayContext, req: &VideoTaskRequest) -> Result<Value> {
    req.validate()?;
    let mut body = serde_json::to_value(req)?;
    if req.model.is_empty() && !ctx.upstream_model.is_empty() {
        body["model"] = Value::String(ctx.upstream_model.clone());
    }
    Ok(body)
}
