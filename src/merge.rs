//! 覆盖合并 — 将调用方 JSON 逐字段合并到默认结构上
//!
//! Deep merge of caller-supplied JSON onto a translator-built default.
//!
//! Precedence, applied recursively:
//! - object onto object merges key by key;
//! - `null` in the override keeps the default value;
//! - any other override value (scalar, array, or an object replacing a
//!   non-object) replaces the default;
//! - an override key names an existing field when it matches exactly or,
//!   failing that, ignoring ASCII case;
//! - keys only present in the override are added.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Error, ErrorContext, Result};

/// Merge `overlay` into `base` in place.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match matching_key(base_map, key) {
                    Some(field) => {
                        if let Some(existing) = base_map.get_mut(&field) {
                            deep_merge(existing, value);
                        }
                    }
                    None => {
                        if !value.is_null() {
                            base_map.insert(key.clone(), value.clone());
                        }
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

fn matching_key(map: &Map<String, Value>, key: &str) -> Option<String> {
    if map.contains_key(key) {
        return Some(key.to_string());
    }
    map.keys().find(|k| k.eq_ignore_ascii_case(key)).cloned()
}

/// Parse a raw caller document. Blank input means "no override".
pub fn parse_override(raw: &str, source: &str) -> Result<Option<Value>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let doc: Value = serde_json::from_str(raw).map_err(|e| {
        Error::serialization_with_context(
            format!("malformed override document: {}", e),
            ErrorContext::new().with_source(source.to_string()),
        )
    })?;
    match doc {
        Value::Null => Ok(None),
        Value::Object(_) => Ok(Some(doc)),
        other => Err(Error::serialization_with_context(
            "override document must be a JSON object",
            ErrorContext::new()
                .with_source(source.to_string())
                .with_details(type_name(&other)),
        )),
    }
}

/// Apply a raw caller document onto a typed default and read the result back
/// into the same type.
pub fn merge_into<T>(default: &T, raw_override: &str, source: &str) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut tree = serde_json::to_value(default)?;
    if let Some(overlay) = parse_override(raw_override, source)? {
        deep_merge(&mut tree, &overlay);
    }
    serde_json::from_value(tree).map_err(|e| {
        Error::serialization_with_context(
            format!("override does not fit the request structure: {}", e),
            ErrorContext::new().with_source(source.to_string()),
        )
    })
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
