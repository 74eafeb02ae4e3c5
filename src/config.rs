//! 渠道配置 — 基础地址、HTTP 连接池与表单上限
//!
//! Channel configuration. Values can come from YAML, from the environment
//! (same variable names the HTTP transport has always honoured), or from the
//! builder-style setters.

use serde::{Deserialize, Serialize};
use std::env;

use crate::{Error, ErrorContext, Result};

/// Vendor default for the Ark API. A channel without its own base URL uses this.
pub const DEFAULT_BASE_URL: &str = "https://ark.cn-beijing.volces.com";

/// Upper bound on the bytes read out of an inbound multipart form.
pub const DEFAULT_MAX_FORM_BYTES: usize = 32 << 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptorConfig {
    /// Channel base URL; `None` means [`DEFAULT_BASE_URL`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    pub max_form_bytes: usize,
    /// Capacity of the frame channel between a streaming session and the caller.
    pub stream_buffer: usize,
}

impl Default for AdaptorConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 30,
            pool_max_idle_per_host: 32,
            pool_idle_timeout_secs: 90,
            proxy_url: None,
            max_form_bytes: DEFAULT_MAX_FORM_BYTES,
            stream_buffer: 32,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}

impl AdaptorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by the environment (env-overridable production knobs).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("VOLC_BASE_URL").ok().filter(|s| !s.trim().is_empty()),
            timeout_secs: env_parse("AI_HTTP_TIMEOUT_SECS")
                .or_else(|| env_parse("AI_TIMEOUT_SECS"))
                .unwrap_or(defaults.timeout_secs),
            pool_max_idle_per_host: env_parse("AI_HTTP_POOL_MAX_IDLE_PER_HOST")
                .unwrap_or(defaults.pool_max_idle_per_host),
            pool_idle_timeout_secs: env_parse("AI_HTTP_POOL_IDLE_TIMEOUT_SECS")
                .unwrap_or(defaults.pool_idle_timeout_secs),
            proxy_url: env::var("AI_PROXY_URL").ok(),
            max_form_bytes: env_parse("VOLC_MAX_FORM_BYTES").unwrap_or(defaults.max_form_bytes),
            stream_buffer: defaults.stream_buffer,
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid adaptor config: {}", e),
                ErrorContext::new().with_source("config"),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    pub fn with_max_form_bytes(mut self, bytes: usize) -> Self {
        self.max_form_bytes = bytes;
        self
    }

    pub fn with_stream_buffer(mut self, frames: usize) -> Self {
        self.stream_buffer = frames;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let ctx = || ErrorContext::new().with_source("config");
        if self.timeout_secs == 0 {
            return Err(Error::configuration_with_context(
                "timeout_secs must be greater than zero",
                ctx().with_field_path("timeout_secs"),
            ));
        }
        if self.max_form_bytes == 0 {
            return Err(Error::configuration_with_context(
                "max_form_bytes must be greater than zero",
                ctx().with_field_path("max_form_bytes"),
            ));
        }
        if self.stream_buffer == 0 {
            return Err(Error::configuration_with_context(
                "stream_buffer must be greater than zero",
                ctx().with_field_path("stream_buffer"),
            ));
        }
        if let Some(base) = self.base_url.as_deref().filter(|s| !s.is_empty()) {
            url::Url::parse(base).map_err(|e| {
                Error::configuration_with_context(
                    format!("Invalid base URL: {}", e),
                    ctx().with_field_path("base_url").with_details(base),
                )
            })?;
        }
        if let Some(proxy) = &self.proxy_url {
            reqwest::Proxy::all(proxy).map_err(|e| {
                Error::configuration_with_context(
                    format!("Invalid proxy URL: {}", e),
                    ctx().with_field_path("proxy_url"),
                )
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_yaml_partial() {
        let cfg = AdaptorConfig::from_yaml_str("base_url: https://tts.example.com\ntimeout_secs: 5\n")
            .unwrap();
        assert_eq!(cfg.base_url.as_deref(), Some("https://tts.example.com"));
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(cfg.max_form_bytes, DEFAULT_MAX_FORM_BYTES);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(AdaptorConfig::new().with_timeout_secs(0).validate().is_err());
        assert!(AdaptorConfig::new().with_base_url("not a url").validate().is_err());
        assert!(AdaptorConfig::from_yaml_str("stream_buffer: 0").is_err());
    }
}
