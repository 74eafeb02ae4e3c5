use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::Proxy;
use serde_json::Value;

use crate::config::AdaptorConfig;
use crate::multipart::{MultipartEnvelope, PartBody};
use crate::transport::TransportError;
use crate::{Error, Result};

/// Body of one outbound call. Headers are set by the caller and win over the
/// content type a multipart body would carry.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundBody {
    Json(Value),
    Multipart(MultipartEnvelope),
}

impl OutboundBody {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Json(_) => "json",
            Self::Multipart(_) => "multipart",
        }
    }
}

/// Build the reqwest form for an envelope, parts in envelope order.
pub fn multipart_form(envelope: &MultipartEnvelope) -> Result<Form> {
    let mut form = Form::new();
    for part in envelope.parts() {
        form = match &part.body {
            PartBody::Text(value) => form.text(part.name.clone(), value.clone()),
            PartBody::File {
                filename,
                content_type,
                data,
            } => {
                let file = Part::bytes(data.to_vec())
                    .file_name(filename.clone())
                    .mime_str(content_type)
                    .map_err(|e| {
                        Error::validation(format!("invalid mime {}: {}", content_type, e))
                    })?;
                form.part(part.name.clone(), file)
            }
        };
    }
    Ok(form)
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &AdaptorConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Some(Duration::from_secs(config.pool_idle_timeout_secs)))
            // Conservative HTTP/2 keepalive for long-lived upstream connections.
            .http2_adaptive_window(true)
            .http2_keep_alive_interval(Some(Duration::from_secs(30)))
            .http2_keep_alive_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = config.proxy_url.as_deref().filter(|s| !s.is_empty()) {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                Error::configuration(format!("invalid proxy url {}: {}", proxy_url, e))
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;
        Ok(Self { client })
    }

    pub async fn post(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &OutboundBody,
    ) -> Result<reqwest::Response> {
        let request = self.client.post(url);
        // Caller headers go last so they replace the multipart content type.
        let request = match body {
            OutboundBody::Json(value) => {
                let payload = serde_json::to_vec(value)?;
                tracing::info!(url = %url, body = body.kind(), bytes = payload.len(), "dispatching upstream request");
                request.body(payload)
            }
            OutboundBody::Multipart(envelope) => {
                tracing::info!(
                    url = %url,
                    body = body.kind(),
                    parts = envelope.parts().len(),
                    bytes = envelope.file_bytes(),
                    "dispatching upstream request"
                );
                request.multipart(multipart_form(envelope)?)
            }
        };
        request
            .headers(headers)
            .send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))
    }
}
