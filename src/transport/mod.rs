//! 传输层 — 单次 HTTP 请求与持久流式会话
//!
//! Outbound transports: pooled HTTP for JSON and multipart bodies, and the
//! streaming session handoff used by live speech synthesis.

pub mod http;
pub mod streaming;

pub use http::{HttpTransport, OutboundBody};
pub use streaming::{AudioFrameStream, StreamingSession, StreamingTransport};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Streaming session error: {0}")]
    Session(String),

    #[error("Transport error: {0}")]
    Other(String),
}
