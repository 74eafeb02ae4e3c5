//! # volcengine-relay
//!
//! 火山引擎（方舟 + 豆包语音）渠道适配器：在中转服务的统一请求模型与厂商线上格式之间转换。
//!
//! Channel adaptor for Volcengine Ark and Volcengine OpenSpeech. It converts
//! provider-agnostic relay requests into the vendor's wire formats and maps
//! the replies back.
//!
//! ## Overview
//!
//! Each inbound call flows through a fixed set of stages, with per-call state
//! carried in a [`RelayContext`]:
//!
//! 1. **Auth**: composite `appid|token` credentials for speech synthesis;
//! 2. **Translate**: one conversion routine per capability;
//! 3. **Merge**: caller-supplied JSON overrides applied field by field;
//! 4. **Route**: capability, model, format and transport to an endpoint;
//! 5. **Dispatch**: JSON, multipart or a streaming session;
//! 6. **Normalize**: vendor reply to a [`RelayOutput`].
//!
//! Speech synthesis picks its transport only after the caller's overrides are
//! merged: `request.operation == "submit"` opens a streaming session, anything
//! else makes a synchronous HTTP call.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use volcengine_relay::{
//!     Adaptor, AdaptorConfig, CanonicalRequest, Capability, OpenAiCompatibleRelay, RelayContext,
//!     StreamingTransport,
//! };
//!
//! # async fn run(streaming: Arc<dyn StreamingTransport>) -> volcengine_relay::Result<()> {
//! let config = AdaptorConfig::from_env();
//! let rest = Arc::new(OpenAiCompatibleRelay::from_config(&config)?);
//! let adaptor = Adaptor::new(config, rest, streaming)?;
//!
//! let mut ctx = RelayContext::new(Capability::ChatCompletions, "doubao-seed-1-6-250615", "sk-...");
//! let body = serde_json::json!({"messages": [{"role": "user", "content": "hi"}]});
//! let output = adaptor.relay(&mut ctx, CanonicalRequest::Chat(body)).await?;
//! # let _ = output;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adaptor`] | The channel adaptor and its control flow |
//! | [`auth`] | Credential parsing and request headers |
//! | [`translate`] | Per-capability request translators |
//! | [`merge`] | Deep merge of caller JSON overrides |
//! | [`router`] | Endpoint resolution |
//! | [`transport`] | HTTP client and streaming session handoff |
//! | [`relay`] | OpenAI-compatible REST execution |
//! | [`normalize`] | Speech reply decoding and upstream errors |
//! | [`multipart`] | Inbound form model and outbound multipart parts |
//! | [`types`] | Requests, context and results |
//! | [`config`] | Adaptor configuration |

pub mod adaptor;
pub mod auth;
pub mod config;
pub mod merge;
pub mod multipart;
pub mod normalize;
pub mod relay;
pub mod router;
pub mod translate;
pub mod transport;
pub mod types;

pub use adaptor::{Adaptor, PreparedRequest, CHANNEL_NAME};
pub use config::AdaptorConfig;
pub use relay::{OpenAiCompatibleRelay, RestRelay};
pub use router::{Endpoint, RouteQuery};
pub use transport::{AudioFrameStream, StreamingSession, StreamingTransport};
pub use types::{
    AudioFormat, AudioOutput, AudioRequest, CanonicalRequest, Capability, ImageEditRequest,
    ImageRequest, RelayContext, RelayFormat, RelayOutput, TransportKind, Usage,
    VendorAudioRequest, VideoTaskRequest,
};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext, ErrorKind};
