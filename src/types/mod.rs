//! 类型系统模块：渠道适配器在各阶段之间传递的数据类型。
//!
//! # Types Module
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`capability`] | Capability, relay format and transport selectors |
//! | [`request`] | Canonical requests as received from the relay |
//! | [`context`] | Per-call [`RelayContext`] scratch state |
//! | [`audio`] | Vendor TTS envelope and audio formats |
//! | [`video`] | Video generation task input |
//! | [`response`] | Canonical results and usage |

pub mod audio;
pub mod capability;
pub mod context;
pub mod request;
pub mod response;
pub mod video;

pub use audio::{AudioFormat, AudioOutput, VendorAudioRequest};
pub use capability::{Capability, RelayFormat, TransportKind};
pub use context::RelayContext;
pub use request::{AudioRequest, CanonicalRequest, ImageEditRequest, ImageRequest};
pub use response::{RelayOutput, Usage};
pub use video::{ImageRole, VideoContent, VideoTaskRequest};
