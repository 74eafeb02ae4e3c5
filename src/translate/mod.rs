//! 请求转换 — 每种能力一个转换例程
//!
//! Request translators, one per capability.
//!
//! | Module | Output |
//! |--------|--------|
//! | [`chat`] | chat, embedding and rerank JSON bodies |
//! | [`image`] | image generation JSON with vendor extension keys |
//! | [`image_edit`] | rebuilt multipart envelope |
//! | [`audio`] | vendor TTS envelope plus the transport decision |
//! | [`video`] | validated video generation task |

pub mod audio;
pub mod chat;
pub mod image;
pub mod image_edit;
pub mod video;

pub use audio::convert_audio;
pub use chat::{convert_chat, convert_passthrough};
pub use image::convert_image_generation;
pub use image_edit::convert_image_edit;
pub use video::convert_video;
