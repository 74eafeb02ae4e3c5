//! 视频生成任务输入 — Seedance 图生视频/文生视频任务结构
//!
//! Content-generation task input. Defaults follow the vendor's documented
//! defaults for the lite image-to-video model.

use serde::{Deserialize, Serialize};

use crate::{Error, ErrorContext, Result};

pub const DEFAULT_VIDEO_MODEL: &str = "doubao-seedance-1-0-lite-i2v-250428";

const RESOLUTIONS: [&str; 3] = ["480p", "720p", "1080p"];
const RATIOS: [&str; 9] = [
    "21:9",
    "16:9",
    "4:3",
    "1:1",
    "3:4",
    "9:16",
    "9:21",
    "keep_ratio",
    "adaptive",
];
const MAX_SEED: i64 = 4_294_967_295;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VideoContent {
    Text {
        text: String,
    },
    ImageUrl {
        image_url: ImageUrl,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<ImageRole>,
    },
}

/// Image given as a URL or as `data:image/<fmt>;base64,<data>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageRole {
    FirstFrame,
    LastFrame,
    ReferenceImage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoTaskRequest {
    pub model: String,
    pub content: Vec<VideoContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    pub return_last_frame: bool,
    pub resolution: String,
    pub ratio: String,
    pub duration: u32,
    pub framespersecond: u32,
    pub watermark: bool,
    pub seed: i64,
    pub camerafixed: bool,
}

impl Default for VideoTaskRequest {
    fn default() -> Self {
        Self {
            model: DEFAULT_VIDEO_MODEL.to_string(),
            content: Vec::new(),
            callback_url: None,
            return_last_frame: false,
            resolution: "720p".to_string(),
            ratio: "adaptive".to_string(),
            duration: 5,
            framespersecond: 24,
            watermark: false,
            seed: -1,
            camerafixed: false,
        }
    }
}

impl VideoTaskRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            content: vec![VideoContent::Text {
                text: prompt.into(),
            }],
            ..Self::default()
        }
    }

    pub fn with_image(mut self, url: impl Into<String>, role: Option<ImageRole>) -> Self {
        self.content.push(VideoContent::ImageUrl {
            image_url: ImageUrl { url: url.into() },
            role,
        });
        self
    }

    fn images(&self) -> impl Iterator<Item = Option<ImageRole>> + '_ {
        self.content.iter().filter_map(|c| match c {
            VideoContent::ImageUrl { role, .. } => Some(*role),
            VideoContent::Text { .. } => None,
        })
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &str, msg: String| {
            Error::validation_with_context(
                msg,
                ErrorContext::new()
                    .with_field_path(field.to_string())
                    .with_source("video_task"),
            )
        };

        let has_text = self.content.iter().any(
            |c| matches!(c, VideoContent::Text { text } if !text.trim().is_empty()),
        );
        if !has_text {
            return Err(invalid("content", "a text prompt is required".into()));
        }

        let roles: Vec<Option<ImageRole>> = self.images().collect();
        match roles.as_slice() {
            [] => {}
            [None] | [Some(ImageRole::FirstFrame)] | [Some(ImageRole::ReferenceImage)] => {}
            [Some(ImageRole::FirstFrame), Some(ImageRole::LastFrame)] => {}
            many if many.len() <= 4
                && many.iter().all(|r| *r == Some(ImageRole::ReferenceImage)) => {}
            _ => {
                return Err(invalid(
                    "content",
                    "image roles must be a single first frame, a first/last frame pair, or 1-4 reference images"
                        .into(),
                ))
            }
        }

        if !RESOLUTIONS.contains(&self.resolution.as_str()) {
            return Err(invalid(
                "resolution",
                format!("unsupported resolution: {}", self.resolution),
            ));
        }
        if !RATIOS.contains(&self.ratio.as_str()) {
            return Err(invalid("ratio", format!("unsupported ratio: {}", self.ratio)));
        }
        if !(3..=12).contains(&self.duration) {
            return Err(invalid(
                "duration",
                format!("duration must be 3-12 seconds, got {}", self.duration),
            ));
        }
        if self.framespersecond != 16 && self.framespersecond != 24 {
            return Err(invalid(
                "framespersecond",
                format!("framespersecond must be 16 or 24, got {}", self.framespersecond),
            ));
        }
        if !(-1..=MAX_SEED).contains(&self.seed) {
            return Err(invalid("seed", format!("seed out of range: {}", self.seed)));
        }
        Ok(())
    }
}
