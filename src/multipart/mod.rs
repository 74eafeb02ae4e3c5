//! 表单重建 — 入站 multipart 表单模型与出站表单部件
//!
//! Inbound multipart model (as parsed by the host framework) and the outbound
//! envelope this adaptor rebuilds from it.
//!
//! Uploaded files may still be in memory or may have been spilled to disk by
//! the host; [`FormFile::read_at_most`] hides the difference.

pub mod mime;

use bytes::Bytes;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

use crate::{Error, Result};

pub use mime::detect_image_mime_type;

#[derive(Debug, Clone, PartialEq)]
pub enum FileSource {
    Memory(Bytes),
    Disk(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormFile {
    pub filename: String,
    pub source: FileSource,
}

impl FormFile {
    pub fn from_bytes(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            source: FileSource::Memory(data.into()),
        }
    }

    pub fn from_path(filename: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            source: FileSource::Disk(path.into()),
        }
    }

    /// Read the file unless it holds more than `limit` bytes. Oversized
    /// spilled files are rejected from their metadata before any byte is
    /// loaded; `Ok(None)` means the limit was exceeded.
    pub async fn read_at_most(&self, limit: usize) -> Result<Option<Bytes>> {
        match &self.source {
            FileSource::Memory(data) => Ok((data.len() <= limit).then(|| data.clone())),
            FileSource::Disk(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .map_err(|e| self.unreadable(e))?;
                let len = file.metadata().await.map_err(|e| self.unreadable(e))?.len();
                if len > limit as u64 {
                    return Ok(None);
                }
                // Reads never exceed limit + 1 bytes, even if the file grew.
                let mut data = Vec::with_capacity(len as usize);
                file.take((limit as u64).saturating_add(1))
                    .read_to_end(&mut data)
                    .await
                    .map_err(|e| self.unreadable(e))?;
                if data.len() > limit {
                    return Ok(None);
                }
                Ok(Some(Bytes::from(data)))
            }
        }
    }

    fn unreadable(&self, e: std::io::Error) -> Error {
        tracing::warn!(filename = %self.filename, error = %e, "uploaded file unreadable");
        Error::Io(e)
    }
}

/// Inbound form, fields and files in the order the host parsed them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundForm {
    fields: Vec<(String, String)>,
    files: Vec<(String, Vec<FormFile>)>,
}

impl InboundForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_field(key, value);
        self
    }

    pub fn with_file(mut self, key: impl Into<String>, file: FormFile) -> Self {
        self.add_file(key, file);
        self
    }

    pub fn add_field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push((key.into(), value.into()));
    }

    /// Files sharing a key are grouped under it, like repeated form parts.
    pub fn add_file(&mut self, key: impl Into<String>, file: FormFile) {
        let key = key.into();
        match self.files.iter_mut().find(|(k, _)| *k == key) {
            Some((_, files)) => files.push(file),
            None => self.files.push((key, vec![file])),
        }
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn files(&self, key: &str) -> &[FormFile] {
        self.files
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, f)| f.as_slice())
            .unwrap_or(&[])
    }

    pub fn file_keys(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|(k, _)| k.as_str())
    }

    pub fn has_files(&self) -> bool {
        self.files.iter().any(|(_, f)| !f.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartBody {
    Text(String),
    File {
        filename: String,
        content_type: String,
        data: Bytes,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub body: PartBody,
}

impl FormPart {
    pub fn is_file(&self) -> bool {
        matches!(self.body, PartBody::File { .. })
    }
}

/// Outbound multipart body, parts kept in insertion order. The wire form is
/// produced by the HTTP transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartEnvelope {
    parts: Vec<FormPart>,
}

impl MultipartEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parts.push(FormPart {
            name: name.into(),
            body: PartBody::Text(value.into()),
        });
    }

    pub fn file(
        &mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: Bytes,
    ) {
        self.parts.push(FormPart {
            name: name.into(),
            body: PartBody::File {
                filename: filename.into(),
                content_type: content_type.into(),
                data,
            },
        });
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn file_parts(&self) -> impl Iterator<Item = &FormPart> {
        self.parts.iter().filter(|p| p.is_file())
    }

    /// Bytes carried by file parts.
    pub fn file_bytes(&self) -> usize {
        self.file_parts()
            .map(|p| match &p.body {
                PartBody::File { data, .. } => data.len(),
                PartBody::Text(_) => 0,
            })
            .sum()
    }
}
