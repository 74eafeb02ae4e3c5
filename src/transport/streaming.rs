//! 流式会话 — 语音合成实时音频帧转发
//!
//! Streaming session handoff for live speech synthesis.
//!
//! The binary framing of the vendor session belongs to the
//! [`StreamingTransport`] collaborator. This module opens a session, sends the
//! merged request as the first frame, and forwards every received frame to the
//! caller through a bounded channel. A spawned task owns the session; it stops
//! on end of stream, on a session error, when the caller drops the
//! [`AudioFrameStream`], or when the cancellation token fires, and closes the
//! session exactly once on the way out.

use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use reqwest::header::HeaderMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::types::VendorAudioRequest;
use crate::Result;

/// One open duplex session. Frames are opaque bytes.
#[async_trait]
pub trait StreamingSession: Send {
    async fn send(&mut self, frame: Bytes) -> Result<()>;

    /// Next frame, or `None` once the peer has finished.
    async fn recv(&mut self) -> Option<Result<Bytes>>;

    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
pub trait StreamingTransport: Send + Sync {
    async fn open(&self, url: &str, headers: &HeaderMap) -> Result<Box<dyn StreamingSession>>;
}

/// Audio frames in vendor order. Dropping the stream cancels the session.
pub struct AudioFrameStream {
    rx: mpsc::Receiver<Result<Bytes>>,
    cancel: CancellationToken,
}

impl AudioFrameStream {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token observed by the forwarding task.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Stream for AudioFrameStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for AudioFrameStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Open a session, send the request and start forwarding frames.
///
/// Failures while opening or sending the request are returned directly; later
/// session errors arrive as the last stream item.
pub async fn start_session(
    transport: &dyn StreamingTransport,
    url: &str,
    headers: &HeaderMap,
    request: &VendorAudioRequest,
    buffer: usize,
) -> Result<AudioFrameStream> {
    let mut session = transport.open(url, headers).await?;
    let frame = Bytes::from(serde_json::to_vec(request)?);
    if let Err(e) = session.send(frame).await {
        if let Err(close_err) = session.close().await {
            tracing::warn!(error = %close_err, "closing session after failed send");
        }
        return Err(e);
    }

    tracing::info!(url = %url, reqid = %request.request.reqid, "speech session started");
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let cancel = CancellationToken::new();
    tokio::spawn(forward_frames(session, tx, cancel.clone()));
    Ok(AudioFrameStream { rx, cancel })
}

async fn forward_frames(
    mut session: Box<dyn StreamingSession>,
    tx: mpsc::Sender<Result<Bytes>>,
    cancel: CancellationToken,
) {
    let mut frames = 0usize;
    loop {
        let item = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(frames, "speech session cancelled");
                break;
            }
            item = session.recv() => item,
        };
        let Some(item) = item else {
            tracing::debug!(frames, "speech session finished");
            break;
        };
        let failed = item.is_err();
        let delivered = tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            sent = tx.send(item) => sent.is_ok(),
        };
        if !delivered {
            tracing::debug!(frames, "caller went away");
            break;
        }
        if failed {
            break;
        }
        frames += 1;
    }
    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "failed to close speech session");
    }
}
