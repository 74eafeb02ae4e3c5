//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use mockito::{Server, ServerGuard};
use reqwest::header::HeaderMap;
use volcengine_relay::{
    Adaptor, AdaptorConfig, OpenAiCompatibleRelay, StreamingSession, StreamingTransport,
};

/// What an in-memory session saw.
#[derive(Default)]
pub struct SessionProbe {
    pub opened_url: Mutex<Option<String>>,
    pub authorization: Mutex<Option<String>>,
    pub sent: Mutex<Vec<Bytes>>,
    pub closes: AtomicUsize,
}

impl SessionProbe {
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn first_frame(&self) -> Option<serde_json::Value> {
        let sent = self.sent.lock().unwrap();
        sent.first().and_then(|f| serde_json::from_slice(f).ok())
    }
}

struct MemorySession {
    frames: VecDeque<Bytes>,
    hang: bool,
    probe: Arc<SessionProbe>,
}

#[async_trait]
impl StreamingSession for MemorySession {
    async fn send(&mut self, frame: Bytes) -> volcengine_relay::Result<()> {
        self.probe.sent.lock().unwrap().push(frame);
        Ok(())
    }

    async fn recv(&mut self) -> Option<volcengine_relay::Result<Bytes>> {
        match self.frames.pop_front() {
            Some(f) => Some(Ok(f)),
            None if self.hang => futures::future::pending().await,
            None => None,
        }
    }

    async fn close(&mut self) -> volcengine_relay::Result<()> {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Streaming collaborator that replays canned frames.
pub struct MemoryStreaming {
    pub frames: Vec<Bytes>,
    /// Keep the session open after the last frame instead of ending it.
    pub hang: bool,
    pub probe: Arc<SessionProbe>,
}

impl MemoryStreaming {
    pub fn new(frames: &[&'static str]) -> Self {
        Self {
            frames: frames.iter().map(|f| Bytes::from_static(f.as_bytes())).collect(),
            hang: false,
            probe: Arc::new(SessionProbe::default()),
        }
    }

    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }
}

#[async_trait]
impl StreamingTransport for MemoryStreaming {
    async fn open(
        &self,
        url: &str,
        headers: &HeaderMap,
    ) -> volcengine_relay::Result<Box<dyn StreamingSession>> {
        *self.probe.opened_url.lock().unwrap() = Some(url.to_string());
        *self.probe.authorization.lock().unwrap() = headers
            .get(reqwest::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok(Box::new(MemorySession {
            frames: self.frames.iter().cloned().collect(),
            hang: self.hang,
            probe: self.probe.clone(),
        }))
    }
}

/// Mock vendor plus an adaptor pointed at it.
pub struct MockVendor {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockVendor {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    pub fn adaptor(&self) -> Adaptor {
        self.adaptor_with(Arc::new(MemoryStreaming::new(&[])))
    }

    pub fn adaptor_with(&self, streaming: Arc<dyn StreamingTransport>) -> Adaptor {
        let config = AdaptorConfig::new()
            .with_base_url(self.base_url.clone())
            .with_timeout_secs(5);
        let rest = Arc::new(OpenAiCompatibleRelay::from_config(&config).unwrap());
        Adaptor::new(config, rest, streaming).unwrap()
    }
}

/// Adaptor on the vendor default base URL; only for calls that never reach HTTP.
pub fn default_adaptor(streaming: Arc<dyn StreamingTransport>) -> Adaptor {
    let config = AdaptorConfig::new();
    let rest = Arc::new(OpenAiCompatibleRelay::from_config(&config).unwrap());
    Adaptor::new(config, rest, streaming).unwrap()
}
