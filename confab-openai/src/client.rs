//! Streaming chat client and the transport seam.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::HeaderMap;
use tracing::debug;

use confab_core::{Config, RateLimitSnapshot};

use crate::error::ApiError;
use crate::sse;
use crate::types::{ChatChunk, ChatRequest, Completion};

/// Receives a streaming answer as it arrives.
///
/// `on_complete` fires exactly once, after the transport signals
/// end-of-stream. It is not called when the stream fails.
pub trait StreamSink: Send {
    /// One content delta, in arrival order.
    fn on_chunk(&mut self, delta: &str);
    /// The stream ended cleanly.
    fn on_complete(&mut self);
}

/// Sink that discards everything. Used for background calls whose answer
/// only matters once fully assembled, such as history summaries.
pub struct NullSink;

impl StreamSink for NullSink {
    fn on_chunk(&mut self, _delta: &str) {}
    fn on_complete(&mut self) {}
}

/// The transport the session and vault talk to.
///
/// Production uses [`OpenAiClient`]; tests substitute fakes.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Run one streaming completion call, forwarding deltas to `sink` and
    /// returning the reassembled completion.
    async fn stream_chat(
        &self,
        request: &ChatRequest,
        sink: &mut dyn StreamSink,
    ) -> Result<Completion, ApiError>;

    /// Probe the endpoint for current rate-limit headers.
    async fn fetch_rate_limit(&self, model: &str) -> Result<RateLimitSnapshot, ApiError>;
}

/// HTTP client for an OpenAI-compatible completions endpoint.
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    /// Build a client from configuration: bearer auth, base URL, and the
    /// optional proxy.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(300));
        if config.use_proxy {
            builder = builder.proxy(reqwest::Proxy::all(config.proxy_url.as_str())?);
        }
        let http = builder.build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ChatTransport for OpenAiClient {
    async fn stream_chat(
        &self,
        request: &ChatRequest,
        sink: &mut dyn StreamSink,
    ) -> Result<Completion, ApiError> {
        debug!(model = %request.model, messages = request.messages.len(), "chat request");
        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), &body));
        }

        let mut frames = Box::pin(sse::frames(Box::pin(response.bytes_stream())));
        let mut completion = Completion::default();
        while let Some(frame) = frames.next().await {
            let frame = frame?;
            let chunk: ChatChunk = match serde_json::from_str(&frame) {
                Ok(chunk) => chunk,
                Err(err) => {
                    debug!(error = %err, "skipping malformed stream frame");
                    continue;
                }
            };
            if let Some(delta) = completion.absorb(&chunk) {
                sink.on_chunk(&delta);
            }
        }
        sink.on_complete();

        debug!(
            id = %completion.id,
            chars = completion.content.len(),
            finish = completion.finish_reason.as_deref().unwrap_or(""),
            "chat response complete"
        );
        Ok(completion)
    }

    async fn fetch_rate_limit(&self, model: &str) -> Result<RateLimitSnapshot, ApiError> {
        // A one-token non-streaming call; the interesting part is the
        // response headers, which come back even on quota errors.
        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![confab_core::Message::user("ping")],
            temperature: 0.2,
            stream: false,
            max_tokens: Some(1),
        };
        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "rate-limit probe got non-success status");
        }

        let headers = response.headers();
        Ok(RateLimitSnapshot {
            model: model.to_string(),
            date: header_or_unknown(headers, "date"),
            limit_requests: header_or_unknown(headers, "x-ratelimit-limit-requests"),
            limit_tokens: header_or_unknown(headers, "x-ratelimit-limit-tokens"),
            remaining_requests: header_or_unknown(headers, "x-ratelimit-remaining-requests"),
            remaining_tokens: header_or_unknown(headers, "x-ratelimit-remaining-tokens"),
            reset_requests: header_or_unknown(headers, "x-ratelimit-reset-requests"),
            reset_tokens: header_or_unknown(headers, "x-ratelimit-reset-tokens"),
        })
    }
}

fn header_or_unknown(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}

// =============================================================================
// Tests
// =============================================================================
