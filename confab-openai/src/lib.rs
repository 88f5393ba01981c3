//! OpenAI-compatible completion client for confab.
//!
//! Talks to a `/chat/completions` endpoint in streaming mode. Response bytes
//! arrive as server-sent events whose frames can be split across transport
//! chunks, so [`sse`] reassembles complete frames before they are decoded.
//! [`ChatTransport`] is the seam the session and the vault depend on, which
//! keeps both testable against fake transports.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod client;
pub mod error;
pub mod sse;
pub mod types;

pub use client::{ChatTransport, NullSink, OpenAiClient, StreamSink};
pub use error::ApiError;
pub use types::{ChatChunk, ChatRequest, ChunkChoice, Completion, Delta};
