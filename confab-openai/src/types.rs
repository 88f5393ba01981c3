//! Wire types for the chat completions endpoint.

use confab_core::Message;
use serde::{Deserialize, Serialize};

/// Body of a `/chat/completions` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f64,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// One decoded SSE frame from a streaming completion.
///
/// Providers differ in which metadata fields they repeat per frame, so
/// everything defaults rather than failing the whole stream.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Delta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Incremental content carried by a chunk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
}

/// A full completion reassembled from a stream.
///
/// Streaming responses never carry the final answer in one piece, so the
/// client rebuilds it: metadata from the first frame that has it, finish
/// reason from the last, content concatenated in arrival order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Completion {
    pub id: String,
    pub created: i64,
    pub model: String,
    pub content: String,
    pub finish_reason: Option<String>,
}

impl Completion {
    /// Merge one stream chunk into the completion under assembly.
    pub fn absorb(&mut self, chunk: &ChatChunk) -> Option<String> {
        if self.id.is_empty() && !chunk.id.is_empty() {
            self.id = chunk.id.clone();
        }
        if self.model.is_empty() && !chunk.model.is_empty() {
            self.model = chunk.model.clone();
        }
        if self.created == 0 {
            self.created = chunk.created;
        }
        let choice = chunk.choices.first()?;
        if let Some(reason) = &choice.finish_reason {
            self.finish_reason = Some(reason.clone());
        }
        let delta = choice.delta.content.as_deref()?;
        if delta.is_empty() {
            return None;
        }
        self.content.push_str(delta);
        Some(delta.to_string())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_skips_absent_max_tokens() {
        let request = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![Message::user("hello")],
            temperature: 0.2,
            stream: true,
            max_tokens: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"model\":\"gpt-4o-mini\""));
        assert!(json.contains("\"stream\":true"));
        assert!(!json.contains("max_tokens"));
    }

    #[test]
    fn test_request_serialization_includes_max_tokens() {
        let request = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![Message::user("ping")],
            temperature: 0.2,
            stream: false,
            max_tokens: Some(1),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"max_tokens\":1"));
    }

    #[test]
    fn test_chunk_parses_partial_metadata() {
        // Later frames usually carry only the delta.
        let chunk: ChatChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":"hi"}}]}"#).unwrap();
        assert_eq!(chunk.id, "");
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("hi"));
        assert!(chunk.choices[0].finish_reason.is_none());
    }

    #[test]
    fn test_chunk_parses_empty_choices() {
        let chunk: ChatChunk = serde_json::from_str(r#"{"id":"c1","choices":[]}"#).unwrap();
        assert!(chunk.choices.is_empty());
    }

    #[test]
    fn test_absorb_accumulates_content_and_metadata() {
        let mut completion = Completion::default();

        let first: ChatChunk = serde_json::from_str(
            r#"{"id":"c1","created":1714000000,"model":"gpt-4o-mini","choices":[{"delta":{"content":"Hel"}}]}"#,
        )
        .unwrap();
        let second: ChatChunk = serde_json::from_str(
            r#"{"id":"c1","choices":[{"delta":{"content":"lo"},"finish_reason":"stop"}]}"#,
        )
        .unwrap();

        assert_eq!(completion.absorb(&first).as_deref(), Some("Hel"));
        assert_eq!(completion.absorb(&second).as_deref(), Some("lo"));

        assert_eq!(completion.id, "c1");
        assert_eq!(completion.created, 1714000000);
        assert_eq!(completion.model, "gpt-4o-mini");
        assert_eq!(completion.content, "Hello");
        assert_eq!(completion.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_absorb_ignores_empty_delta() {
        let mut completion = Completion::default();
        let chunk: ChatChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":""}}]}"#).unwrap();
        assert!(completion.absorb(&chunk).is_none());
        assert_eq!(completion.content, "");
    }
}
