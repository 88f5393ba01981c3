//! One-line session summaries for vault records.

use serde_json::Value;

use confab_core::{Message, Turn, TurnKind};
use confab_openai::{ApiError, ChatRequest, ChatTransport, NullSink};

/// Instruction sent along with the transcript when a session is saved.
const SUMMARY_PROMPT: &str =
    "Summarize the conversation below in one short sentence. Reply with only that sentence.";

/// Ask the model for a one-line summary of `turns`.
///
/// Returns a `Summary`-kind turn carrying the raw request and response
/// payloads, so the detail file keeps a full audit of this extra call.
/// Summary turns are never replayed as conversational context.
pub async fn summarize(
    transport: &dyn ChatTransport,
    model: &str,
    temperature: f64,
    turns: &[Turn],
) -> Result<Turn, ApiError> {
    let request = ChatRequest {
        model: model.to_string(),
        messages: vec![
            Message::system(SUMMARY_PROMPT),
            Message::user(transcript(turns)),
        ],
        temperature,
        stream: true,
        max_tokens: None,
    };
    let completion = transport.stream_chat(&request, &mut NullSink).await?;
    let answer = completion.content.trim().to_string();
    Ok(Turn::new(
        SUMMARY_PROMPT,
        answer,
        TurnKind::Summary,
        serde_json::to_value(&request).unwrap_or(Value::Null),
        serde_json::to_value(&completion).unwrap_or(Value::Null),
    ))
}

fn transcript(turns: &[Turn]) -> String {
    let mut text = String::new();
    for turn in turns {
        text.push_str("user: ");
        text.push_str(&turn.question);
        text.push_str("\nassistant: ");
        text.push_str(&turn.answer);
        text.push('\n');
    }
    text
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_interleaves_roles() {
        let turns = vec![
            Turn::new("hi", "hello", TurnKind::Chat, Value::Null, Value::Null),
            Turn::new("two", "second", TurnKind::Chat, Value::Null, Value::Null),
        ];
        let text = transcript(&turns);
        assert_eq!(
            text,
            "user: hi\nassistant: hello\nuser: two\nassistant: second\n"
        );
    }

    #[test]
    fn test_transcript_of_empty_history() {
        assert_eq!(transcript(&[]), "");
    }
}
