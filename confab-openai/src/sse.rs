//! Incremental server-sent-events frame reader.
//!
//! The completions endpoint streams its answer as SSE over a chunked body.
//! Transport chunk boundaries fall anywhere, including mid-frame, so bytes
//! are buffered and complete lines carved off as they become available; a
//! partial trailing frame survives across reads instead of being dropped.

use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, Stream, StreamExt};

use crate::error::ApiError;

/// Sentinel payload that closes a completion stream.
const DONE_MARKER: &str = "[DONE]";

/// Turn a raw byte stream into a stream of SSE data payloads.
///
/// Yields the payload of every `data:` frame. The `[DONE]` sentinel, blank
/// separator lines, and `:` comment lines are filtered out. A transport
/// error is yielded as the final item, after which the stream ends.
pub fn frames<S>(byte_stream: S) -> impl Stream<Item = Result<String, ApiError>>
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Unpin,
{
    stream::unfold(
        (byte_stream, BytesMut::with_capacity(8192), false),
        |(mut body, mut buffer, done)| async move {
            if done {
                return None;
            }
            loop {
                // Carve complete lines off the front of the buffer.
                if let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                    let mut line = buffer.split_to(pos + 1);
                    line.truncate(line.len() - 1);
                    if line.last() == Some(&b'\r') {
                        line.truncate(line.len() - 1);
                    }
                    if let Ok(text) = std::str::from_utf8(&line) {
                        if let Some(payload) = payload_of(text) {
                            return Some((Ok(payload), (body, buffer, false)));
                        }
                    }
                    continue;
                }

                match body.next().await {
                    Some(Ok(chunk)) => buffer.extend_from_slice(&chunk),
                    Some(Err(err)) => {
                        return Some((Err(ApiError::from(err)), (body, buffer, true)));
                    }
                    None => {
                        // The server may end the body without a trailing
                        // newline; flush whatever frame is left.
                        let leftover = std::str::from_utf8(&buffer).ok().and_then(payload_of);
                        buffer.clear();
                        return leftover.map(|payload| (Ok(payload), (body, buffer, true)));
                    }
                }
            }
        },
    )
}

/// Extract the data payload of a single SSE line, if it carries one.
fn payload_of(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    let payload = line
        .strip_prefix("data: ")
        .or_else(|| line.strip_prefix("data:"))?
        .trim();
    if payload.is_empty() || payload == DONE_MARKER {
        return None;
    }
    Some(payload.to_string())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream::iter;

    fn chunks(parts: &[&str]) -> Vec<Result<Bytes, reqwest::Error>> {
        parts
            .iter()
            .map(|part| Ok(Bytes::from(part.to_string())))
            .collect()
    }

    async fn collect_payloads(parts: &[&str]) -> Vec<String> {
        frames(iter(chunks(parts)))
            .map(|frame| frame.unwrap())
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_single_frame() {
        let payloads = collect_payloads(&["data: {\"a\":1}\n\n"]).await;
        assert_eq!(payloads, vec![r#"{"a":1}"#]);
    }

    #[tokio::test]
    async fn test_multiple_frames_in_one_chunk() {
        let payloads = collect_payloads(&["data: one\n\ndata: two\n\ndata: three\n\n"]).await;
        assert_eq!(payloads, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_frame_split_across_chunks() {
        let payloads =
            collect_payloads(&["data: {\"content\":\"hel", "lo\"}\n\ndata: next\n\n"]).await;
        assert_eq!(payloads, vec![r#"{"content":"hello"}"#, "next"]);
    }

    #[tokio::test]
    async fn test_split_inside_field_prefix() {
        let payloads = collect_payloads(&["da", "ta: pay", "load\n\n"]).await;
        assert_eq!(payloads, vec!["payload"]);
    }

    #[tokio::test]
    async fn test_done_marker_is_filtered() {
        let payloads = collect_payloads(&["data: alpha\n\ndata: [DONE]\n\n"]).await;
        assert_eq!(payloads, vec!["alpha"]);
    }

    #[tokio::test]
    async fn test_comments_and_blank_lines_skipped() {
        let payloads =
            collect_payloads(&[": keep-alive\n\nevent: message\ndata: body\n\n"]).await;
        assert_eq!(payloads, vec!["body"]);
    }

    #[tokio::test]
    async fn test_crlf_line_endings() {
        let payloads = collect_payloads(&["data: first\r\n\r\ndata: second\r\n\r\n"]).await;
        assert_eq!(payloads, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_no_space_after_colon() {
        let payloads = collect_payloads(&["data:tight\n\n"]).await;
        assert_eq!(payloads, vec!["tight"]);
    }

    #[tokio::test]
    async fn test_trailing_frame_without_newline_is_flushed() {
        let payloads = collect_payloads(&["data: first\n\ndata: last"]).await;
        assert_eq!(payloads, vec!["first", "last"]);
    }

    #[tokio::test]
    async fn test_empty_stream() {
        let payloads = collect_payloads(&[]).await;
        assert!(payloads.is_empty());
    }

    #[tokio::test]
    async fn test_empty_data_payload_skipped() {
        let payloads = collect_payloads(&["data: \n\ndata: real\n\n"]).await;
        assert_eq!(payloads, vec!["real"]);
    }

    #[test]
    fn test_payload_of_variants() {
        assert_eq!(payload_of("data: x"), Some("x".to_string()));
        assert_eq!(payload_of("data:x"), Some("x".to_string()));
        assert_eq!(payload_of("data: [DONE]"), None);
        assert_eq!(payload_of(": comment"), None);
        assert_eq!(payload_of(""), None);
        assert_eq!(payload_of("event: message"), None);
    }
}
