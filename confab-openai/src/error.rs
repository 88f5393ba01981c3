//! Completion API error types.

use thiserror::Error;

/// Errors surfaced by the completion client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API answered with a non-success status code.
    #[error("completion API returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// The request never completed: connect, TLS, proxy, or body read failed.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    /// Build an API error from a status code and response body.
    ///
    /// The body is trimmed and capped so a multi-kilobyte HTML error page
    /// does not flood the terminal.
    pub fn from_status(status: u16, body: &str) -> Self {
        const MAX_MESSAGE: usize = 600;
        let trimmed = body.trim();
        let message = if trimmed.is_empty() {
            "(empty response body)".to_string()
        } else if trimmed.len() > MAX_MESSAGE {
            let cut = trimmed
                .char_indices()
                .take_while(|(idx, _)| *idx < MAX_MESSAGE)
                .last()
                .map(|(idx, ch)| idx + ch.len_utf8())
                .unwrap_or(0);
            format!("{}...", &trimmed[..cut])
        } else {
            trimmed.to_string()
        };
        Self::Api { status, message }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_trims_body() {
        let err = ApiError::from_status(401, "  invalid api key  ");
        assert_eq!(
            err.to_string(),
            "completion API returned status 401: invalid api key"
        );
    }

    #[test]
    fn test_from_status_empty_body() {
        let err = ApiError::from_status(503, "   ");
        match err {
            ApiError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "(empty response body)");
            }
            ApiError::Transport(_) => panic!("expected Api variant"),
        }
    }

    #[test]
    fn test_from_status_caps_long_body() {
        let body = "x".repeat(5000);
        let err = ApiError::from_status(500, &body);
        match err {
            ApiError::Api { message, .. } => {
                assert!(message.len() <= 603);
                assert!(message.ends_with("..."));
            }
            ApiError::Transport(_) => panic!("expected Api variant"),
        }
    }

    #[test]
    fn test_from_status_respects_char_boundaries() {
        // Multi-byte characters straddling the cap must not split.
        let body = "é".repeat(400);
        let err = ApiError::from_status(500, &body);
        match err {
            ApiError::Api { message, .. } => assert!(message.ends_with("...")),
            ApiError::Transport(_) => panic!("expected Api variant"),
        }
    }
}
