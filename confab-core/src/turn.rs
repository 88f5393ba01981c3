//! Conversation turns and their persisted representations.

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Datetime format used for turn stamps and vault file names.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// What produced a turn; controls replay eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnKind {
    /// Regular conversational exchange
    Chat,
    /// Output of a translation call; never replayed as context
    Translation,
    /// Session summary generated during a vault save; never replayed
    Summary,
}

impl TurnKind {
    /// String form matching the vault JSON representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "Chat",
            Self::Translation => "Translation",
            Self::Summary => "Summary",
        }
    }

    /// Whether turns of this kind may be resent as conversational context.
    pub fn replayable(self) -> bool {
        matches!(self, Self::Chat)
    }
}

/// One completed question/answer exchange, including the raw payloads
/// exchanged with the completion API.
///
/// A turn only exists once its answer is complete; nothing mid-stream is
/// ever represented as a `Turn`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
    pub kind: TurnKind,
    /// Local completion time, formatted with [`DATETIME_FORMAT`].
    pub datetime: String,
    /// Raw request body sent to the completion endpoint.
    #[serde(default)]
    pub request: Value,
    /// Raw (reconstructed) response payload.
    #[serde(default)]
    pub response: Value,
}

impl Turn {
    /// Build a completed turn stamped with the current local time.
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        kind: TurnKind,
        request: Value,
        response: Value,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            kind,
            datetime: Local::now().format(DATETIME_FORMAT).to_string(),
            request,
            response,
        }
    }

    /// Copy of this turn without the raw API payloads.
    pub fn redacted(&self) -> RedactedTurn {
        RedactedTurn {
            question: self.question.clone(),
            answer: self.answer.clone(),
            kind: self.kind,
            datetime: self.datetime.clone(),
        }
    }
}

/// Turn stripped of raw API payloads, as written to the vault history file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactedTurn {
    pub question: String,
    pub answer: String,
    pub kind: TurnKind,
    pub datetime: String,
}
