//! Vault error types.

use std::path::PathBuf;

use thiserror::Error;

use confab_openai::ApiError;

/// Errors surfaced by vault operations.
///
/// Guard violations (`EmptyHistory`, `HistoryNotEmpty`) are user errors:
/// the session reports them and carries on with its state untouched.
#[derive(Debug, Error)]
pub enum VaultError {
    /// `save` was called with nothing to save.
    #[error("history is empty, nothing to save")]
    EmptyHistory,

    /// `load` was called while the current session still holds turns.
    #[error("current session already has history; save or reset it before loading")]
    HistoryNotEmpty,

    /// The summary model call failed; nothing was written.
    #[error("summary generation failed: {0}")]
    Summary(#[from] ApiError),

    /// Reading or writing a vault file failed.
    #[error("vault I/O failed at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A vault file exists but does not hold a valid record.
    #[error("cannot parse vault file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Serializing a record for writing failed.
    #[error("cannot encode vault record: {0}")]
    Encode(serde_json::Error),
}
