//! Vault file layout and the save/list/load operations.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use confab_core::{HistoryStore, RedactedTurn, Turn, DATETIME_FORMAT};
use confab_openai::ChatTransport;

use crate::error::VaultError;
use crate::summary;

/// Leading part of every vault file name.
const FILE_PREFIX: &str = "confab.history.";
/// Suffix of the full-payload file of a pair.
const DETAIL_SUFFIX: &str = ".detail.json";
/// Suffix of the redacted file of a pair.
const HISTORY_SUFFIX: &str = ".json";

/// On-disk shape of a stored session: the generated one-line summary plus
/// the turn list. `T` is [`RedactedTurn`] for history files and [`Turn`]
/// for detail files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultRecord<T> {
    pub summary: String,
    pub history: Vec<T>,
}

/// A detail file parsed out of the vault directory.
///
/// Entries come back in directory order; callers sort (the session shows
/// them descending by timestamp, newest first).
#[derive(Debug, Clone)]
pub struct VaultEntry {
    /// Unix timestamp embedded in the file name.
    pub timestamp: i64,
    pub path: PathBuf,
    pub record: VaultRecord<Turn>,
}

/// Paths and summary produced by a successful save.
#[derive(Debug, Clone)]
pub struct SavedSession {
    pub history_path: PathBuf,
    pub detail_path: PathBuf,
    pub summary: String,
}

/// File-based store of past sessions.
///
/// Every save produces a new immutable file pair; nothing in the vault is
/// ever rewritten. Loading only mutates the in-memory history store.
pub struct SessionVault {
    dir: PathBuf,
}

impl SessionVault {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot the session into a new file pair, then clear the store.
    ///
    /// Asks the model for a one-line summary first; if that call or either
    /// file write fails, the history store is left untouched. The summary
    /// turn is appended to the persisted arrays only when `keep_summary`
    /// is set.
    pub async fn save(
        &self,
        history: &mut HistoryStore,
        transport: &dyn ChatTransport,
        model: &str,
        temperature: f64,
        keep_summary: bool,
    ) -> Result<SavedSession, VaultError> {
        if history.is_empty() {
            return Err(VaultError::EmptyHistory);
        }

        let mut turns = history.fetch_all();
        let summary_turn = summary::summarize(transport, model, temperature, &turns).await?;
        let summary = summary_turn.answer.clone();
        if keep_summary {
            turns.push(summary_turn);
        }
        let redacted: Vec<RedactedTurn> = turns.iter().map(Turn::redacted).collect();

        // Both names derive from one instant so the pair shares its key.
        let now = Local::now();
        let datetime = now.format(DATETIME_FORMAT).to_string();
        let timestamp = now.timestamp();
        let history_path = self
            .dir
            .join(format!("{FILE_PREFIX}{datetime}.{timestamp}{HISTORY_SUFFIX}"));
        let detail_path = self
            .dir
            .join(format!("{FILE_PREFIX}{datetime}.{timestamp}{DETAIL_SUFFIX}"));

        info!(
            history = %history_path.display(),
            detail = %detail_path.display(),
            "saving session to vault"
        );
        write_record(
            &history_path,
            &VaultRecord {
                summary: summary.clone(),
                history: redacted,
            },
        )?;
        write_record(
            &detail_path,
            &VaultRecord {
                summary: summary.clone(),
                history: turns,
            },
        )?;

        // A save starts a fresh session; only reached once both files are
        // on disk.
        history.clear();

        Ok(SavedSession {
            history_path,
            detail_path,
            summary,
        })
    }

    /// Parse every detail file in the vault directory.
    ///
    /// Files that cannot be read or parsed are skipped with a warning so
    /// one damaged record does not hide the rest.
    pub fn list(&self) -> Result<Vec<VaultEntry>, VaultError> {
        let dir = fs::read_dir(&self.dir).map_err(|source| VaultError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut entries = Vec::new();
        for item in dir {
            let item = item.map_err(|source| VaultError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = item.path();
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let Some(timestamp) = detail_timestamp(name) else {
                continue;
            };
            match read_record(&path) {
                Ok(record) => entries.push(VaultEntry {
                    timestamp,
                    path,
                    record,
                }),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable vault file");
                }
            }
        }
        Ok(entries)
    }

    /// Restore a stored session into the history store.
    ///
    /// Refuses when the store still holds turns: merging two sessions
    /// silently is never wanted, the user saves or resets first.
    pub fn load_into(
        &self,
        entry: &VaultEntry,
        history: &mut HistoryStore,
    ) -> Result<usize, VaultError> {
        if !history.is_empty() {
            return Err(VaultError::HistoryNotEmpty);
        }
        history.restore(entry.record.history.clone());
        Ok(history.len())
    }
}

fn write_record<T: Serialize>(path: &Path, record: &VaultRecord<T>) -> Result<(), VaultError> {
    let json = serde_json::to_string_pretty(record).map_err(VaultError::Encode)?;
    fs::write(path, json).map_err(|source| VaultError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_record(path: &Path) -> Result<VaultRecord<Turn>, VaultError> {
    let content = fs::read_to_string(path).map_err(|source| VaultError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| VaultError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Timestamp embedded in a detail file name, or `None` when the name does
/// not match `confab.history.<datetime>.<timestamp>.detail.json`.
fn detail_timestamp(name: &str) -> Option<i64> {
    let key = name.strip_prefix(FILE_PREFIX)?.strip_suffix(DETAIL_SUFFIX)?;
    let (_, timestamp) = key.rsplit_once('.')?;
    timestamp.parse().ok()
}

// =============================================================================
// Tests
// =============================================================================
