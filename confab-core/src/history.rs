//! Bounded FIFO store of completed turns for the active session.

use std::collections::VecDeque;

use tracing::warn;

use crate::turn::{RedactedTurn, Turn};

/// Ordered, capacity-bounded record of completed turns, oldest first.
///
/// The store is exclusively owned by the running session: restoring from the
/// vault replaces its contents wholesale, never merges.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    turns: VecDeque<Turn>,
    max_history: usize,
}

impl HistoryStore {
    /// Create an empty store holding at most `max_history` turns.
    ///
    /// Capacity comes from configuration, which validates it positive.
    pub fn new(max_history: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(max_history),
            max_history,
        }
    }

    pub fn capacity(&self) -> usize {
        self.max_history
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn has_history(&self) -> bool {
        !self.turns.is_empty()
    }

    /// Append a completed turn, evicting the oldest one when at capacity.
    pub fn append(&mut self, turn: Turn) {
        if self.turns.len() >= self.max_history {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    /// The most recent turn, if any.
    pub fn fetch_last(&self) -> Option<&Turn> {
        self.turns.back()
    }

    /// Iterate turns oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Turn> {
        self.turns.iter()
    }

    /// All turns oldest to newest, as an owned snapshot.
    pub fn fetch_all(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    /// All turns oldest to newest, without raw API payloads.
    pub fn fetch_redacted(&self) -> Vec<RedactedTurn> {
        self.turns.iter().map(Turn::redacted).collect()
    }

    /// Empty the store. Irreversible without a prior vault save.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Replace the contents wholesale with `turns`.
    ///
    /// A restored source is trusted to respect capacity already; if it does
    /// not, only the most recent `max_history` turns are kept.
    pub fn restore(&mut self, mut turns: Vec<Turn>) {
        if turns.len() > self.max_history {
            warn!(
                restored = turns.len(),
                capacity = self.max_history,
                "restored history exceeds capacity, keeping most recent turns"
            );
            turns.drain(..turns.len() - self.max_history);
        }
        self.turns = turns.into();
    }
}
