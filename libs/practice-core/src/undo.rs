//! Bounded undo history of pre-answer word snapshots.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::types::Word;

/// Where an answer was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOrigin {
    Pairing,
    Drill,
}

/// Snapshot taken right before an answer was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoEntry {
    /// The word as it was before the scheduler ran.
    pub word: Word,
    /// Position of the word inside its batch.
    pub position: usize,
    /// Sequence number of the batch the answer belonged to.
    pub batch_seq: u64,
    pub origin: AnswerOrigin,
}

/// LIFO of undo entries. When full, the oldest entry is dropped.
#[derive(Debug, Clone)]
pub struct UndoStack {
    entries: VecDeque<UndoEntry>,
    capacity: usize,
}

impl UndoStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, entry: UndoEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn pop(&mut self) -> Result<UndoEntry> {
        self.entries.pop_back().ok_or(EngineError::EmptyUndo)
    }

    pub fn peek(&self) -> Option<&UndoEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
