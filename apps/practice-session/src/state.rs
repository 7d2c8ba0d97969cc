//! Observable session state.

use practice_core::{Batch, CardFace, PairingCard, PairingRound, Word};
use serde::Serialize;

/// Session phase for UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SessionPhase {
    Loading,
    Empty,
    BatchPairing { batch: Batch },
    BatchRegular { batch: Batch },
    Finished { total_processed: usize },
    Error { message: String },
}

impl SessionPhase {
    pub fn batch(&self) -> Option<&Batch> {
        match self {
            Self::BatchPairing { batch } | Self::BatchRegular { batch } => Some(batch),
            _ => None,
        }
    }

    pub(crate) fn batch_mut(&mut self) -> Option<&mut Batch> {
        match self {
            Self::BatchPairing { batch } | Self::BatchRegular { batch } => Some(batch),
            _ => None,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Empty => "empty",
            Self::BatchPairing { .. } => "batch_pairing",
            Self::BatchRegular { .. } => "batch_regular",
            Self::Finished { .. } => "finished",
            Self::Error { .. } => "error",
        }
    }
}

/// Pairing board as shown to the learner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairingView {
    pub cards: Vec<PairingCard>,
    pub selected: Option<usize>,
    pub cooling_down: bool,
}

impl From<&PairingRound> for PairingView {
    fn from(round: &PairingRound) -> Self {
        Self {
            cards: round.cards().to_vec(),
            selected: round.selected(),
            cooling_down: round.is_cooling_down(),
        }
    }
}

/// Snapshot published after every processed command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub phase: SessionPhase,
    /// Word on the drill card; only set in `BatchRegular`.
    pub current_word: Option<Word>,
    pub current_index: usize,
    pub card_face: CardFace,
    pub pairing: Option<PairingView>,
    pub can_undo: bool,
    pub error_message: Option<String>,
    /// Distinct words answered in the drill so far.
    pub processed_count: usize,
}

impl SessionState {
    pub fn current_batch(&self) -> Option<&Batch> {
        self.phase.batch()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Loading,
            current_word: None,
            current_index: 0,
            card_face: CardFace::Prompt,
            pairing: None,
            can_undo: false,
            error_message: None,
            processed_count: 0,
        }
    }
}
