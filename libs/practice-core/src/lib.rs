//! Core practice engine shared by session drivers.
//!
//! Provides:
//! - SM-2 scheduler with millisecond learning steps
//! - Pairing (memory-match) round over a batch of words
//! - Flip-card drill state and swipe grading
//! - Undo history of pre-answer snapshots
//! - Batch drawing from the due-word pool

pub mod batch;
pub mod card;
pub mod error;
pub mod pairing;
pub mod scheduler;
pub mod types;
pub mod undo;

pub use batch::{remaining_pool, Batch, BatchSlot, DEFAULT_BATCH_SIZE};
pub use card::{CardDrill, CardFace, SwipePolicy};
pub use error::{EngineError, Result};
pub use pairing::{CardSide, ClickOutcome, PairingCard, PairingRound};
pub use scheduler::{Schedule, Sm2};
pub use types::{Quality, SwipeDirection, Word, WordStatus};
pub use undo::{AnswerOrigin, UndoEntry, UndoStack};
