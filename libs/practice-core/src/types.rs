//! Core types for the practice engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::scheduler::{self, Sm2};

/// Learning status, always derived from repetition and interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordStatus {
    New,
    Learning,
    Review,
    Mastered,
}

impl Default for WordStatus {
    fn default() -> Self {
        Self::New
    }
}

/// A vocabulary entry together with its spaced repetition state.
///
/// Words are owned by the persistence collaborator. The engine only ever replaces a word with
/// the scheduler's output (or with an undo snapshot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub id: String,
    pub text: String,
    pub translation: String,
    #[serde(default)]
    pub repetition: u32,
    #[serde(default = "default_easiness")]
    pub easiness: f64,
    /// Milliseconds until the word is due again.
    #[serde(default)]
    pub interval: i64,
    /// Epoch milliseconds.
    #[serde(default)]
    pub last_reviewed: i64,
    /// Epoch milliseconds.
    #[serde(default)]
    pub next_review: i64,
}

fn default_easiness() -> f64 {
    scheduler::INITIAL_EASINESS
}

impl Word {
    /// Create a fresh word that is due immediately.
    pub fn new(text: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            translation: translation.into(),
            repetition: 0,
            easiness: scheduler::INITIAL_EASINESS,
            interval: 0,
            last_reviewed: 0,
            next_review: 0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn status(&self) -> WordStatus {
        scheduler::status(self.repetition, self.interval)
    }

    pub fn is_due(&self, now_ms: i64) -> bool {
        self.next_review <= now_ms
    }

    /// Copy of this word after a review of the given quality at `now_ms`.
    pub fn reviewed(&self, quality: Quality, now_ms: i64) -> Result<Self> {
        self.reviewed_with(&Sm2::default(), quality, now_ms)
    }

    pub fn reviewed_with(&self, sm2: &Sm2, quality: Quality, now_ms: i64) -> Result<Self> {
        let next = sm2.schedule(
            self.repetition,
            self.easiness,
            self.interval,
            i32::from(quality.value()),
        )?;

        Ok(Self {
            repetition: next.repetition,
            easiness: next.easiness,
            interval: next.interval,
            last_reviewed: now_ms,
            next_review: now_ms.saturating_add(next.interval),
            ..self.clone()
        })
    }
}

/// Recall grade on the 0-5 SM-2 scale. Grades of 3 and above are a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Quality(pub(crate) u8);

impl Quality {
    pub const MAX: u8 = 5;
    pub const PASS: u8 = 3;

    pub fn new(value: i32) -> Result<Self> {
        if (0..=i32::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(EngineError::invalid_argument(format!(
                "quality {} is outside 0..={}",
                value,
                Self::MAX
            )))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_pass(self) -> bool {
        self.0 >= Self::PASS
    }
}

impl TryFrom<i32> for Quality {
    type Error = EngineError;

    fn try_from(value: i32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Quality> for i32 {
    fn from(quality: Quality) -> Self {
        i32::from(quality.0)
    }
}

/// Direction of a drill card swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    /// "Don't know".
    Left,
    /// "Know".
    Right,
}
