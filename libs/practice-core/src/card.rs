//! Flip-card drill state for a single word.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::types::{Quality, SwipeDirection};

/// Which face of the drill card is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardFace {
    Prompt,
    Answer,
}

impl Default for CardFace {
    fn default() -> Self {
        Self::Prompt
    }
}

/// Maps swipe directions to quality grades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipePolicy {
    know: Quality,
    dont_know: Quality,
}

impl SwipePolicy {
    /// `know` must be a passing grade and `dont_know` a failing one.
    pub fn new(know: Quality, dont_know: Quality) -> Result<Self> {
        if !know.is_pass() {
            return Err(EngineError::invalid_argument(format!(
                "swipe-right quality {} must be at least {}",
                know.value(),
                Quality::PASS
            )));
        }
        if dont_know.is_pass() {
            return Err(EngineError::invalid_argument(format!(
                "swipe-left quality {} must be below {}",
                dont_know.value(),
                Quality::PASS
            )));
        }
        Ok(Self { know, dont_know })
    }

    pub fn quality(&self, direction: SwipeDirection) -> Quality {
        match direction {
            SwipeDirection::Right => self.know,
            SwipeDirection::Left => self.dont_know,
        }
    }
}

impl Default for SwipePolicy {
    fn default() -> Self {
        Self {
            know: Quality(5),
            dont_know: Quality(1),
        }
    }
}

/// Two-state Prompt/Answer machine.
#[derive(Debug, Clone, Default)]
pub struct CardDrill {
    face: CardFace,
    policy: SwipePolicy,
}

impl CardDrill {
    pub fn new(policy: SwipePolicy) -> Self {
        Self {
            face: CardFace::Prompt,
            policy,
        }
    }

    pub fn face(&self) -> CardFace {
        self.face
    }

    /// Toggle between the two faces.
    pub fn flip(&mut self) -> CardFace {
        self.face = match self.face {
            CardFace::Prompt => CardFace::Answer,
            CardFace::Answer => CardFace::Prompt,
        };
        self.face
    }

    /// Grade the current word. Only valid while the answer is showing.
    ///
    /// The card stays on `Answer` until [`CardDrill::reset`]; the caller resets it once the
    /// answer has been stored.
    pub fn swipe(&self, direction: SwipeDirection) -> Result<Quality> {
        match self.face {
            CardFace::Answer => Ok(self.policy.quality(direction)),
            CardFace::Prompt => Err(EngineError::invalid_transition(
                "cannot swipe before the card is flipped",
            )),
        }
    }

    pub fn reset(&mut self) {
        self.face = CardFace::Prompt;
    }
}
