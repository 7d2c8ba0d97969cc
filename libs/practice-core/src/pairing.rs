//! Memory-match round played over a batch before the flip-card drill.
//!
//! Every word contributes two cards, one showing the original text and one showing the
//! translation. Picking an original and a translation of the same word matches them. A wrong
//! pair is flagged as mismatched and the round refuses clicks until the caller clears the flag
//! after its cool-down.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::types::Word;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardSide {
    Original,
    Translation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingCard {
    pub id: usize,
    pub word_id: String,
    pub text: String,
    pub side: CardSide,
    pub matched: bool,
    pub mismatched: bool,
}

/// Result of clicking a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The card is now the selection. `speak` carries the translation for translation cards.
    Selected { card: usize, speak: Option<String> },
    /// Both cards of `word_id` are matched.
    Matched {
        word_id: String,
        translation: String,
        round_complete: bool,
    },
    /// Wrong pair; both cards stay flagged until [`PairingRound::clear_mismatch`].
    Mismatched { first: usize, second: usize },
    /// Click on a matched card or during the mismatch cool-down.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct PairingRound {
    cards: Vec<PairingCard>,
    selected: Option<usize>,
    cooling_down: bool,
    finish_signalled: bool,
}

impl PairingRound {
    pub fn new<R: Rng + ?Sized>(words: &[Word], rng: &mut R) -> Self {
        let mut cards: Vec<PairingCard> = words
            .iter()
            .flat_map(|word| {
                [
                    (word, CardSide::Original, word.text.clone()),
                    (word, CardSide::Translation, word.translation.clone()),
                ]
            })
            .map(|(word, side, text)| PairingCard {
                id: 0,
                word_id: word.id.clone(),
                text,
                side,
                matched: false,
                mismatched: false,
            })
            .collect();

        cards.shuffle(rng);
        for (id, card) in cards.iter_mut().enumerate() {
            card.id = id;
        }

        Self {
            cards,
            selected: None,
            cooling_down: false,
            finish_signalled: false,
        }
    }

    pub fn cards(&self) -> &[PairingCard] {
        &self.cards
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_cooling_down(&self) -> bool {
        self.cooling_down
    }

    /// True exactly when every card is matched. A round without cards is complete.
    pub fn is_complete(&self) -> bool {
        self.cards.iter().all(|card| card.matched)
    }

    pub fn click(&mut self, card_id: usize) -> Result<ClickOutcome> {
        let card = self.cards.get(card_id).ok_or_else(|| {
            EngineError::invalid_argument(format!("no pairing card with id {}", card_id))
        })?;

        if self.cooling_down || card.matched || card.mismatched {
            return Ok(ClickOutcome::Ignored);
        }

        let current = match self.selected {
            Some(current) => &self.cards[current],
            None => return Ok(self.select(card_id)),
        };

        if current.side == card.side {
            return Ok(self.select(card_id));
        }

        if current.word_id == card.word_id {
            let word_id = card.word_id.clone();
            let translation = self.translation_of(&word_id);
            self.mark_matched(&word_id);
            return Ok(ClickOutcome::Matched {
                word_id,
                translation,
                round_complete: self.is_complete(),
            });
        }

        let first = current.id;
        self.cards[first].mismatched = true;
        self.cards[card_id].mismatched = true;
        self.cooling_down = true;
        Ok(ClickOutcome::Mismatched {
            first,
            second: card_id,
        })
    }

    /// End of the mismatch cool-down: unflag cards and drop the selection.
    pub fn clear_mismatch(&mut self) {
        for card in &mut self.cards {
            card.mismatched = false;
        }
        self.selected = None;
        self.cooling_down = false;
    }

    /// Match both cards of a word without going through clicks.
    ///
    /// Returns false when the word is unknown or already matched.
    pub fn mark_matched(&mut self, word_id: &str) -> bool {
        let mut changed = false;
        for card in self.cards.iter_mut().filter(|card| card.word_id == word_id) {
            changed |= !card.matched;
            card.matched = true;
            card.mismatched = false;
        }
        if let Some(selected) = self.selected {
            if self.cards[selected].word_id == word_id {
                self.selected = None;
            }
        }
        changed
    }

    /// Put both cards of a word back in play, e.g. after its match could not be stored.
    ///
    /// The finish signal is re-armed so a later completion fires again.
    pub fn unmatch(&mut self, word_id: &str) -> bool {
        let mut changed = false;
        for card in self.cards.iter_mut().filter(|card| card.word_id == word_id) {
            changed |= card.matched;
            card.matched = false;
        }
        if changed {
            self.finish_signalled = false;
        }
        changed
    }

    /// Returns true once, the first time it is called on a complete round.
    pub fn take_finish_signal(&mut self) -> bool {
        if self.finish_signalled || !self.is_complete() {
            return false;
        }
        self.finish_signalled = true;
        true
    }

    fn select(&mut self, card_id: usize) -> ClickOutcome {
        self.selected = Some(card_id);
        let card = &self.cards[card_id];
        let speak = match card.side {
            CardSide::Translation => Some(card.text.clone()),
            CardSide::Original => None,
        };
        ClickOutcome::Selected {
            card: card_id,
            speak,
        }
    }

    fn translation_of(&self, word_id: &str) -> String {
        self.cards
            .iter()
            .find(|card| card.word_id == word_id && card.side == CardSide::Translation)
            .map(|card| card.text.clone())
            .unwrap_or_default()
    }
}
