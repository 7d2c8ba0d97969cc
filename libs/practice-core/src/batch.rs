//! Batches of due words.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::Word;

pub const DEFAULT_BATCH_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSlot {
    pub word: Word,
    /// Matched during the pairing round.
    pub matched: bool,
    /// Answered during the drill.
    pub completed: bool,
}

/// An ordered slice of the due pool, drawn once per round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// Increments with every draw inside a session.
    pub seq: u64,
    pub slots: Vec<BatchSlot>,
}

impl Batch {
    /// First `min(size, pool.len())` words of the pool in source order, or None if the pool
    /// is empty.
    pub fn draw(seq: u64, pool: &[Word], size: usize) -> Option<Self> {
        if pool.is_empty() || size == 0 {
            return None;
        }

        let slots = pool
            .iter()
            .take(size)
            .map(|word| BatchSlot {
                word: word.clone(),
                matched: false,
                completed: false,
            })
            .collect();

        Some(Self { seq, slots })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn word(&self, position: usize) -> Option<&Word> {
        self.slots.get(position).map(|slot| &slot.word)
    }

    pub fn words(&self) -> Vec<Word> {
        self.slots.iter().map(|slot| slot.word.clone()).collect()
    }

    pub fn position_of(&self, word_id: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.word.id == word_id)
    }

    /// Replace the stored copy of a word with the same id. Returns false if absent.
    pub fn replace_word(&mut self, word: Word) -> bool {
        match self.position_of(&word.id) {
            Some(position) => {
                self.slots[position].word = word;
                true
            }
            None => false,
        }
    }
}

/// Words from the latest due snapshot that this session has not finished yet, in source order.
pub fn remaining_pool(snapshot: &[Word], processed: &HashSet<String>) -> Vec<Word> {
    snapshot
        .iter()
        .filter(|word| !processed.contains(&word.id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pool(n: usize) -> Vec<Word> {
        (0..n)
            .map(|i| Word::new(format!("w{}", i), format!("t{}", i)).with_id(format!("w{}", i)))
            .collect()
    }

    fn ids(batch: &Batch) -> Vec<String> {
        batch.slots.iter().map(|slot| slot.word.id.clone()).collect()
    }

    #[test]
    fn draws_prefix_in_source_order() {
        let batch = Batch::draw(1, &pool(6), DEFAULT_BATCH_SIZE).unwrap();
        assert_eq!(ids(&batch), vec!["w0", "w1", "w2", "w3", "w4"]);
        assert!(batch.slots.iter().all(|slot| !slot.matched && !slot.completed));
    }

    #[test]
    fn last_batch_may_be_smaller() {
        let words = pool(6);
        let processed: HashSet<String> = words[..5].iter().map(|w| w.id.clone()).collect();
        let rest = remaining_pool(&words, &processed);
        let batch = Batch::draw(2, &rest, DEFAULT_BATCH_SIZE).unwrap();
        assert_eq!(ids(&batch), vec!["w5"]);
        assert_eq!(batch.seq, 2);
    }

    #[test]
    fn empty_pool_draws_nothing() {
        assert!(Batch::draw(1, &[], DEFAULT_BATCH_SIZE).is_none());
    }

    #[test]
    fn batch_never_exceeds_size() {
        for size in 1..8 {
            for n in 1..12 {
                let batch = Batch::draw(1, &pool(n), size).unwrap();
                assert_eq!(batch.len(), n.min(size));
            }
        }
    }

    #[test]
    fn replace_word_updates_matching_slot() {
        let mut batch = Batch::draw(1, &pool(2), 5).unwrap();
        let mut word = batch.word(1).unwrap().clone();
        word.repetition = 4;
        assert!(batch.replace_word(word));
        assert_eq!(batch.word(1).unwrap().repetition, 4);
        assert!(!batch.replace_word(Word::new("x", "y")));
    }
}
