//! Test data fixtures.

use practice_core::scheduler::DAY_MS;
use practice_core::Word;

/// `count` fresh words with ids `w0`, `w1`, ...
pub fn words(count: usize) -> Vec<Word> {
    (0..count)
        .map(|i| Word::new(format!("wort{}", i), format!("word{}", i)).with_id(format!("w{}", i)))
        .collect()
}

/// A word that has been reviewed successfully a few times.
pub fn mature_word(id: &str) -> Word {
    Word {
        repetition: 4,
        easiness: 2.2,
        interval: 10 * DAY_MS,
        ..Word::new("baum", "tree").with_id(id)
    }
}
