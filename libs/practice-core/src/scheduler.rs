//! SM-2 spaced repetition scheduler.
//!
//! Based on SuperMemo 2, with intervals expressed in milliseconds and short learning steps
//! (1 minute, then 6 minutes) before the exponential phase.
//!
//! Quality ratings (0-5):
//! - 0-2: failed recall, progress resets
//! - 3-5: passed recall, progress grows

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::types::WordStatus;

pub const MINUTE_MS: i64 = 60_000;
pub const DAY_MS: i64 = 24 * 60 * MINUTE_MS;

pub const INITIAL_EASINESS: f64 = 2.5;
pub const MIN_EASINESS: f64 = 1.3;

/// Upper bound of the `Learning` tier.
pub const LEARNING_MAX_INTERVAL_MS: i64 = 6 * MINUTE_MS;
/// Intervals beyond this are `Mastered`.
pub const MASTERED_AFTER_MS: i64 = 21 * DAY_MS;

/// Scheduler output for a single review.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub repetition: u32,
    pub easiness: f64,
    /// Milliseconds.
    pub interval: i64,
}

/// SM-2 algorithm with configurable parameters.
#[derive(Debug, Clone)]
pub struct Sm2 {
    pub minimum_easiness: f64,
    pub first_interval: i64,
    pub second_interval: i64,
}

impl Default for Sm2 {
    fn default() -> Self {
        Self {
            minimum_easiness: MIN_EASINESS,
            first_interval: MINUTE_MS,
            second_interval: LEARNING_MAX_INTERVAL_MS,
        }
    }
}

impl Sm2 {
    /// Next repetition, easiness and interval after a review graded `quality`.
    pub fn schedule(
        &self,
        repetition: u32,
        easiness: f64,
        interval: i64,
        quality: i32,
    ) -> Result<Schedule> {
        if !(0..=5).contains(&quality) {
            return Err(EngineError::invalid_argument(format!(
                "quality {} is outside 0..=5",
                quality
            )));
        }
        if interval < 0 {
            return Err(EngineError::invalid_argument(format!(
                "interval {} is negative",
                interval
            )));
        }
        if !easiness.is_finite() {
            return Err(EngineError::invalid_argument(format!(
                "easiness {} is not a finite number",
                easiness
            )));
        }

        let new_easiness = self.next_easiness(easiness, quality);

        if quality < 3 {
            return Ok(Schedule {
                repetition: 0,
                easiness: new_easiness,
                interval: self.first_interval,
            });
        }

        let new_repetition = repetition.saturating_add(1);
        let new_interval = match new_repetition {
            1 => self.first_interval,
            2 => self.second_interval,
            // Saturating float-to-int cast keeps huge intervals finite.
            _ => ((interval as f64) * new_easiness).round() as i64,
        };

        Ok(Schedule {
            repetition: new_repetition,
            easiness: new_easiness,
            interval: new_interval.max(self.first_interval),
        })
    }

    /// EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02)), floored at the minimum.
    fn next_easiness(&self, easiness: f64, quality: i32) -> f64 {
        let miss = f64::from(5 - quality);
        (easiness + (0.1 - miss * (0.08 + miss * 0.02))).max(self.minimum_easiness)
    }
}

/// Schedule with the default parameters.
pub fn schedule(repetition: u32, easiness: f64, interval: i64, quality: i32) -> Result<Schedule> {
    Sm2::default().schedule(repetition, easiness, interval, quality)
}

/// Derive the status tier from repetition and interval.
pub fn status(repetition: u32, interval: i64) -> WordStatus {
    if interval > MASTERED_AFTER_MS {
        WordStatus::Mastered
    } else if interval > LEARNING_MAX_INTERVAL_MS {
        WordStatus::Review
    } else if repetition == 0 {
        WordStatus::New
    } else {
        WordStatus::Learning
    }
}

/// Progress towards mastery in [0, 1].
pub fn progress(interval: i64) -> f64 {
    if interval <= 0 {
        return 0.0;
    }
    (interval as f64 / MASTERED_AFTER_MS as f64).min(1.0)
}
