//! Session configuration, read from `PRACTICE_*` environment variables.

use std::str::FromStr;
use std::time::Duration;

use practice_core::{Quality, SwipePolicy, DEFAULT_BATCH_SIZE};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub batch_size: usize,
    /// Grade given by a right swipe.
    pub know_quality: u8,
    /// Grade given by a left swipe.
    pub dont_know_quality: u8,
    /// Grade given by a pairing match.
    pub match_quality: u8,
    pub mismatch_cooldown_ms: u64,
    pub pairing_finish_delay_ms: u64,
    pub undo_capacity: usize,
    pub persist_timeout_ms: u64,
    pub persist_retries: u32,
    pub retry_backoff_ms: u64,
    pub command_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            know_quality: 5,
            dont_know_quality: 1,
            match_quality: 4,
            mismatch_cooldown_ms: 600,
            pairing_finish_delay_ms: 800,
            undo_capacity: 100,
            persist_timeout_ms: 5_000,
            persist_retries: 2,
            retry_backoff_ms: 200,
            command_buffer: 32,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by any `PRACTICE_*` variables that are set.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            batch_size: env_or("PRACTICE_BATCH_SIZE", defaults.batch_size)?,
            know_quality: env_or("PRACTICE_KNOW_QUALITY", defaults.know_quality)?,
            dont_know_quality: env_or("PRACTICE_DONT_KNOW_QUALITY", defaults.dont_know_quality)?,
            match_quality: env_or("PRACTICE_MATCH_QUALITY", defaults.match_quality)?,
            mismatch_cooldown_ms: env_or(
                "PRACTICE_MISMATCH_COOLDOWN_MS",
                defaults.mismatch_cooldown_ms,
            )?,
            pairing_finish_delay_ms: env_or(
                "PRACTICE_PAIRING_FINISH_DELAY_MS",
                defaults.pairing_finish_delay_ms,
            )?,
            undo_capacity: env_or("PRACTICE_UNDO_CAPACITY", defaults.undo_capacity)?,
            persist_timeout_ms: env_or("PRACTICE_PERSIST_TIMEOUT_MS", defaults.persist_timeout_ms)?,
            persist_retries: env_or("PRACTICE_PERSIST_RETRIES", defaults.persist_retries)?,
            retry_backoff_ms: env_or("PRACTICE_RETRY_BACKOFF_MS", defaults.retry_backoff_ms)?,
            command_buffer: env_or("PRACTICE_COMMAND_BUFFER", defaults.command_buffer)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(SessionError::Config("batch size must be positive".into()));
        }
        if self.command_buffer == 0 {
            return Err(SessionError::Config("command buffer must be positive".into()));
        }
        self.swipe_policy()?;
        if !self.match_quality()?.is_pass() {
            return Err(SessionError::Config(format!(
                "match quality {} must be a passing grade",
                self.match_quality
            )));
        }
        Ok(())
    }

    pub fn swipe_policy(&self) -> Result<SwipePolicy> {
        let know = quality(self.know_quality)?;
        let dont_know = quality(self.dont_know_quality)?;
        SwipePolicy::new(know, dont_know).map_err(|e| SessionError::Config(e.to_string()))
    }

    pub fn match_quality(&self) -> Result<Quality> {
        quality(self.match_quality)
    }

    pub fn mismatch_cooldown(&self) -> Duration {
        Duration::from_millis(self.mismatch_cooldown_ms)
    }

    pub fn pairing_finish_delay(&self) -> Duration {
        Duration::from_millis(self.pairing_finish_delay_ms)
    }

    pub fn persist_timeout(&self) -> Duration {
        Duration::from_millis(self.persist_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

fn quality(value: u8) -> Result<Quality> {
    Quality::new(i32::from(value)).map_err(|e| SessionError::Config(e.to_string()))
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| SessionError::Config(format!("{} has an invalid value: {}", key, raw))),
        Err(_) => Ok(default),
    }
}
