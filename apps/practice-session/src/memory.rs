//! In-memory word store implementing both the due-word source and persistence.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use practice_core::Word;
use tokio::sync::watch;

use crate::collaborators::{DueWordSource, WordPersistence};
use crate::error::PersistenceError;

type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Word list kept in insertion order. The due snapshot is republished on every change.
pub struct MemoryWordStore {
    words: Mutex<Vec<Word>>,
    saved: Mutex<Vec<Word>>,
    due_tx: watch::Sender<Option<Vec<Word>>>,
    clock: Clock,
    failing_saves: AtomicU32,
    save_delay: Mutex<Option<Duration>>,
}

impl MemoryWordStore {
    /// Store with its first due snapshot already published.
    pub fn new(words: Vec<Word>) -> Self {
        let store = Self::unloaded(words);
        store.publish();
        store
    }

    /// Store whose due snapshot stays unloaded until [`MemoryWordStore::publish`].
    pub fn unloaded(words: Vec<Word>) -> Self {
        let (due_tx, _rx) = watch::channel(None);
        Self {
            words: Mutex::new(words),
            saved: Mutex::new(Vec::new()),
            due_tx,
            clock: Arc::new(|| Utc::now().timestamp_millis()),
            failing_saves: AtomicU32::new(0),
            save_delay: Mutex::new(None),
        }
    }

    /// Replace the clock used to decide which words are due.
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self.publish();
        self
    }

    /// Recompute and broadcast the due list.
    pub fn publish(&self) {
        let now = (self.clock)();
        let due: Vec<Word> = self
            .lock_words()
            .iter()
            .filter(|word| word.is_due(now))
            .cloned()
            .collect();
        self.due_tx.send_replace(Some(due));
    }

    /// Make the next `count` saves fail with `Unavailable`.
    pub fn fail_next_saves(&self, count: u32) {
        self.failing_saves.store(count, Ordering::SeqCst);
    }

    pub fn set_save_delay(&self, delay: Option<Duration>) {
        *lock(&self.save_delay) = delay;
    }

    pub fn insert(&self, word: Word) {
        self.lock_words().push(word);
        self.publish();
    }

    pub fn remove(&self, id: &str) -> Option<Word> {
        let removed = {
            let mut words = self.lock_words();
            let position = words.iter().position(|word| word.id == id)?;
            words.remove(position)
        };
        self.publish();
        Some(removed)
    }

    pub fn get(&self, id: &str) -> Option<Word> {
        self.lock_words().iter().find(|word| word.id == id).cloned()
    }

    pub fn words(&self) -> Vec<Word> {
        self.lock_words().clone()
    }

    /// Every successfully saved word, in save order.
    pub fn saved(&self) -> Vec<Word> {
        lock(&self.saved).clone()
    }

    fn lock_words(&self) -> MutexGuard<'_, Vec<Word>> {
        lock(&self.words)
    }

    fn take_failure(&self) -> bool {
        self.failing_saves
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

// Poisoned locks are recovered rather than propagated.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl DueWordSource for MemoryWordStore {
    fn subscribe(&self) -> watch::Receiver<Option<Vec<Word>>> {
        self.due_tx.subscribe()
    }
}

#[async_trait]
impl WordPersistence for MemoryWordStore {
    async fn save(&self, word: &Word) -> Result<(), PersistenceError> {
        let delay = *lock(&self.save_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.take_failure() {
            return Err(PersistenceError::Unavailable("injected failure".into()));
        }

        {
            let mut words = self.lock_words();
            let slot = words
                .iter_mut()
                .find(|stored| stored.id == word.id)
                .ok_or_else(|| PersistenceError::NotFound(word.id.clone()))?;
            *slot = word.clone();
        }
        lock(&self.saved).push(word.clone());
        self.publish();
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Word>, PersistenceError> {
        Ok(self.get(id))
    }
}
