//! Interfaces of the services a session talks to.

use async_trait::async_trait;
use practice_core::Word;
use tokio::sync::watch;

use crate::error::PersistenceError;

/// Live list of due words.
///
/// The receiver holds `None` until the first snapshot has been loaded. Every later value is
/// the complete, current due list in source order.
pub trait DueWordSource: Send + Sync {
    fn subscribe(&self) -> watch::Receiver<Option<Vec<Word>>>;
}

/// Durable storage for words.
#[async_trait]
pub trait WordPersistence: Send + Sync {
    async fn save(&self, word: &Word) -> Result<(), PersistenceError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Word>, PersistenceError>;
}

/// Text-to-speech output. Calls return immediately; playback happens elsewhere.
pub trait SpeechCollaborator: Send + Sync {
    fn speak(&self, text: &str);

    fn stop(&self);
}

/// Speech collaborator that only logs what it would say.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSpeech;

impl SpeechCollaborator for TracingSpeech {
    fn speak(&self, text: &str) {
        tracing::info!(text, "speak");
    }

    fn stop(&self) {
        tracing::debug!("speech stopped");
    }
}
