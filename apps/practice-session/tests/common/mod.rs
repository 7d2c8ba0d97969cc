//! Common test utilities and fixtures for session integration tests.
//!
//! This module provides:
//! - TestSession wiring a session to an in-memory store and a recording speech collaborator
//! - Helpers that wait for published state and drive whole rounds
//!
//! Tests run on a paused tokio clock, so cool-downs and delays complete instantly once the
//! runtime is idle.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use practice_core::{CardSide, Word};
use practice_session::{
    Collaborators, MemoryWordStore, SessionConfig, SessionHandle, SessionPhase, SessionState,
    SpeechCollaborator,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Speech {
    Speak(String),
    Stop,
}

/// Speech collaborator that records every call.
#[derive(Default)]
pub struct RecordingSpeech {
    events: Mutex<Vec<Speech>>,
}

impl RecordingSpeech {
    pub fn events(&self) -> Vec<Speech> {
        self.events.lock().unwrap().clone()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Speech::Speak(text) => Some(text),
                Speech::Stop => None,
            })
            .collect()
    }
}

impl SpeechCollaborator for RecordingSpeech {
    fn speak(&self, text: &str) {
        self.events.lock().unwrap().push(Speech::Speak(text.to_string()));
    }

    fn stop(&self) {
        self.events.lock().unwrap().push(Speech::Stop);
    }
}

/// A running session plus direct access to its collaborators.
pub struct TestSession {
    pub handle: SessionHandle,
    pub store: Arc<MemoryWordStore>,
    pub speech: Arc<RecordingSpeech>,
}

impl TestSession {
    /// Session over a store that uses the real clock: answered words leave the due list.
    pub fn start(words: Vec<Word>) -> Self {
        Self::with_store(MemoryWordStore::new(words), SessionConfig::default())
    }

    /// Session over a store whose words stay due forever.
    pub fn start_always_due(words: Vec<Word>) -> Self {
        Self::with_store(
            MemoryWordStore::new(words).with_clock(|| i64::MAX),
            SessionConfig::default(),
        )
    }

    pub fn with_store(store: MemoryWordStore, config: SessionConfig) -> Self {
        let store = Arc::new(store);
        let speech = Arc::new(RecordingSpeech::default());
        let handle = SessionHandle::spawn(
            config,
            Collaborators {
                source: store.clone(),
                persistence: store.clone(),
                speech: speech.clone(),
            },
        )
        .expect("valid session config");

        Self {
            handle,
            store,
            speech,
        }
    }

    pub fn state(&self) -> SessionState {
        self.handle.state()
    }

    /// Wait until the published state satisfies `predicate`.
    pub async fn wait_for(&self, mut predicate: impl FnMut(&SessionState) -> bool) -> SessionState {
        let mut updates = self.handle.subscribe();
        let state = tokio::time::timeout(Duration::from_secs(60), updates.wait_for(|s| predicate(s)))
            .await
            .expect("timed out waiting for session state")
            .expect("session closed");
        state.clone()
    }

    pub async fn wait_for_pairing(&self) -> SessionState {
        self.wait_for(|s| matches!(s.phase, SessionPhase::BatchPairing { .. }))
            .await
    }

    pub async fn wait_for_drill(&self) -> SessionState {
        self.wait_for(|s| matches!(s.phase, SessionPhase::BatchRegular { .. }))
            .await
    }

    /// Ids of the current batch in order.
    pub fn batch_ids(&self) -> Vec<String> {
        self.state()
            .current_batch()
            .map(|batch| batch.slots.iter().map(|slot| slot.word.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Report every word of the current pairing batch as matched and wait for the drill.
    pub async fn complete_pairing(&self) -> SessionState {
        self.wait_for_pairing().await;
        for id in self.batch_ids() {
            self.handle.on_pair_matched(id).await.unwrap();
        }
        self.wait_for_drill().await
    }

    /// Flip and swipe right on the current drill card.
    pub async fn know(&self) {
        self.handle.flip_card().await.unwrap();
        self.handle.on_card_swiped_right().await.unwrap();
    }

    /// Flip and swipe left on the current drill card.
    pub async fn dont_know(&self) {
        self.handle.flip_card().await.unwrap();
        self.handle.on_card_swiped_left().await.unwrap();
    }

    /// Answer "know" on every remaining card of the current drill batch. Returns the ids in
    /// the order they were shown.
    pub async fn drill_batch(&self) -> Vec<String> {
        let state = self.wait_for_drill().await;
        let seq = state.current_batch().map(|batch| batch.seq);
        let mut shown = Vec::new();

        loop {
            let state = self.state();
            let same_batch = matches!(&state.phase, SessionPhase::BatchRegular { batch } if Some(batch.seq) == seq);
            if !same_batch {
                break;
            }
            if let Some(word) = state.current_word {
                shown.push(word.id);
            }
            self.know().await;
        }
        shown
    }

    /// Card id on the pairing board for a word side.
    pub fn card_id(&self, word_id: &str, side: CardSide) -> usize {
        self.state()
            .pairing
            .expect("pairing board")
            .cards
            .iter()
            .find(|card| card.word_id == word_id && card.side == side)
            .map(|card| card.id)
            .expect("card on board")
    }

    pub async fn shutdown(self) {
        self.handle.shutdown().await;
    }
}
