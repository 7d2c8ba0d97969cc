//! Session orchestrator.
//!
//! A session runs as a single tokio task that owns all mutable state. Callers talk to it
//! through a [`SessionHandle`]: commands are queued on a channel and handled strictly one at a
//! time, so a swipe that arrives while a save is outstanding waits for that save and then sees
//! the state it left behind. State is published on a watch channel after every command.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use practice_core::{
    remaining_pool, AnswerOrigin, Batch, CardDrill, ClickOutcome, EngineError, PairingRound,
    Quality, SwipeDirection, UndoEntry, UndoStack, Word,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::collaborators::{DueWordSource, SpeechCollaborator, WordPersistence};
use crate::config::SessionConfig;
use crate::error::{PersistenceError, Result, SessionError};
use crate::state::{PairingView, SessionPhase, SessionState};

/// External services used by a session.
#[derive(Clone)]
pub struct Collaborators {
    pub source: Arc<dyn DueWordSource>,
    pub persistence: Arc<dyn WordPersistence>,
    pub speech: Arc<dyn SpeechCollaborator>,
}

#[derive(Debug, Clone)]
enum Command {
    StartOrRefresh,
    Flip,
    Swipe(SwipeDirection),
    PairMatched(String),
    PairingFinished,
    SelectPairingCard(usize),
    Undo,
    SpeakTranslation(String),
    ClearError,
    ClearUndoHistory,
}

struct Envelope {
    command: Command,
    done: oneshot::Sender<()>,
}

/// Cloneable handle to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Envelope>,
    state: watch::Receiver<SessionState>,
    cancel: Arc<watch::Sender<bool>>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SessionHandle {
    /// Validate the config and start the session task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: SessionConfig, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;

        let (command_tx, command_rx) = mpsc::channel(config.command_buffer);
        let (state_tx, state_rx) = watch::channel(SessionState::default());
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let actor = SessionActor::new(config, collaborators, command_rx, state_tx, cancel_rx)?;
        let task = tokio::spawn(actor.run());

        Ok(Self {
            commands: command_tx,
            state: state_rx,
            cancel: Arc::new(cancel_tx),
            task: Arc::new(Mutex::new(Some(task))),
        })
    }

    /// Latest published state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// New receiver of state changes. Any number of readers may subscribe.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    pub async fn start_or_refresh_session(&self) -> Result<()> {
        self.send(Command::StartOrRefresh).await
    }

    pub async fn flip_card(&self) -> Result<()> {
        self.send(Command::Flip).await
    }

    pub async fn on_card_swiped_left(&self) -> Result<()> {
        self.send(Command::Swipe(SwipeDirection::Left)).await
    }

    pub async fn on_card_swiped_right(&self) -> Result<()> {
        self.send(Command::Swipe(SwipeDirection::Right)).await
    }

    /// Report a pairing match made by a UI that runs its own board.
    pub async fn on_pair_matched(&self, word_id: impl Into<String>) -> Result<()> {
        self.send(Command::PairMatched(word_id.into())).await
    }

    pub async fn on_pairing_finished(&self) -> Result<()> {
        self.send(Command::PairingFinished).await
    }

    /// Click a card on the session's own pairing board.
    pub async fn select_pairing_card(&self, card_id: usize) -> Result<()> {
        self.send(Command::SelectPairingCard(card_id)).await
    }

    pub async fn undo_last_action(&self) -> Result<()> {
        self.send(Command::Undo).await
    }

    pub async fn speak_translation_text(&self, text: impl Into<String>) -> Result<()> {
        self.send(Command::SpeakTranslation(text.into())).await
    }

    pub async fn clear_error_message(&self) -> Result<()> {
        self.send(Command::ClearError).await
    }

    pub async fn clear_undo_history(&self) -> Result<()> {
        self.send(Command::ClearUndoHistory).await
    }

    /// Cancel timers and any in-flight save, then wait for the session task to exit.
    pub async fn shutdown(&self) {
        self.cancel.send_replace(true);
        if let Some(task) = self.task.lock().await.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "session task ended abnormally");
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Queue a command and wait until the session has handled it.
    async fn send(&self, command: Command) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.commands
            .send(Envelope {
                command,
                done: done_tx,
            })
            .await
            .map_err(|_| SessionError::Closed)?;
        done_rx.await.map_err(|_| SessionError::Closed)
    }
}

/// Timeout, retry and cancellation policy for collaborator calls.
struct CallPolicy {
    timeout: std::time::Duration,
    retries: u32,
    backoff: std::time::Duration,
}

impl CallPolicy {
    async fn call<T, F, Fut>(
        &self,
        cancel: &mut watch::Receiver<bool>,
        what: &'static str,
        mut make: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, PersistenceError>>,
    {
        let mut attempt = 0;
        loop {
            if *cancel.borrow() {
                return Err(SessionError::Cancelled);
            }

            let outcome = tokio::select! {
                result = tokio::time::timeout(self.timeout, make()) => match result {
                    Ok(result) => result,
                    Err(_) => Err(PersistenceError::Timeout(self.timeout.as_millis() as u64)),
                },
                _ = cancel.changed() => return Err(SessionError::Cancelled),
            };

            let error = match outcome {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !error.is_transient() || attempt >= self.retries {
                return Err(error.into());
            }
            attempt += 1;
            warn!(what, attempt, error = %error, "retrying persistence call");

            tokio::select! {
                _ = tokio::time::sleep(self.backoff) => {}
                _ = cancel.changed() => return Err(SessionError::Cancelled),
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

struct SessionActor {
    config: SessionConfig,
    match_quality: Quality,
    persistence: Arc<dyn WordPersistence>,
    speech: Arc<dyn SpeechCollaborator>,
    policy: CallPolicy,

    due: watch::Receiver<Option<Vec<Word>>>,
    source_open: bool,
    commands: mpsc::Receiver<Envelope>,
    cancel: watch::Receiver<bool>,
    state_tx: watch::Sender<SessionState>,

    phase: SessionPhase,
    card: CardDrill,
    index: usize,
    pairing: Option<PairingRound>,
    /// Drill batch left by the last answer, kept so that answer can still be undone.
    previous: Option<Batch>,
    undo: UndoStack,
    processed: HashSet<String>,
    batch_seq: u64,
    error_message: Option<String>,
    mismatch_deadline: Option<Instant>,
    finish_deadline: Option<Instant>,
    rng: StdRng,
}

impl SessionActor {
    fn new(
        config: SessionConfig,
        collaborators: Collaborators,
        commands: mpsc::Receiver<Envelope>,
        state_tx: watch::Sender<SessionState>,
        cancel: watch::Receiver<bool>,
    ) -> Result<Self> {
        let swipe_policy = config.swipe_policy()?;
        let match_quality = config.match_quality()?;
        let policy = CallPolicy {
            timeout: config.persist_timeout(),
            retries: config.persist_retries,
            backoff: config.retry_backoff(),
        };

        Ok(Self {
            match_quality,
            persistence: collaborators.persistence,
            speech: collaborators.speech,
            policy,
            due: collaborators.source.subscribe(),
            source_open: true,
            commands,
            cancel,
            state_tx,
            phase: SessionPhase::Loading,
            card: CardDrill::new(swipe_policy),
            index: 0,
            pairing: None,
            previous: None,
            undo: UndoStack::new(config.undo_capacity),
            processed: HashSet::new(),
            batch_seq: 0,
            error_message: None,
            mismatch_deadline: None,
            finish_deadline: None,
            rng: StdRng::from_os_rng(),
            config,
        })
    }

    async fn run(mut self) {
        info!(batch_size = self.config.batch_size, "practice session started");
        self.start();
        self.publish();

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.changed() => break,

                envelope = self.commands.recv() => {
                    let Some(envelope) = envelope else { break };
                    self.handle(envelope.command).await;
                    self.publish();
                    let _ = envelope.done.send(());
                    if self.is_cancelled() {
                        break;
                    }
                }

                changed = self.due.changed(), if self.source_open => {
                    match changed {
                        Ok(()) => self.on_due_update(),
                        Err(_) => self.on_source_closed(),
                    }
                    self.publish();
                }

                _ = wait_until(self.mismatch_deadline), if self.mismatch_deadline.is_some() => {
                    self.mismatch_deadline = None;
                    if let Some(round) = self.pairing.as_mut() {
                        round.clear_mismatch();
                    }
                    self.publish();
                }

                _ = wait_until(self.finish_deadline), if self.finish_deadline.is_some() => {
                    self.finish_deadline = None;
                    self.finish_pairing();
                    self.publish();
                }
            }
        }

        self.cancel_timers();
        self.pairing = None;
        info!(
            processed = self.processed.len(),
            undo_depth = self.undo.len(),
            "practice session stopped"
        );
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    async fn handle(&mut self, command: Command) {
        debug!(?command, phase = self.phase.name(), "handling command");
        match command {
            Command::StartOrRefresh => self.start_or_refresh(),
            Command::Flip => self.flip(),
            Command::Swipe(direction) => self.swipe(direction).await,
            Command::PairMatched(word_id) => self.pair_matched(&word_id).await,
            Command::PairingFinished => self.finish_pairing(),
            Command::SelectPairingCard(card_id) => self.select_pairing_card(card_id).await,
            Command::Undo => self.undo_last_action().await,
            Command::SpeakTranslation(text) => self.speech.speak(&text),
            Command::ClearError => self.error_message = None,
            Command::ClearUndoHistory => {
                self.undo.clear();
                info!("undo history cleared");
            }
        }
    }

    // === Phase transitions ===

    /// Fresh session from the latest due snapshot.
    fn start(&mut self) {
        self.cancel_timers();
        self.pairing = None;
        self.previous = None;
        self.index = 0;
        self.card.reset();
        self.undo.clear();
        self.processed.clear();

        let snapshot = self.due.borrow_and_update().clone();
        match snapshot {
            None => self.set_phase(SessionPhase::Loading),
            Some(words) => match self.draw_batch(&words) {
                Some(batch) => self.enter_pairing(batch),
                None => self.set_phase(SessionPhase::Empty),
            },
        }
    }

    fn start_or_refresh(&mut self) {
        match self.phase {
            SessionPhase::Loading
            | SessionPhase::Empty
            | SessionPhase::Finished { .. }
            | SessionPhase::Error { .. } => self.start(),
            SessionPhase::BatchPairing { .. } | SessionPhase::BatchRegular { .. } => {
                debug!("session already running, refresh ignored");
            }
        }
    }

    fn on_due_update(&mut self) {
        let count = self.due.borrow_and_update().as_ref().map(Vec::len);
        debug!(?count, "due words updated");
        // A running round keeps its batch; only idle phases react.
        if matches!(self.phase, SessionPhase::Loading | SessionPhase::Empty) {
            self.start();
        }
    }

    fn on_source_closed(&mut self) {
        self.source_open = false;
        warn!("due word source closed");
        if matches!(self.phase, SessionPhase::Loading) {
            self.set_phase(SessionPhase::Error {
                message: "due word source closed before loading".into(),
            });
        }
    }

    fn draw_batch(&mut self, snapshot: &[Word]) -> Option<Batch> {
        let pool = remaining_pool(snapshot, &self.processed);
        let batch = Batch::draw(self.batch_seq + 1, &pool, self.config.batch_size)?;
        self.batch_seq = batch.seq;
        Some(batch)
    }

    fn enter_pairing(&mut self, batch: Batch) {
        self.cancel_timers();
        let round = PairingRound::new(&batch.words(), &mut self.rng);
        info!(seq = batch.seq, size = batch.len(), "pairing round started");
        self.index = 0;
        self.card.reset();
        self.pairing = Some(round);
        self.set_phase(SessionPhase::BatchPairing { batch });
        self.check_round_complete();
    }

    fn finish_pairing(&mut self) {
        let phase = std::mem::replace(&mut self.phase, SessionPhase::Loading);
        match phase {
            SessionPhase::BatchPairing { batch } => {
                if self.pairing.as_ref().is_some_and(|round| !round.is_complete()) {
                    warn!(seq = batch.seq, "pairing finished before every pair was matched");
                }
                self.cancel_timers();
                self.pairing = None;
                self.index = 0;
                self.card.reset();
                self.set_phase(SessionPhase::BatchRegular { batch });
            }
            other => {
                self.phase = other;
                self.reject("pairing is not in progress");
            }
        }
    }

    /// Next word in the batch, or the next batch, or the end of the session.
    fn advance(&mut self) {
        let len = match self.phase.batch() {
            Some(batch) => batch.len(),
            None => return self.fail("advance outside of a batch"),
        };

        if self.index + 1 < len {
            self.index += 1;
            self.card.reset();
            return;
        }

        let left = self.phase.batch().cloned();
        let snapshot = self.due.borrow_and_update().clone().unwrap_or_default();
        let next = self.draw_batch(&snapshot);
        self.previous = left;
        match next {
            Some(batch) => self.enter_pairing(batch),
            None => {
                self.cancel_timers();
                self.pairing = None;
                self.card.reset();
                self.set_phase(SessionPhase::Finished {
                    total_processed: self.processed.len(),
                });
            }
        }
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        if self.phase.name() != phase.name() {
            info!(from = self.phase.name(), to = phase.name(), "phase changed");
        }
        self.phase = phase;
    }

    fn fail(&mut self, message: &str) {
        warn!(message, "session entered error phase");
        self.cancel_timers();
        self.pairing = None;
        self.set_phase(SessionPhase::Error {
            message: message.to_string(),
        });
    }

    fn reject(&self, reason: &str) {
        let error = EngineError::InvalidTransition(reason.to_string());
        warn!(phase = self.phase.name(), error = %error, "command ignored");
    }

    fn cancel_timers(&mut self) {
        self.mismatch_deadline = None;
        self.finish_deadline = None;
    }

    // === Drill ===

    fn flip(&mut self) {
        if !matches!(self.phase, SessionPhase::BatchRegular { .. }) {
            return self.reject("no card to flip");
        }
        self.speech.stop();
        let face = self.card.flip();
        debug!(?face, index = self.index, "card flipped");
    }

    async fn swipe(&mut self, direction: SwipeDirection) {
        if !matches!(self.phase, SessionPhase::BatchRegular { .. }) {
            return self.reject("no card to swipe");
        }
        let quality = match self.card.swipe(direction) {
            Ok(quality) => quality,
            Err(e) => return self.reject(&e.to_string()),
        };

        let position = self.index;
        let (seq, word) = match self.phase.batch().map(|b| (b.seq, b.word(position).cloned())) {
            Some((seq, Some(word))) => (seq, word),
            _ => return self.fail("drill index points outside the batch"),
        };

        match self
            .record_answer(word, position, seq, AnswerOrigin::Drill, quality)
            .await
        {
            Ok(updated) => {
                if let Some(batch) = self.phase.batch_mut() {
                    let slot = &mut batch.slots[position];
                    if let Some(updated) = updated {
                        slot.word = updated;
                    }
                    slot.completed = true;
                    self.processed.insert(slot.word.id.clone());
                }
                self.advance();
            }
            Err(SessionError::Cancelled) => {}
            Err(e) => {
                warn!(error = %e, index = position, "answer not stored");
                self.error_message = Some(e.user_message());
                self.card.reset();
            }
        }
    }

    /// Schedule and store one answer. Returns the stored word, or None when the word no longer
    /// exists in the store.
    async fn record_answer(
        &mut self,
        word: Word,
        position: usize,
        batch_seq: u64,
        origin: AnswerOrigin,
        quality: Quality,
    ) -> Result<Option<Word>> {
        let persistence = self.persistence.clone();
        let id = word.id.clone();
        let stored = match self
            .policy
            .call(&mut self.cancel, "get_by_id", || persistence.get_by_id(&id))
            .await
        {
            Ok(stored) => stored,
            Err(SessionError::Cancelled) => return Err(SessionError::Cancelled),
            Err(e) => {
                warn!(error = %e, word_id = %id, "lookup failed, using batch copy");
                Some(word)
            }
        };
        let Some(before) = stored else {
            info!(word_id = %id, "word left the store, answer not saved");
            return Ok(None);
        };

        let updated = before.reviewed(quality, now_ms())?;
        self.undo.push(UndoEntry {
            word: before,
            position,
            batch_seq,
            origin,
        });

        let result = self
            .policy
            .call(&mut self.cancel, "save", || persistence.save(&updated))
            .await;
        if let Err(e) = result {
            self.undo.pop().ok();
            return Err(e);
        }

        info!(
            word_id = %updated.id,
            quality = quality.value(),
            ?origin,
            repetition = updated.repetition,
            interval_ms = updated.interval,
            "answer stored"
        );
        Ok(Some(updated))
    }

    // === Pairing ===

    async fn select_pairing_card(&mut self, card_id: usize) {
        if !matches!(self.phase, SessionPhase::BatchPairing { .. }) {
            return self.reject("pairing is not in progress");
        }
        let Some(round) = self.pairing.as_mut() else {
            return self.fail("pairing phase without a pairing board");
        };

        match round.click(card_id) {
            Ok(ClickOutcome::Selected { card, speak }) => {
                debug!(card, "pairing card selected");
                if let Some(text) = speak {
                    self.speech.speak(&text);
                }
            }
            Ok(ClickOutcome::Matched { word_id, .. }) => self.record_match(&word_id).await,
            Ok(ClickOutcome::Mismatched { first, second }) => {
                debug!(first, second, "pairing mismatch");
                self.mismatch_deadline = Some(Instant::now() + self.config.mismatch_cooldown());
            }
            Ok(ClickOutcome::Ignored) => debug!(card_id, "pairing click ignored"),
            Err(e) => self.reject(&e.to_string()),
        }
    }

    async fn pair_matched(&mut self, word_id: &str) {
        if !matches!(self.phase, SessionPhase::BatchPairing { .. }) {
            return self.reject("pairing is not in progress");
        }
        if let Some(round) = self.pairing.as_mut() {
            round.mark_matched(word_id);
        }
        self.record_match(word_id).await;
    }

    /// Score a pairing match and mark the batch slot.
    async fn record_match(&mut self, word_id: &str) {
        let found = self.phase.batch().and_then(|batch| {
            let position = batch.position_of(word_id)?;
            let slot = &batch.slots[position];
            Some((batch.seq, position, slot.word.clone(), slot.matched))
        });
        let (seq, position, word) = match found {
            Some((_, _, _, true)) => return self.reject("word is already matched"),
            Some((seq, position, word, false)) => (seq, position, word),
            None => return self.reject("word is not part of this batch"),
        };

        if let Some(batch) = self.phase.batch_mut() {
            batch.slots[position].matched = true;
        }
        self.speech.speak(&word.translation);

        match self
            .record_answer(word, position, seq, AnswerOrigin::Pairing, self.match_quality)
            .await
        {
            Ok(Some(updated)) => {
                if let Some(batch) = self.phase.batch_mut() {
                    batch.replace_word(updated);
                }
            }
            Ok(None) => {}
            Err(SessionError::Cancelled) => return,
            Err(e) => {
                warn!(error = %e, word_id, "pairing match not stored");
                self.error_message = Some(e.user_message());
                if let Some(batch) = self.phase.batch_mut() {
                    batch.slots[position].matched = false;
                }
                if let Some(round) = self.pairing.as_mut() {
                    round.unmatch(word_id);
                }
                self.finish_deadline = None;
            }
        }

        self.check_round_complete();
    }

    fn check_round_complete(&mut self) {
        let complete = self
            .pairing
            .as_mut()
            .is_some_and(|round| round.take_finish_signal());
        if complete {
            debug!("pairing board complete");
            self.finish_deadline = Some(Instant::now() + self.config.pairing_finish_delay());
        }
    }

    // === Undo ===

    async fn undo_last_action(&mut self) {
        if self.undo.is_empty() {
            self.error_message = Some(SessionError::from(EngineError::EmptyUndo).user_message());
            return;
        }
        let reopen = self.undo_reopens_previous();
        if !reopen && !matches!(self.phase, SessionPhase::BatchRegular { .. }) {
            let error = EngineError::InvalidTransition("undo is only available in the drill".into());
            self.error_message = Some(SessionError::from(error).user_message());
            return;
        }

        let entry = match self.undo.pop() {
            Ok(entry) => entry,
            Err(e) => {
                self.error_message = Some(SessionError::from(e).user_message());
                return;
            }
        };

        let persistence = self.persistence.clone();
        let snapshot = entry.word.clone();
        let result = self
            .policy
            .call(&mut self.cancel, "restore", || persistence.save(&snapshot))
            .await;

        match result {
            Ok(()) if reopen => self.reopen_previous(entry),
            Ok(()) => self.apply_undo(entry),
            Err(SessionError::Cancelled) => self.undo.push(entry),
            Err(e) => {
                warn!(error = %e, word_id = %entry.word.id, "undo not stored");
                self.error_message = Some(e.user_message());
                self.undo.push(entry);
            }
        }
    }

    /// True when the top entry is the answer that ended the previous batch and nothing has
    /// been recorded since.
    fn undo_reopens_previous(&self) -> bool {
        let (Some(entry), Some(previous)) = (self.undo.peek(), self.previous.as_ref()) else {
            return false;
        };
        entry.origin == AnswerOrigin::Drill
            && entry.batch_seq == previous.seq
            && matches!(
                self.phase,
                SessionPhase::BatchPairing { .. } | SessionPhase::Finished { .. }
            )
    }

    /// Go back into the previous batch's drill on the undone word. A pairing round that was
    /// started in the meantime is dropped and its sequence number is reused.
    fn reopen_previous(&mut self, entry: UndoEntry) {
        let Some(mut batch) = self.previous.take() else {
            return self.apply_undo(entry);
        };
        if let Some(abandoned) = self.phase.batch() {
            info!(seq = abandoned.seq, "pairing round abandoned");
        }

        batch.replace_word(entry.word.clone());
        if let Some(slot) = batch.slots.get_mut(entry.position) {
            slot.completed = false;
        }
        self.processed.remove(&entry.word.id);

        self.cancel_timers();
        self.pairing = None;
        self.batch_seq = batch.seq;
        self.index = entry.position;
        self.card.reset();
        info!(
            word_id = %entry.word.id,
            seq = batch.seq,
            index = self.index,
            remaining = self.undo.len(),
            "answer undone, batch reopened"
        );
        self.set_phase(SessionPhase::BatchRegular { batch });
    }

    fn apply_undo(&mut self, entry: UndoEntry) {
        let word_id = entry.word.id.clone();
        self.processed.remove(&word_id);

        let in_current_batch = match self.phase.batch_mut() {
            Some(batch) if batch.seq == entry.batch_seq => {
                batch.replace_word(entry.word.clone());
                if entry.origin == AnswerOrigin::Drill {
                    if let Some(slot) = batch.slots.get_mut(entry.position) {
                        slot.completed = false;
                    }
                }
                true
            }
            _ => false,
        };

        if in_current_batch && entry.origin == AnswerOrigin::Drill {
            self.index = entry.position;
            self.card.reset();
        }

        info!(
            word_id = %word_id,
            origin = ?entry.origin,
            index = self.index,
            remaining = self.undo.len(),
            "answer undone"
        );
    }

    // === State publication ===

    fn publish(&self) {
        let current_word = match &self.phase {
            SessionPhase::BatchRegular { batch } => batch.word(self.index).cloned(),
            _ => None,
        };
        let can_undo = (matches!(self.phase, SessionPhase::BatchRegular { .. })
            && !self.undo.is_empty())
            || self.undo_reopens_previous();

        self.state_tx.send_replace(SessionState {
            phase: self.phase.clone(),
            current_word,
            current_index: self.index,
            card_face: self.card.face(),
            pairing: self.pairing.as_ref().map(PairingView::from),
            can_undo,
            error_message: self.error_message.clone(),
            processed_count: self.processed.len(),
        });
    }
}
