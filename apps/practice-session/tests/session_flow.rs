//! Session flow tests: loading, batching, drilling and finishing.

mod common;

use std::collections::HashSet;
use std::time::Duration;

use practice_core::scheduler::MINUTE_MS;
use practice_core::CardFace;
use practice_session::{DueWordSource, MemoryWordStore, SessionConfig, SessionPhase};
use pretty_assertions::assert_eq;

use common::fixtures;
use common::{Speech, TestSession};

/// An empty due list on the first snapshot ends in Empty.
#[tokio::test(start_paused = true)]
async fn test_empty_pool_is_empty_phase() {
    let session = TestSession::start(Vec::new());
    let state = session.wait_for(|s| s.phase != SessionPhase::Loading).await;

    assert_eq!(state.phase, SessionPhase::Empty);
    assert!(!state.can_undo);
    session.shutdown().await;
}

/// The session stays in Loading until the source delivers its first snapshot.
#[tokio::test(start_paused = true)]
async fn test_loading_until_first_snapshot() {
    let store = MemoryWordStore::unloaded(fixtures::words(2));
    let session = TestSession::with_store(store, SessionConfig::default());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(session.state().phase, SessionPhase::Loading);

    session.store.publish();
    session.wait_for_pairing().await;
    assert_eq!(session.batch_ids(), vec!["w0", "w1"]);
    session.shutdown().await;
}

/// An empty session picks up words that become due later.
#[tokio::test(start_paused = true)]
async fn test_empty_session_starts_when_words_arrive() {
    let session = TestSession::start(Vec::new());
    session.wait_for(|s| s.phase == SessionPhase::Empty).await;

    session.store.insert(fixtures::words(1).remove(0));
    session.wait_for_pairing().await;
    assert_eq!(session.batch_ids(), vec!["w0"]);
    session.shutdown().await;
}

/// Six words with batch size five: five first, then the sixth alone.
#[tokio::test(start_paused = true)]
async fn test_six_words_make_two_batches() {
    let session = TestSession::start(fixtures::words(6));
    session.wait_for_pairing().await;
    assert_eq!(session.batch_ids(), vec!["w0", "w1", "w2", "w3", "w4"]);

    session.complete_pairing().await;
    let shown = session.drill_batch().await;
    assert_eq!(shown, vec!["w0", "w1", "w2", "w3", "w4"]);

    let state = session.wait_for_pairing().await;
    assert_eq!(session.batch_ids(), vec!["w5"]);
    assert_eq!(state.current_batch().unwrap().seq, 2);
    session.shutdown().await;
}

/// The last word of the last batch, with the due list emptying, finishes with a count of one.
#[tokio::test(start_paused = true)]
async fn test_last_word_finishes_session() {
    let session = TestSession::start(fixtures::words(1));
    session.complete_pairing().await;
    session.know().await;

    let state = session
        .wait_for(|s| matches!(s.phase, SessionPhase::Finished { .. }))
        .await;
    assert_eq!(state.phase, SessionPhase::Finished { total_processed: 1 });
    assert!(session
        .store
        .subscribe()
        .borrow()
        .as_ref()
        .is_some_and(|due| due.is_empty()));
    session.shutdown().await;
}

/// Words that stay due are still processed exactly once per session.
#[tokio::test(start_paused = true)]
async fn test_each_word_processed_exactly_once() {
    let session = TestSession::start_always_due(fixtures::words(12));
    let mut shown = Vec::new();

    for expected_size in [5, 5, 2] {
        session.wait_for_pairing().await;
        assert_eq!(session.batch_ids().len(), expected_size);
        session.complete_pairing().await;
        shown.extend(session.drill_batch().await);
    }

    let state = session
        .wait_for(|s| matches!(s.phase, SessionPhase::Finished { .. }))
        .await;
    assert_eq!(state.phase, SessionPhase::Finished { total_processed: 12 });

    let unique: HashSet<&String> = shown.iter().collect();
    assert_eq!(shown.len(), 12);
    assert_eq!(unique.len(), 12);
    session.shutdown().await;
}

/// Pairing and drill answers both go through the scheduler and the store.
#[tokio::test(start_paused = true)]
async fn test_answers_are_scheduled_and_saved() {
    let session = TestSession::start(fixtures::words(2));
    session.complete_pairing().await;

    let after_pairing = session.store.get("w0").unwrap();
    assert_eq!(after_pairing.repetition, 1);
    assert_eq!(after_pairing.interval, MINUTE_MS);

    session.know().await;
    let after_know = session.store.get("w0").unwrap();
    assert_eq!(after_know.repetition, 2);
    assert_eq!(after_know.interval, 6 * MINUTE_MS);

    session.dont_know().await;
    let after_miss = session.store.get("w1").unwrap();
    assert_eq!(after_miss.repetition, 0);
    assert_eq!(after_miss.interval, MINUTE_MS);
    assert!(after_miss.easiness >= 1.3);
    session.shutdown().await;
}

/// A mature word that is failed drops back to a one-minute interval.
#[tokio::test(start_paused = true)]
async fn test_failing_mature_word_resets_it() {
    let session = TestSession::start(vec![fixtures::mature_word("m")]);
    session.complete_pairing().await;
    let before = session.store.get("m").unwrap();
    assert_eq!(before.repetition, 5);

    session.dont_know().await;
    let after = session.store.get("m").unwrap();
    assert_eq!(after.repetition, 0);
    assert_eq!(after.interval, MINUTE_MS);
    session.shutdown().await;
}

/// Swiping before flipping is ignored.
#[tokio::test(start_paused = true)]
async fn test_swipe_from_prompt_is_ignored() {
    let session = TestSession::start(fixtures::words(2));
    session.complete_pairing().await;
    let saves = session.store.saved().len();

    session.handle.on_card_swiped_right().await.unwrap();

    let state = session.state();
    assert_eq!(state.current_index, 0);
    assert_eq!(state.card_face, CardFace::Prompt);
    assert_eq!(state.error_message, None);
    assert_eq!(session.store.saved().len(), saves);
    session.shutdown().await;
}

/// Flipping toggles the face and stops any playing audio.
#[tokio::test(start_paused = true)]
async fn test_flip_stops_speech() {
    let session = TestSession::start(fixtures::words(1));
    session.complete_pairing().await;

    session.handle.flip_card().await.unwrap();
    assert_eq!(session.state().card_face, CardFace::Answer);
    assert_eq!(session.speech.events().last(), Some(&Speech::Stop));

    session.handle.flip_card().await.unwrap();
    assert_eq!(session.state().card_face, CardFace::Prompt);
    session.shutdown().await;
}

/// Words removed from the source mid-round stay in the current batch but are not redrawn.
#[tokio::test(start_paused = true)]
async fn test_external_removal_only_affects_next_batch() {
    let session = TestSession::start_always_due(fixtures::words(7));
    session.complete_pairing().await;

    session.store.remove("w2");
    session.store.remove("w6");
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(session.batch_ids(), vec!["w0", "w1", "w2", "w3", "w4"]);

    let shown = session.drill_batch().await;
    assert_eq!(shown, vec!["w0", "w1", "w2", "w3", "w4"]);

    session.wait_for_pairing().await;
    assert_eq!(session.batch_ids(), vec!["w5"]);
    session.shutdown().await;
}

/// A swipe queued behind an outstanding save does not double-advance.
#[tokio::test(start_paused = true)]
async fn test_commands_are_not_interleaved() {
    let session = TestSession::start(fixtures::words(3));
    session.complete_pairing().await;
    session.store.set_save_delay(Some(Duration::from_millis(300)));

    session.handle.flip_card().await.unwrap();
    let (first, second) = tokio::join!(
        session.handle.on_card_swiped_right(),
        session.handle.on_card_swiped_right()
    );
    first.unwrap();
    second.unwrap();

    let state = session.state();
    assert_eq!(state.current_index, 1);
    assert_eq!(state.card_face, CardFace::Prompt);
    assert_eq!(session.store.get("w0").unwrap().repetition, 2);
    assert_eq!(session.store.get("w1").unwrap().repetition, 1);
    session.shutdown().await;
}

/// Several readers observe the same published state.
#[tokio::test(start_paused = true)]
async fn test_state_fan_out() {
    let session = TestSession::start(fixtures::words(1));
    let mut first = session.handle.subscribe();
    let mut second = session.handle.subscribe();

    session.complete_pairing().await;

    let a = first
        .wait_for(|s| matches!(s.phase, SessionPhase::BatchRegular { .. }))
        .await
        .unwrap()
        .clone();
    let b = second
        .wait_for(|s| matches!(s.phase, SessionPhase::BatchRegular { .. }))
        .await
        .unwrap()
        .clone();
    assert_eq!(a, b);
    session.shutdown().await;
}

/// Restarting a finished session begins a fresh pass over the due list.
#[tokio::test(start_paused = true)]
async fn test_restart_after_finish() {
    let session = TestSession::start_always_due(fixtures::words(1));
    session.complete_pairing().await;
    session.know().await;
    session
        .wait_for(|s| matches!(s.phase, SessionPhase::Finished { .. }))
        .await;

    session.handle.start_or_refresh_session().await.unwrap();
    let state = session.wait_for_pairing().await;
    assert_eq!(session.batch_ids(), vec!["w0"]);
    assert_eq!(state.processed_count, 0);
    assert!(!state.can_undo);
    session.shutdown().await;
}

/// Refreshing a running session keeps the current batch.
#[tokio::test(start_paused = true)]
async fn test_refresh_keeps_running_batch() {
    let session = TestSession::start(fixtures::words(3));
    session.complete_pairing().await;
    session.know().await;

    session.handle.start_or_refresh_session().await.unwrap();
    let state = session.state();
    assert!(matches!(state.phase, SessionPhase::BatchRegular { .. }));
    assert_eq!(state.current_index, 1);
    session.shutdown().await;
}

/// Commands after shutdown report a closed session.
#[tokio::test(start_paused = true)]
async fn test_commands_after_shutdown_fail() {
    let session = TestSession::start(fixtures::words(1));
    session.wait_for_pairing().await;
    session.handle.shutdown().await;

    assert!(session.handle.is_closed());
    assert!(session.handle.flip_card().await.is_err());
}
