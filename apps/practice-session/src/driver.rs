//! Line-oriented terminal driver for a session.

use practice_core::{scheduler, CardFace, CardSide, Word};

use crate::error::Result;
use crate::orchestrator::SessionHandle;
use crate::state::{SessionPhase, SessionState};

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Flip,
    Know,
    DontKnow,
    Pick(usize),
    Matched(String),
    Done,
    Undo,
    Say(String),
    Dismiss,
    Restart,
    Help,
    Quit,
}

/// Parse a line of user input. Returns None for blank or unknown lines.
pub fn parse_line(line: &str) -> Option<Input> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    let input = match head.to_lowercase().as_str() {
        "f" | "flip" => Input::Flip,
        "r" | "right" | "know" => Input::Know,
        "l" | "left" | "again" => Input::DontKnow,
        "p" | "pick" => Input::Pick(rest.parse().ok()?),
        "m" | "match" if !rest.is_empty() => Input::Matched(rest.to_string()),
        "d" | "done" => Input::Done,
        "u" | "undo" => Input::Undo,
        "s" | "say" if !rest.is_empty() => Input::Say(rest.to_string()),
        "x" | "dismiss" => Input::Dismiss,
        "restart" => Input::Restart,
        "h" | "help" | "?" => Input::Help,
        "q" | "quit" | "exit" => Input::Quit,
        _ => return None,
    };
    Some(input)
}

/// Forward an input to the session.
pub async fn dispatch(handle: &SessionHandle, input: Input) -> Result<()> {
    match input {
        Input::Flip => handle.flip_card().await,
        Input::Know => handle.on_card_swiped_right().await,
        Input::DontKnow => handle.on_card_swiped_left().await,
        Input::Pick(card) => handle.select_pairing_card(card).await,
        Input::Matched(word_id) => handle.on_pair_matched(word_id).await,
        Input::Done => handle.on_pairing_finished().await,
        Input::Undo => handle.undo_last_action().await,
        Input::Say(text) => handle.speak_translation_text(text).await,
        Input::Dismiss => handle.clear_error_message().await,
        Input::Restart => handle.start_or_refresh_session().await,
        Input::Help | Input::Quit => Ok(()),
    }
}

pub const HELP: &str = "\
pairing: pick <n> | match <word id> | done
drill:   flip | right (know) | left (don't know) | undo
other:   say <text> | dismiss | restart | help | quit";

/// Human-readable rendering of a state snapshot.
pub fn render(state: &SessionState) -> String {
    let mut out = match &state.phase {
        SessionPhase::Loading => "Loading due words...".to_string(),
        SessionPhase::Empty => "Nothing is due right now.".to_string(),
        SessionPhase::Finished { total_processed } => {
            format!("Session finished: {} words practised.", total_processed)
        }
        SessionPhase::Error { message } => format!("Session error: {}", message),
        SessionPhase::BatchPairing { batch } => {
            let mut out = format!("Batch {}: match each word with its translation\n", batch.seq);
            if let Some(pairing) = &state.pairing {
                for card in &pairing.cards {
                    let marker = if card.matched {
                        "="
                    } else if card.mismatched {
                        "x"
                    } else if pairing.selected == Some(card.id) {
                        ">"
                    } else {
                        " "
                    };
                    let side = match card.side {
                        CardSide::Original => "word",
                        CardSide::Translation => "translation",
                    };
                    out.push_str(&format!("{} [{}] {} ({})\n", marker, card.id, card.text, side));
                }
            }
            out.trim_end().to_string()
        }
        SessionPhase::BatchRegular { batch } => match &state.current_word {
            Some(word) => format!(
                "Batch {} card {}/{}: {}",
                batch.seq,
                state.current_index + 1,
                batch.len(),
                card_text(word, state.card_face)
            ),
            None => format!("Batch {}: no current card", batch.seq),
        },
    };

    if state.can_undo {
        out.push_str("\n(undo available)");
    }
    if let Some(message) = &state.error_message {
        out.push_str(&format!("\n! {}", message));
    }
    out
}

fn card_text(word: &Word, face: CardFace) -> String {
    match face {
        CardFace::Prompt => word.text.clone(),
        CardFace::Answer => format!(
            "{} = {} [{:?}, {:.0}%]",
            word.text,
            word.translation,
            word.status(),
            scheduler::progress(word.interval) * 100.0
        ),
    }
}
