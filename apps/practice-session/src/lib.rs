pub mod collaborators;
pub mod config;
pub mod driver;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod state;

use std::sync::Arc;

use anyhow::Context;
use practice_core::Word;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use collaborators::{DueWordSource, SpeechCollaborator, TracingSpeech, WordPersistence};
pub use config::SessionConfig;
pub use error::{PersistenceError, Result, SessionError};
pub use memory::MemoryWordStore;
pub use orchestrator::{Collaborators, SessionHandle};
pub use state::{PairingView, SessionPhase, SessionState};

use crate::driver::{dispatch, parse_line, render, Input, HELP};

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = SessionConfig::from_env()?;
    let words_path =
        std::env::var("PRACTICE_WORDS_FILE").unwrap_or_else(|_| "words.json".to_string());

    tracing::info!("Loading words from {}", words_path);
    let raw = tokio::fs::read_to_string(&words_path)
        .await
        .with_context(|| format!("failed to read {}", words_path))?;
    let words: Vec<Word> =
        serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", words_path))?;

    let store = Arc::new(MemoryWordStore::new(words));
    let handle = SessionHandle::spawn(
        config,
        Collaborators {
            source: store.clone(),
            persistence: store.clone(),
            speech: Arc::new(TracingSpeech),
        },
    )?;

    let mut updates = handle.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            println!("{}\n", render(&updates.borrow_and_update()));
            if updates.changed().await.is_err() {
                break;
            }
        }
    });

    println!("{}\n", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Some(Input::Quit) => break,
            Some(Input::Help) => println!("{}\n", HELP),
            Some(input) => dispatch(&handle, input).await?,
            None => println!("Unknown command, type `help`.\n"),
        }
    }

    handle.shutdown().await;
    printer.abort();

    if let Some(path) = std::env::var_os("PRACTICE_SAVE_FILE") {
        let json = serde_json::to_string_pretty(&store.words())?;
        tokio::fs::write(&path, json).await?;
        tracing::info!("Saved word states to {}", path.to_string_lossy());
    }

    Ok(())
}
