//! Activation sources and the race between them
//!
//! Every source is polled at once; the first to fire starts a session. The
//! losers' futures are dropped and every source discards whatever it had
//! queued, so one press or phrase never activates twice.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::select_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::channels::{ConsoleLines, TranscribingInput};
use crate::config::Hotkey;
use crate::error::{Error, Result};

const LISTEN_RETRY_DELAY: Duration = Duration::from_secs(1);

/// What started a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Hotkey,
    WakeWord(String),
}

/// A source of activation signals
#[async_trait]
pub trait ActivationSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Wait until this source fires
    async fn wait(&self, cancel: &CancellationToken) -> Result<Activation>;

    /// Drop anything detected but not yet consumed
    fn discard_pending(&self) {}
}

/// Enter on the console, standing in for the configured global hotkey
pub struct TerminalHotkey {
    lines: ConsoleLines,
    hotkey: Hotkey,
}

impl TerminalHotkey {
    pub fn new(lines: ConsoleLines, hotkey: Hotkey) -> Self {
        TerminalHotkey { lines, hotkey }
    }
}

#[async_trait]
impl ActivationSource for TerminalHotkey {
    fn name(&self) -> &str {
        "hotkey"
    }

    async fn wait(&self, cancel: &CancellationToken) -> Result<Activation> {
        debug!("Waiting for Enter in place of {}", self.hotkey);
        self.lines.next_line(cancel).await?;
        Ok(Activation::Hotkey)
    }

    fn discard_pending(&self) {
        let dropped = self.lines.discard_pending();
        if dropped > 0 {
            debug!("Discarded {} buffered hotkey press(es)", dropped);
        }
    }
}

/// Continuous listening for a spoken wake word
pub struct WakeWordListener {
    listener: Arc<TranscribingInput>,
    wake_word: String,
}

impl WakeWordListener {
    pub fn new(listener: Arc<TranscribingInput>, wake_word: impl Into<String>) -> Self {
        WakeWordListener {
            listener,
            wake_word: wake_word.into(),
        }
    }
}

/// Lowercase words without punctuation
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whether `heard` contains the wake word (or phrase) as whole words
pub fn contains_wake_word(heard: &str, wake_word: &str) -> bool {
    let phrase = words(wake_word);
    if phrase.is_empty() {
        return false;
    }
    words(heard).windows(phrase.len()).any(|window| window == phrase.as_slice())
}

#[async_trait]
impl ActivationSource for WakeWordListener {
    fn name(&self) -> &str {
        "wake word"
    }

    async fn wait(&self, cancel: &CancellationToken) -> Result<Activation> {
        loop {
            match self.listener.listen(cancel).await {
                Ok(heard) if contains_wake_word(&heard, &self.wake_word) => {
                    return Ok(Activation::WakeWord(self.wake_word.clone()));
                }
                Ok(_) => {}
                Err(e) if e.is_shutdown() => return Err(e),
                Err(e) => {
                    warn!("Wake word listening failed: {}", e);
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(Error::Cancelled),
                        _ = tokio::time::sleep(LISTEN_RETRY_DELAY) => {}
                    }
                }
            }
        }
    }
}

/// Race every source; the first to fire wins.
///
/// A source that fails drops out of the race; the error surfaces only when
/// no source is left.
pub async fn wait_for_activation(
    sources: &[Arc<dyn ActivationSource>],
    cancel: &CancellationToken,
) -> Result<Activation> {
    if sources.is_empty() {
        return Err(Error::Config("No activation source configured".to_string()));
    }

    let race = async {
        let mut pending: Vec<_> = sources.iter().map(|s| s.wait(cancel)).collect();
        let mut names: Vec<&str> = sources.iter().map(|s| s.name()).collect();

        loop {
            let (result, index, rest) = select_all(pending).await;
            let name = names.remove(index);
            match result {
                Ok(activation) => {
                    info!("Activated by {}", name);
                    return Ok(activation);
                }
                Err(e) if rest.is_empty() || matches!(e, Error::Cancelled) => {
                    return Err(e);
                }
                Err(e) => {
                    warn!("Activation source {} stopped: {}", name, e);
                    pending = rest;
                }
            }
        }
    };

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = race => result,
    };

    for source in sources {
        source.discard_pending();
    }
    result
}
