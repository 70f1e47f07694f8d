//! Channels - where utterances come from and where replies go
//!
//! - console.rs: line input from stdin and a styled transcript on stdout
//! - voice.rs: recorded audio through a transcriber, replies through a
//!   speech command

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

mod console;
mod voice;

pub use console::{ConsoleInput, ConsoleLines, ConsoleOutput};
pub use voice::{AudioRecorder, CommandRecorder, SpeechOutput, TranscribingInput};

/// Source of user utterances
#[async_trait]
pub trait InputChannel: Send + Sync {
    /// Wait for the next utterance.
    ///
    /// Returns [`Error::InputClosed`](crate::Error::InputClosed) when no more
    /// input can arrive and [`Error::Transcription`](crate::Error::Transcription)
    /// when audio could not be turned into text.
    async fn next_utterance(&self, cancel: &CancellationToken) -> Result<String>;
}

/// Sink for assistant text
#[async_trait]
pub trait OutputChannel: Send + Sync {
    async fn emit(&self, text: &str) -> Result<()>;
}
