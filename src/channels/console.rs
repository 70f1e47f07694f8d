//! Console channel
//!
//! Stdin is read on a dedicated thread that feeds a tokio channel, so waiting
//! for a line can be raced against cancellation. The same line stream backs
//! the text input and the terminal hotkey.

use std::io::{BufRead, Write};
use std::sync::Arc;

use async_trait::async_trait;
use console::style;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{InputChannel, OutputChannel};
use crate::error::{Error, Result};

const LINE_BUFFER: usize = 16;

/// Shared stream of lines typed on the console
#[derive(Clone)]
pub struct ConsoleLines {
    rx: Arc<Mutex<mpsc::Receiver<String>>>,
}

impl ConsoleLines {
    /// Start reading stdin on a background thread
    pub fn spawn_stdin() -> Self {
        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        std::thread::Builder::new()
            .name("stdin-reader".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                debug!("stdin closed");
            })
            .map(|_| ())
            .unwrap_or_else(|e| debug!("Failed to start stdin reader: {}", e));

        Self::from_receiver(rx)
    }

    /// Lines from an existing channel
    pub fn from_receiver(rx: mpsc::Receiver<String>) -> Self {
        ConsoleLines {
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Wait for the next line
    pub async fn next_line(&self, cancel: &CancellationToken) -> Result<String> {
        let mut rx = self.rx.lock().await;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            line = rx.recv() => line.ok_or(Error::InputClosed),
        }
    }

    /// Drop lines typed ahead of time
    pub fn discard_pending(&self) -> usize {
        let Ok(mut rx) = self.rx.try_lock() else {
            return 0;
        };
        let mut dropped = 0;
        while rx.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }
}

/// Typed input
#[derive(Clone)]
pub struct ConsoleInput {
    lines: ConsoleLines,
}

impl ConsoleInput {
    pub fn new(lines: ConsoleLines) -> Self {
        ConsoleInput { lines }
    }
}

#[async_trait]
impl InputChannel for ConsoleInput {
    async fn next_utterance(&self, cancel: &CancellationToken) -> Result<String> {
        self.lines.next_line(cancel).await
    }
}

/// Styled transcript writer
pub struct ConsoleOutput {
    bot_name: String,
    writer: std::sync::Mutex<Box<dyn Write + Send>>,
}

impl ConsoleOutput {
    /// Write to stdout
    pub fn stdout(bot_name: impl Into<String>) -> Self {
        Self::with_writer(bot_name, Box::new(std::io::stdout()))
    }

    pub fn with_writer(bot_name: impl Into<String>, writer: Box<dyn Write + Send>) -> Self {
        ConsoleOutput {
            bot_name: bot_name.into(),
            writer: std::sync::Mutex::new(writer),
        }
    }

    /// Write one line of transcript
    pub fn write_line(&self, text: &str) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| Error::Io(std::io::Error::other("console writer poisoned")))?;
        writeln!(writer, "{}: {}", style(&self.bot_name).cyan().bold(), text)?;
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl OutputChannel for ConsoleOutput {
    async fn emit(&self, text: &str) -> Result<()> {
        self.write_line(text)
    }
}
