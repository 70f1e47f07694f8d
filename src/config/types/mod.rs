//! Configuration types module
//!
//! Mirrors the sections of `settings.ini`:
//! - `[settings]`: general bot settings (this file)
//! - `[tools]` and `[pinecone]`: tools.rs
//! - `[voice]`: voice.rs
//! - `[model]`: model.rs

pub mod model;
pub mod tools;
pub mod voice;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Resolved run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// General settings (`[settings]`)
    #[serde(rename = "settings")]
    pub general: GeneralSettings,

    /// Per-tool enabled flags (`[tools]`)
    pub tools: tools::ToolFlags,

    /// Vector retrieval backend parameters (`[pinecone]`)
    #[serde(default)]
    pub pinecone: tools::PineconeSettings,

    /// Voice engine parameters (`[voice]`)
    #[serde(default)]
    pub voice: voice::VoiceSettings,

    /// Language model parameters (`[model]`)
    #[serde(default)]
    pub model: model::ModelSettings,
}

/// General bot settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Name the bot answers to
    pub bot_name: String,
    /// Context text given to the agent before the first turn
    #[serde(default)]
    pub bot_context: String,
    /// Activation hotkey, e.g. `ctrl+shift+1`
    pub hotkey: String,
    /// Which input/output channels to run
    #[serde(default)]
    pub interface: Interface,
    /// Apology used when a turn fails
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
    /// Append the error text to the apology
    #[serde(default = "default_true")]
    pub include_error_detail: bool,
}

impl GeneralSettings {
    /// Parse the configured hotkey
    pub fn parsed_hotkey(&self) -> crate::Result<Hotkey> {
        self.hotkey.parse()
    }
}

fn default_fallback_message() -> String {
    "Apologies, An error occurred while processing your request".to_string()
}

fn default_true() -> bool {
    true
}

/// Input/output channel pair the assistant runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interface {
    /// Typed input, printed replies
    #[default]
    Text,
    /// Microphone transcription in, synthesized speech out
    Voice,
}

impl std::str::FromStr for Interface {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "chat" => Ok(Interface::Text),
            "voice" | "speech" => Ok(Interface::Voice),
            _ => Err(Error::Config(format!(
                "Invalid interface: {}. Valid options: text, voice",
                s
            ))),
        }
    }
}

impl TryFrom<String> for Interface {
    type Error = Error;

    fn try_from(value: String) -> crate::Result<Self> {
        value.parse()
    }
}

impl From<Interface> for String {
    fn from(value: Interface) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for Interface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interface::Text => write!(f, "text"),
            Interface::Voice => write!(f, "voice"),
        }
    }
}

/// Keyboard modifier in a hotkey combination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Ctrl,
    Shift,
    Alt,
    Super,
}

/// A parsed hotkey such as `ctrl+shift+1`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotkey {
    /// Modifiers held with the key, in the order written
    pub modifiers: Vec<Modifier>,
    /// The final non-modifier key
    pub key: String,
}

impl std::str::FromStr for Hotkey {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let parts: Vec<String> = s
            .split('+')
            .map(|p| p.trim().to_lowercase())
            .collect();

        let (key, modifiers) = match parts.split_last() {
            Some((key, modifiers)) if !key.is_empty() => (key.clone(), modifiers),
            _ => return Err(Error::Config(format!("Invalid hotkey: '{}'", s))),
        };

        let modifiers = modifiers
            .iter()
            .map(|m| match m.as_str() {
                "ctrl" | "control" => Ok(Modifier::Ctrl),
                "shift" => Ok(Modifier::Shift),
                "alt" | "option" => Ok(Modifier::Alt),
                "cmd" | "super" | "win" | "meta" => Ok(Modifier::Super),
                other => Err(Error::Config(format!(
                    "Invalid hotkey modifier '{}' in '{}'",
                    other, s
                ))),
            })
            .collect::<crate::Result<Vec<_>>>()?;

        Ok(Hotkey { modifiers, key })
    }
}

impl std::fmt::Display for Hotkey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for modifier in &self.modifiers {
            let name = match modifier {
                Modifier::Ctrl => "ctrl",
                Modifier::Shift => "shift",
                Modifier::Alt => "alt",
                Modifier::Super => "super",
            };
            write!(f, "{}+", name)?;
        }
        write!(f, "{}", self.key)
    }
}
