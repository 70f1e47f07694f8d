//! Voice configuration types
//!
//! Recording, speech synthesis and wake-word parameters for the voice interface.

use serde::{Deserialize, Serialize};

/// Voice engine settings (`[voice]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// Voice preset passed to the speech command (empty = engine default)
    #[serde(default)]
    pub voice: String,
    /// Speech synthesis program; receives `-v <voice>` and the text
    #[serde(default = "default_speak_command")]
    pub speak_command: String,
    /// Recording command template; `{output}` and `{seconds}` are substituted
    #[serde(default = "default_record_command")]
    pub record_command: String,
    /// Length of one recorded clip
    #[serde(default = "default_record_seconds")]
    pub record_seconds: u64,
    /// Spoken word that activates a session (empty = hotkey only)
    #[serde(default)]
    pub wake_word: String,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        VoiceSettings {
            voice: String::new(),
            speak_command: default_speak_command(),
            record_command: default_record_command(),
            record_seconds: default_record_seconds(),
            wake_word: String::new(),
        }
    }
}

impl VoiceSettings {
    /// The wake word, if one is configured
    pub fn wake_word(&self) -> Option<&str> {
        let word = self.wake_word.trim();
        (!word.is_empty()).then_some(word)
    }
}

fn default_speak_command() -> String {
    if cfg!(target_os = "macos") {
        "say".to_string()
    } else {
        "espeak".to_string()
    }
}

fn default_record_command() -> String {
    "rec -q -c 1 -r 16000 {output} trim 0 {seconds}".to_string()
}

fn default_record_seconds() -> u64 {
    5
}
