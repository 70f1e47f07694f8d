//! One activation-to-termination dialogue

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::agent::AgentMemory;

/// Who said a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

/// One utterance or reply
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Session context owned by the dialogue loop.
///
/// Turns are append-only. The memory is what the agent sees and may be
/// cleared independently of the turns.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    turns: Vec<Turn>,
    pub memory: AgentMemory,
    terminated: bool,
}

impl Session {
    /// Start a session with an empty memory of the given token budget
    pub fn new(memory_token_limit: usize) -> Self {
        Session {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            turns: Vec::new(),
            memory: AgentMemory::new(memory_token_limit),
            terminated: false,
        }
    }

    fn push(&mut self, speaker: Speaker, text: &str) {
        self.turns.push(Turn {
            speaker,
            text: text.to_string(),
            at: Utc::now(),
        });
    }

    pub fn push_user(&mut self, text: &str) {
        self.push(Speaker::User, text);
    }

    pub fn push_assistant(&mut self, text: &str) {
        self.push(Speaker::Assistant, text);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn terminate(&mut self) {
        self.terminated = true;
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}
