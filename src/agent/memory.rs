//! Conversation memory bounded by a token budget

use std::collections::VecDeque;

use tracing::debug;

use crate::agent::types::Message;

/// Rough token estimate (~4 chars per token)
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Buffer of past messages that evicts the oldest once over budget
#[derive(Debug, Clone)]
pub struct AgentMemory {
    messages: VecDeque<Message>,
    token_limit: usize,
}

impl AgentMemory {
    /// Create an empty memory with the given token budget
    pub fn new(token_limit: usize) -> Self {
        AgentMemory {
            messages: VecDeque::new(),
            token_limit,
        }
    }

    /// Record a user utterance and the reply to it
    pub fn record_exchange(&mut self, user: impl Into<String>, reply: impl Into<String>) {
        self.messages.push_back(Message::user(user));
        self.messages.push_back(Message::assistant(reply));
        self.prune();
    }

    fn prune(&mut self) {
        let mut evicted = 0;
        while self.token_count() > self.token_limit {
            if self.messages.pop_front().is_none() {
                break;
            }
            evicted += 1;
        }
        if evicted > 0 {
            debug!("Memory over budget, evicted {} message(s)", evicted);
        }
    }

    /// Estimated tokens held
    pub fn token_count(&self) -> usize {
        self.messages.iter().map(|m| estimate_tokens(&m.content)).sum()
    }

    /// Messages, oldest first
    pub fn messages(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::types::Role;

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_records_in_order() {
        let mut memory = AgentMemory::new(1500);
        memory.record_exchange("Hi", "Hello, sir.");

        let messages = memory.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].content, "Hello, sir.");
    }

    #[test]
    fn test_evicts_oldest_beyond_budget() {
        // Each exchange is 2 messages of 2 tokens each.
        let mut memory = AgentMemory::new(8);
        memory.record_exchange("first...", "reply-01");
        memory.record_exchange("second..", "reply-02");
        assert_eq!(memory.len(), 4);

        memory.record_exchange("third...", "reply-03");
        assert_eq!(memory.len(), 4);
        assert_eq!(memory.messages()[0].content, "second..");
        assert!(memory.token_count() <= 8);
    }

    #[test]
    fn test_clear() {
        let mut memory = AgentMemory::new(100);
        memory.record_exchange("a", "b");
        memory.clear();
        assert!(memory.is_empty());
        assert_eq!(memory.token_count(), 0);
    }
}
