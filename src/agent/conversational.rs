//! Conversational agent - turns an utterance and history into a reply
//!
//! `ToolCallingAgent` runs the model/tool loop: the model either answers or
//! asks for tool calls, whose text results are fed back until it answers or
//! the iteration limit is reached.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::agent::client::ChatModel;
use crate::agent::types::Message;
use crate::error::{Error, Result};
use crate::tools::{ToolCall, ToolRegistry};

/// Produces a reply for one user utterance
#[async_trait]
pub trait ConversationalAgent: Send + Sync {
    /// `history` is the memory before this utterance, oldest first.
    ///
    /// Fails with [`Error::CapacityExceeded`] when the conversation no longer
    /// fits the model's context window.
    async fn run(
        &self,
        utterance: &str,
        history: &[Message],
        cancel: &CancellationToken,
    ) -> Result<String>;
}

/// Agent backed by a function-calling chat model
pub struct ToolCallingAgent {
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    preamble: String,
    max_iterations: u32,
}

impl ToolCallingAgent {
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: Arc<ToolRegistry>,
        preamble: impl Into<String>,
        max_iterations: u32,
    ) -> Self {
        ToolCallingAgent {
            model,
            tools,
            preamble: preamble.into(),
            max_iterations: max_iterations.max(1),
        }
    }

    /// Registered tools
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    fn initial_messages(&self, utterance: &str, history: &[Message]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        if !self.preamble.trim().is_empty() {
            messages.push(Message::system(self.preamble.clone()));
        }
        messages.extend_from_slice(history);
        messages.push(Message::user(utterance));
        messages
    }
}

#[async_trait]
impl ConversationalAgent for ToolCallingAgent {
    async fn run(
        &self,
        utterance: &str,
        history: &[Message],
        cancel: &CancellationToken,
    ) -> Result<String> {
        let mut messages = self.initial_messages(utterance, history);
        let definitions = self.tools.definitions();

        for iteration in 1..=self.max_iterations {
            debug!("Agent iteration {}/{}", iteration, self.max_iterations);

            let reply = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                reply = self.model.respond(messages.clone(), definitions.clone()) => reply?,
            };

            if !reply.has_tool_calls() {
                let content = reply.content.trim();
                if content.is_empty() {
                    return Err(Error::Agent("Model returned an empty reply".to_string()));
                }
                return Ok(content.to_string());
            }
            let calls = reply.tool_calls.clone().unwrap_or_default();

            messages.push(reply);
            for call in &calls {
                let call = ToolCall::from(call);
                info!("Calling tool {} with {}", call.name, call.query());

                let observation = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(Error::Cancelled),
                    observation = self.tools.execute(&call) => observation,
                };
                debug!("Tool {} returned {} chars", call.name, observation.len());
                messages.push(Message::tool(call.id, observation));
            }
        }

        warn!("Agent stopped after {} iterations without an answer", self.max_iterations);
        Err(Error::Agent(format!(
            "No answer after {} iterations",
            self.max_iterations
        )))
    }
}
