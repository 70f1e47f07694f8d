//! Agent module - language model client, conversation memory and the
//! tool-calling agent
//!
//! - client.rs: OpenAI client (chat with function calling, embeddings,
//!   transcription) behind the `ChatModel`, `Embedder` and `Transcriber` traits
//! - memory.rs: token-bounded conversation memory
//! - conversational.rs: the `ConversationalAgent` seam and `ToolCallingAgent`

pub mod client;
mod conversational;
mod memory;
pub mod types;

pub use client::{ChatModel, Embedder, OpenAiClient, Transcriber};
pub use conversational::{ConversationalAgent, ToolCallingAgent};
pub use memory::{estimate_tokens, AgentMemory};
pub use types::*;
