//! Language model configuration types

use serde::{Deserialize, Serialize};

/// Chat model settings (`[model]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Chat model name
    #[serde(default = "default_model")]
    pub model: String,
    /// Embedding model used for vector retrieval
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Transcription model used by the voice interface
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens per reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Token budget of the conversation memory
    #[serde(default = "default_memory_token_limit")]
    pub memory_token_limit: u32,
    /// OpenAI-compatible API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Maximum model round-trips per turn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        ModelSettings {
            model: default_model(),
            embedding_model: default_embedding_model(),
            transcription_model: default_transcription_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            memory_token_limit: default_memory_token_limit(),
            base_url: default_base_url(),
            max_iterations: default_max_iterations(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_temperature() -> f32 {
    0.5
}

fn default_max_tokens() -> u32 {
    150
}

fn default_memory_token_limit() -> u32 {
    1500
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_max_iterations() -> u32 {
    6
}

fn default_timeout() -> u64 {
    120
}
