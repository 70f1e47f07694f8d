//! OpenAI API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, multipart, Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::agent::types::*;
use crate::config::ModelSettings;
use crate::error::{Error, Result};

/// API error code for a prompt that does not fit the model's context window
pub const CONTEXT_LENGTH_EXCEEDED: &str = "context_length_exceeded";

/// A chat model that can answer, optionally asking for tool calls
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produce the next assistant message for the conversation
    async fn respond(&self, messages: Vec<Message>, tools: Vec<ToolDefinition>) -> Result<Message>;

    /// Produce a plain text completion
    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        Ok(self.respond(messages, Vec::new()).await?.content)
    }
}

/// Turns text into an embedding vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Turns recorded audio into text
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// OpenAI API client
#[derive(Clone)]
pub struct OpenAiClient {
    /// HTTP client
    client: Client,
    /// Model configuration
    settings: ModelSettings,
}

impl OpenAiClient {
    /// Create a new OpenAI client
    pub fn new(api_key: &SecretString, settings: ModelSettings) -> Result<Self> {
        let mut headers = header::HeaderMap::new();

        // Add authorization header
        let mut auth = header::HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|e| Error::Config(format!("Invalid API key format: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(OpenAiClient { client, settings })
    }

    /// Get the chat model name
    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Options taken from the model settings
    pub fn default_options(&self) -> GenerationOptions {
        GenerationOptions {
            max_tokens: Some(self.settings.max_tokens),
            temperature: Some(self.settings.temperature),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    /// Create a chat completion with tools/functions
    pub async fn chat_with_tools(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        options: GenerationOptions,
    ) -> Result<ChatCompletionResponse> {
        let has_tools = !tools.is_empty();
        let request = ChatCompletionRequest {
            model: self.model().to_string(),
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            tools: has_tools.then_some(tools),
            tool_choice: has_tools.then(|| "auto".to_string()),
        };

        self.send_request(request).await
    }

    /// Send a request to the chat completions endpoint
    async fn send_request(&self, request: ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        debug!(
            "Sending chat request: model={}, messages={}",
            request.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(self.url("chat/completions"))
            .json(&request)
            .send()
            .await?;

        let response = check_status(response).await?;
        let completion: ChatCompletionResponse = response.json().await?;

        if let Some(ref usage) = completion.usage {
            info!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        Ok(completion)
    }

    /// Create an embedding for a text
    pub async fn embedding(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Requesting embedding: model={}", self.settings.embedding_model);

        let response = self
            .client
            .post(self.url("embeddings"))
            .json(&EmbeddingRequest {
                model: &self.settings.embedding_model,
                input: text,
            })
            .send()
            .await?;

        let body: EmbeddingResponse = check_status(response).await?.json().await?;
        body.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::Provider("Embedding response had no data".to_string()))
    }

    /// Transcribe an audio clip
    pub async fn transcription(&self, audio: Vec<u8>, file_name: &str) -> Result<String> {
        debug!(
            "Requesting transcription: model={}, bytes={}",
            self.settings.transcription_model,
            audio.len()
        );

        let part = multipart::Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str("audio/wav")?;
        let form = multipart::Form::new()
            .text("model", self.settings.transcription_model.clone())
            .part("file", part);

        let response = self
            .client
            .post(self.url("audio/transcriptions"))
            .multipart(form)
            .send()
            .await?;

        let body: TranscriptionResponse = check_status(response).await?.json().await?;
        Ok(body.text)
    }
}

/// Map a non-success response to a typed error
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    let api_error = serde_json::from_str::<ApiErrorBody>(&error_text).ok().map(|b| b.error);

    match api_error {
        Some(err) if err.code.as_deref() == Some(CONTEXT_LENGTH_EXCEEDED) => {
            warn!("Context length exceeded: {}", err.message);
            Err(Error::CapacityExceeded(err.message))
        }
        Some(err) => Err(Error::Provider(format!("API error ({}): {}", status, err.message))),
        None => Err(Error::Provider(format!("API error ({}): {}", status, error_text))),
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn respond(&self, messages: Vec<Message>, tools: Vec<ToolDefinition>) -> Result<Message> {
        let response = self
            .chat_with_tools(messages, tools, self.default_options())
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| Error::Agent("No response from model".to_string()))
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embedding(text).await
    }
}

#[async_trait]
impl Transcriber for OpenAiClient {
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> Result<String> {
        self.transcription(audio, file_name).await
    }
}
