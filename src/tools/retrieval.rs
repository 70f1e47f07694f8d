//! Vector retrieval tool - question answering over a Pinecone index
//!
//! The query is embedded, the index host is resolved from the controller for
//! the configured environment, the closest matches are fetched and the chat
//! model answers over their `metadata.text`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::traits::Tool;
use crate::agent::client::{ChatModel, Embedder};
use crate::agent::types::Message;
use crate::config::PineconeSettings;
use crate::error::{Error, Result};

/// Controller URL; `{env}` is replaced by the Pinecone environment
pub const DEFAULT_CONTROLLER: &str = "https://controller.{env}.pinecone.io";
pub const NO_MATCHES: &str = "No relevant documents were found in the index.";

const TOP_K: u32 = 4;

const QA_PROMPT: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

#[derive(Debug, Deserialize)]
struct IndexDescription {
    status: IndexStatus,
}

#[derive(Debug, Deserialize)]
struct IndexStatus {
    host: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest {
    vector: Vec<f32>,
    top_k: u32,
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Debug, Deserialize)]
struct Match {
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

/// Pinecone-backed retrieval QA tool
pub struct RetrievalTool {
    client: Client,
    controller: String,
    api_key: SecretString,
    settings: PineconeSettings,
    chat: Arc<dyn ChatModel>,
    embedder: Arc<dyn Embedder>,
    host: OnceCell<String>,
}

impl RetrievalTool {
    pub fn new(
        client: Client,
        controller: &str,
        api_key: SecretString,
        settings: PineconeSettings,
        chat: Arc<dyn ChatModel>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        RetrievalTool {
            client,
            controller: controller.replace("{env}", &settings.pinecone_env),
            api_key,
            settings,
            chat,
            embedder,
            host: OnceCell::new(),
        }
    }

    fn api_key_header(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(self.api_key.expose_secret())
            .map_err(|e| Error::Config(format!("Invalid Pinecone API key format: {}", e)))?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// Resolve the index host once per tool
    async fn index_host(&self) -> Result<&str> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let url = format!(
                    "{}/databases/{}",
                    self.controller.trim_end_matches('/'),
                    self.settings.pinecone_index
                );
                let response = self
                    .client
                    .get(&url)
                    .header("Api-Key", self.api_key_header()?)
                    .send()
                    .await?;

                if !response.status().is_success() {
                    return Err(Error::Provider(format!(
                        "Pinecone index '{}' lookup failed with status {}",
                        self.settings.pinecone_index,
                        response.status()
                    )));
                }

                let description: IndexDescription = response.json().await?;
                let host = description.status.host;
                let host = if host.starts_with("http://") || host.starts_with("https://") {
                    host
                } else {
                    format!("https://{}", host)
                };
                info!("Resolved Pinecone index {} at {}", self.settings.pinecone_index, host);
                Ok::<_, Error>(host)
            })
            .await?;
        Ok(host.as_str())
    }

    /// Texts of the closest matches
    pub async fn retrieve(&self, query: &str) -> Result<Vec<String>> {
        let vector = self.embedder.embed(query).await?;
        let host = self.index_host().await?;

        debug!("Querying Pinecone index {} (top {})", self.settings.pinecone_index, TOP_K);
        let response = self
            .client
            .post(format!("{}/query", host.trim_end_matches('/')))
            .header("Api-Key", self.api_key_header()?)
            .json(&QueryRequest {
                vector,
                top_k: TOP_K,
                include_metadata: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "Pinecone query failed with status {}: {}",
                status, text
            )));
        }

        let body: QueryResponse = response.json().await?;
        Ok(body
            .matches
            .into_iter()
            .filter_map(|m| {
                m.metadata
                    .as_ref()
                    .and_then(|meta| meta.get("text"))
                    .and_then(|text| text.as_str())
                    .map(str::to_string)
            })
            .collect())
    }
}

#[async_trait]
impl Tool for RetrievalTool {
    fn name(&self) -> &str {
        &self.settings.tool_name
    }

    fn description(&self) -> &str {
        &self.settings.tool_description
    }

    async fn invoke(&self, query: &str) -> Result<String> {
        let documents = self.retrieve(query).await?;
        if documents.is_empty() {
            return Ok(NO_MATCHES.to_string());
        }

        let messages = vec![
            Message::system(QA_PROMPT),
            Message::user(format!(
                "{}\n\nQuestion: {}\nHelpful Answer:",
                documents.join("\n\n"),
                query
            )),
        ];
        self.chat.complete(messages).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::types::ToolDefinition;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.5, 0.25])
        }
    }

    struct ContextEcho;

    #[async_trait]
    impl ChatModel for ContextEcho {
        async fn respond(&self, messages: Vec<Message>, _tools: Vec<ToolDefinition>) -> Result<Message> {
            Ok(Message::assistant(
                messages.last().map(|m| m.content.clone()).unwrap_or_default(),
            ))
        }
    }

    fn settings() -> PineconeSettings {
        PineconeSettings {
            pinecone_index: "butler-notes".to_string(),
            pinecone_env: "test-env".to_string(),
            tool_name: "Notes".to_string(),
            tool_description: "Household notes".to_string(),
        }
    }

    #[tokio::test]
    async fn test_answers_over_matches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/databases/butler-notes"))
            .and(header("api-key", "pc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "database": {"name": "butler-notes"},
                "status": {"ready": true, "host": server.uri()}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(body_partial_json(json!({"topK": 4, "includeMetadata": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "matches": [
                    {"id": "a", "score": 0.9, "metadata": {"text": "The wine cellar key is in the study."}},
                    {"id": "b", "score": 0.5}
                ]
            })))
            .mount(&server)
            .await;

        let tool = RetrievalTool::new(
            Client::new(),
            &server.uri(),
            "pc".to_string().into(),
            settings(),
            Arc::new(ContextEcho),
            Arc::new(FixedEmbedder),
        );

        assert_eq!(tool.name(), "Notes");
        let answer = tool.invoke("Where is the cellar key?").await.unwrap();
        assert!(answer.contains("The wine cellar key is in the study."));
        assert!(answer.contains("Question: Where is the cellar key?"));

        // Host is resolved once.
        tool.invoke("Again?").await.unwrap();
    }

    #[tokio::test]
    async fn test_no_matches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/databases/butler-notes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": {"host": server.uri()}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"matches": []})))
            .mount(&server)
            .await;

        let tool = RetrievalTool::new(
            Client::new(),
            &server.uri(),
            "pc".to_string().into(),
            settings(),
            Arc::new(ContextEcho),
            Arc::new(FixedEmbedder),
        );
        assert_eq!(tool.invoke("anything").await.unwrap(), NO_MATCHES);
    }

    #[test]
    fn test_controller_template() {
        let tool = RetrievalTool::new(
            Client::new(),
            DEFAULT_CONTROLLER,
            "pc".to_string().into(),
            settings(),
            Arc::new(ContextEcho),
            Arc::new(FixedEmbedder),
        );
        assert_eq!(tool.controller, "https://controller.test-env.pinecone.io");
    }
}
