//! Search tool - Google Custom Search JSON API

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::traits::Tool;
use crate::error::{Error, Result};

pub const NAME: &str = "Search";
pub const DESCRIPTION: &str =
    "Useful when you need to answer questions about current events and real-time information";
pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
pub const NO_RESULT: &str = "No good Google Search Result was found";

const RESULT_COUNT: u8 = 2;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    snippet: String,
}

/// Google search tool
pub struct SearchTool {
    client: Client,
    endpoint: String,
    api_key: SecretString,
    cse_id: SecretString,
}

impl SearchTool {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        api_key: SecretString,
        cse_id: SecretString,
    ) -> Self {
        SearchTool {
            client,
            endpoint: endpoint.into(),
            api_key,
            cse_id,
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<String>> {
        let count = RESULT_COUNT.to_string();
        let url = Url::parse_with_params(
            &self.endpoint,
            &[
                ("key", self.api_key.expose_secret()),
                ("cx", self.cse_id.expose_secret()),
                ("q", query),
                ("num", count.as_str()),
            ],
        )?;

        debug!("Google search: {}", query);
        // The URL carries the key; keep it out of error text.
        let response = self.client.get(url).send().await.map_err(|e| e.without_url())?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "Google search failed with status {}: {}",
                status, text
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("Failed to parse Google response: {}", e)))?;

        Ok(body
            .items
            .into_iter()
            .map(|item| item.snippet.replace('\n', " ").trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    async fn invoke(&self, query: &str) -> Result<String> {
        let snippets = self.search(query).await?;
        if snippets.is_empty() {
            return Ok(NO_RESULT.to_string());
        }
        Ok(snippets.join(" "))
    }
}
