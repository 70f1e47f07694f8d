//! Wikipedia tool - MediaWiki search followed by a model summary

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::traits::Tool;
use crate::agent::client::ChatModel;
use crate::agent::types::Message;
use crate::error::{Error, Result};

pub const NAME: &str = "Wikipedia";
pub const DESCRIPTION: &str = "Useful for searching information on historical information on Wikipedia. Use this more than the normal search if the question is about events that occured before 2023, like the 'What was the 2008 financial crisis?' or 'Who won the 2016 US presidential election?'";
pub const DEFAULT_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";
pub const NO_RESULT: &str = "No good Wikipedia Search Result was found";

const TOP_K_RESULTS: u8 = 3;
const MAX_EXTRACT_CHARS: usize = 4000;

const SUMMARY_PROMPT: &str = "Write a concise answer to the question using only the Wikipedia \
pages below. Mention the page a fact comes from when it helps.";

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<QueryPages>,
}

#[derive(Debug, Deserialize)]
struct QueryPages {
    #[serde(default)]
    pages: HashMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    extract: String,
    #[serde(default)]
    index: u32,
}

/// A page found by the lookup stage
#[derive(Debug, Clone, PartialEq)]
pub struct WikiPage {
    pub title: String,
    pub summary: String,
}

/// Two-stage encyclopedia tool
pub struct WikipediaTool {
    client: Client,
    endpoint: String,
    chat: Arc<dyn ChatModel>,
}

impl WikipediaTool {
    pub fn new(client: Client, endpoint: impl Into<String>, chat: Arc<dyn ChatModel>) -> Self {
        WikipediaTool {
            client,
            endpoint: endpoint.into(),
            chat,
        }
    }

    /// Stage one: find pages with their intro extracts, best match first
    pub async fn lookup(&self, query: &str) -> Result<Vec<WikiPage>> {
        let limit = TOP_K_RESULTS.to_string();
        let url = Url::parse_with_params(
            &self.endpoint,
            &[
                ("action", "query"),
                ("format", "json"),
                ("generator", "search"),
                ("gsrsearch", query),
                ("gsrlimit", limit.as_str()),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("exlimit", limit.as_str()),
            ],
        )?;

        debug!("Wikipedia lookup: {}", query);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Provider(format!(
                "Wikipedia lookup failed with status {}",
                response.status()
            )));
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("Failed to parse Wikipedia response: {}", e)))?;

        let mut pages: Vec<Page> = body
            .query
            .map(|q| q.pages.into_values().collect())
            .unwrap_or_default();
        pages.sort_by_key(|p| p.index);

        Ok(pages
            .into_iter()
            .filter(|p| !p.extract.trim().is_empty())
            .map(|p| WikiPage {
                title: p.title,
                summary: p.extract.trim().chars().take(MAX_EXTRACT_CHARS).collect(),
            })
            .collect())
    }
}

fn render_pages(pages: &[WikiPage]) -> String {
    pages
        .iter()
        .map(|p| format!("Page: {}\nSummary: {}", p.title, p.summary))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Tool for WikipediaTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    async fn invoke(&self, query: &str) -> Result<String> {
        let pages = self.lookup(query).await?;
        if pages.is_empty() {
            return Ok(NO_RESULT.to_string());
        }

        // Stage two: summarise across every page found.
        let messages = vec![
            Message::system(SUMMARY_PROMPT),
            Message::user(format!("Question: {}\n\n{}", query, render_pages(&pages))),
        ];
        self.chat.complete(messages).await
    }
}
