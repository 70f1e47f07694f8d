//! Wolfram Alpha tool - Short Answers API

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use super::traits::Tool;
use crate::error::{Error, Result};

pub const NAME: &str = "Wolfram Alpha";
pub const DESCRIPTION: &str = "Useful for when you need to answer questions about Math, Science, Technology, Culture, people, Society and Everyday Life. Input should be a search query";
pub const DEFAULT_ENDPOINT: &str = "https://api.wolframalpha.com/v1/result";
pub const NO_ANSWER: &str = "Wolfram Alpha wasn't able to answer it";

/// Knowledge engine tool
pub struct WolframAlphaTool {
    client: Client,
    endpoint: String,
    app_id: SecretString,
}

impl WolframAlphaTool {
    pub fn new(client: Client, endpoint: impl Into<String>, app_id: SecretString) -> Self {
        WolframAlphaTool {
            client,
            endpoint: endpoint.into(),
            app_id,
        }
    }
}

#[async_trait]
impl Tool for WolframAlphaTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    async fn invoke(&self, query: &str) -> Result<String> {
        let url = Url::parse_with_params(
            &self.endpoint,
            &[("appid", self.app_id.expose_secret()), ("i", query), ("units", "metric")],
        )?;

        debug!("Wolfram Alpha query: {}", query);
        let response = self.client.get(url).send().await.map_err(|e| e.without_url())?;

        match response.status() {
            status if status.is_success() => {
                let answer = response.text().await.map_err(|e| e.without_url())?;
                if answer.trim().is_empty() {
                    Ok(NO_ANSWER.to_string())
                } else {
                    Ok(answer.trim().to_string())
                }
            }
            // 501: the input has no short answer
            StatusCode::NOT_IMPLEMENTED => Ok(NO_ANSWER.to_string()),
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(Error::Provider(format!(
                    "Wolfram Alpha failed with status {}: {}",
                    status, text
                )))
            }
        }
    }
}
