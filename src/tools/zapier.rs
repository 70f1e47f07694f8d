//! Zapier tool - Natural Language Actions API
//!
//! A query of the form `<action id>: <instructions>` runs that exposed action.
//! Anything else lists the exposed actions so the model can pick one.

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::traits::Tool;
use crate::error::{Error, Result};

pub const NAME: &str = "Zapier";
pub const DESCRIPTION: &str = "Useful for running actions the user has exposed in Zapier, such as sending email, creating calendar events or posting messages. Input should be '<action id>: <instructions in plain English>'. If the action id is unknown, input anything else to get the list of available actions.";
pub const DEFAULT_ENDPOINT: &str = "https://nla.zapier.com/api/v1";
pub const NO_ACTIONS: &str =
    "No Zapier actions are exposed. Actions can be added at https://nla.zapier.com/";

#[derive(Debug, Deserialize)]
struct ExposedActions {
    #[serde(default)]
    results: Vec<ExposedAction>,
}

/// An action the user exposed to the API
#[derive(Debug, Clone, Deserialize)]
pub struct ExposedAction {
    pub id: String,
    #[serde(default)]
    pub description: String,
}

/// Workflow automation tool
pub struct ZapierTool {
    client: Client,
    endpoint: String,
    api_key: SecretString,
}

impl ZapierTool {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: SecretString) -> Self {
        ZapierTool {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn api_key_header(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(self.api_key.expose_secret())
            .map_err(|e| Error::Config(format!("Invalid Zapier API key format: {}", e)))?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// List the exposed actions
    pub async fn list_actions(&self) -> Result<Vec<ExposedAction>> {
        let url = format!("{}/exposed/", self.endpoint);
        let response = self
            .client
            .get(&url)
            .header("X-API-Key", self.api_key_header()?)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "Zapier action listing failed with status {}: {}",
                status, text
            )));
        }

        let body: ExposedActions = response.json().await?;
        Ok(body.results)
    }

    /// Run an exposed action with natural-language instructions
    pub async fn run_action(&self, action_id: &str, instructions: &str) -> Result<String> {
        info!("Running Zapier action {}", action_id);
        let url = format!("{}/exposed/{}/execute/", self.endpoint, action_id);
        let response = self
            .client
            .post(&url)
            .header("X-API-Key", self.api_key_header()?)
            .json(&serde_json::json!({ "instructions": instructions }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "Zapier action {} failed with status {}: {}",
                action_id, status, text
            )));
        }

        let body: Value = response.json().await?;
        if let Some(error) = body.get("error").and_then(|v| v.as_str()) {
            return Err(Error::Tool(format!("Zapier action {} failed: {}", action_id, error)));
        }
        Ok(match body.get("result") {
            Some(Value::String(text)) => text.clone(),
            Some(result) => result.to_string(),
            None => body.to_string(),
        })
    }
}

/// Split `<action id>: <instructions>`; ids never contain whitespace
fn parse_command(query: &str) -> Option<(&str, &str)> {
    let (id, instructions) = query.split_once(':')?;
    let id = id.trim();
    let instructions = instructions.trim();
    if id.is_empty() || instructions.is_empty() || id.contains(char::is_whitespace) {
        return None;
    }
    Some((id, instructions))
}

fn render_actions(actions: &[ExposedAction]) -> String {
    let mut out = String::from("Available Zapier actions (input '<action id>: <instructions>'):");
    for action in actions {
        out.push_str(&format!("\n- {}: {}", action.id, action.description));
    }
    out
}

#[async_trait]
impl Tool for ZapierTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    async fn invoke(&self, query: &str) -> Result<String> {
        if let Some((id, instructions)) = parse_command(query) {
            return self.run_action(id, instructions).await;
        }

        debug!("Zapier query is not an action command, listing actions");
        let actions = self.list_actions().await?;
        if actions.is_empty() {
            return Ok(NO_ACTIONS.to_string());
        }
        Ok(render_actions(&actions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_command() {
        assert_eq!(
            parse_command("01GX: email Bob that I am late"),
            Some(("01GX", "email Bob that I am late"))
        );
        assert_eq!(parse_command("send an email: now"), None);
        assert_eq!(parse_command("list actions"), None);
        assert_eq!(parse_command("01GX:"), None);
    }

    #[tokio::test]
    async fn test_lists_actions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/exposed/"))
            .and(header("x-api-key", "nla"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"id": "01GX", "description": "Gmail: Send Email"}]
            })))
            .mount(&server)
            .await;

        let tool = ZapierTool::new(Client::new(), server.uri(), "nla".to_string().into());
        let text = tool.invoke("what can you do").await.unwrap();
        assert!(text.contains("- 01GX: Gmail: Send Email"));
    }

    #[tokio::test]
    async fn test_no_actions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/exposed/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .mount(&server)
            .await;

        let tool = ZapierTool::new(Client::new(), server.uri(), "nla".to_string().into());
        assert_eq!(tool.invoke("anything").await.unwrap(), NO_ACTIONS);
    }

    #[tokio::test]
    async fn test_runs_action() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/exposed/01GX/execute/"))
            .and(body_json(json!({"instructions": "email Bob that I am late"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "result": "Email sent to Bob."
            })))
            .mount(&server)
            .await;

        let tool = ZapierTool::new(Client::new(), server.uri(), "nla".to_string().into());
        assert_eq!(
            tool.invoke("01GX: email Bob that I am late").await.unwrap(),
            "Email sent to Bob."
        );
    }
}
