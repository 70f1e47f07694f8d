//! Tool registry - the tools offered to the agent, built from settings

use std::sync::Arc;

use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};

use super::calculator::CalculatorTool;
use super::retrieval::{self, RetrievalTool};
use super::search::{self, SearchTool};
use super::traits::{function_name, Tool, ToolCall};
use super::weather::{self, WeatherTool};
use super::wikipedia::{self, WikipediaTool};
use super::wolfram::{self, WolframAlphaTool};
use super::zapier::{self, ZapierTool};
use crate::agent::client::{ChatModel, Embedder};
use crate::agent::types::ToolDefinition;
use crate::config::{SecretKey, Secrets, Settings, ToolKind};
use crate::error::{Error, Result};

/// Base URLs of the external tool APIs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub google_search: String,
    pub wikipedia: String,
    pub wolfram_alpha: String,
    pub weather: String,
    pub zapier: String,
    /// May contain `{env}`
    pub pinecone_controller: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            google_search: search::DEFAULT_ENDPOINT.to_string(),
            wikipedia: wikipedia::DEFAULT_ENDPOINT.to_string(),
            wolfram_alpha: wolfram::DEFAULT_ENDPOINT.to_string(),
            weather: weather::DEFAULT_ENDPOINT.to_string(),
            zapier: zapier::DEFAULT_ENDPOINT.to_string(),
            pinecone_controller: retrieval::DEFAULT_CONTROLLER.to_string(),
        }
    }
}

/// Shared collaborators handed to tool factories
#[derive(Clone)]
pub struct ToolContext {
    pub http: Client,
    pub chat: Arc<dyn ChatModel>,
    pub embedder: Arc<dyn Embedder>,
    pub endpoints: Endpoints,
}

impl ToolContext {
    pub fn new(http: Client, chat: Arc<dyn ChatModel>, embedder: Arc<dyn Embedder>) -> Self {
        ToolContext {
            http,
            chat,
            embedder,
            endpoints: Endpoints::default(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}

type Factory = fn(&Settings, &Secrets, &ToolContext) -> Result<Arc<dyn Tool>>;

/// One row of the capability table
struct Capability {
    kind: ToolKind,
    factory: Factory,
}

/// Capabilities in priority order
const CAPABILITIES: &[Capability] = &[
    Capability { kind: ToolKind::Search, factory: search_tool },
    Capability { kind: ToolKind::Encyclopedia, factory: wikipedia_tool },
    Capability { kind: ToolKind::Calculator, factory: calculator_tool },
    Capability { kind: ToolKind::KnowledgeEngine, factory: wolfram_tool },
    Capability { kind: ToolKind::Weather, factory: weather_tool },
    Capability { kind: ToolKind::WorkflowAutomation, factory: zapier_tool },
    Capability { kind: ToolKind::VectorRetrieval, factory: retrieval_tool },
];

fn search_tool(_: &Settings, secrets: &Secrets, ctx: &ToolContext) -> Result<Arc<dyn Tool>> {
    Ok(Arc::new(SearchTool::new(
        ctx.http.clone(),
        ctx.endpoints.google_search.clone(),
        secrets.secret(SecretKey::GoogleApiKey)?,
        secrets.secret(SecretKey::GoogleCseId)?,
    )))
}

fn wikipedia_tool(_: &Settings, _: &Secrets, ctx: &ToolContext) -> Result<Arc<dyn Tool>> {
    Ok(Arc::new(WikipediaTool::new(
        ctx.http.clone(),
        ctx.endpoints.wikipedia.clone(),
        ctx.chat.clone(),
    )))
}

fn calculator_tool(_: &Settings, _: &Secrets, _: &ToolContext) -> Result<Arc<dyn Tool>> {
    Ok(Arc::new(CalculatorTool::new()))
}

fn wolfram_tool(_: &Settings, secrets: &Secrets, ctx: &ToolContext) -> Result<Arc<dyn Tool>> {
    Ok(Arc::new(WolframAlphaTool::new(
        ctx.http.clone(),
        ctx.endpoints.wolfram_alpha.clone(),
        secrets.secret(SecretKey::WolframAlphaAppId)?,
    )))
}

fn weather_tool(_: &Settings, secrets: &Secrets, ctx: &ToolContext) -> Result<Arc<dyn Tool>> {
    Ok(Arc::new(WeatherTool::new(
        ctx.http.clone(),
        ctx.endpoints.weather.clone(),
        secrets.secret(SecretKey::OpenWeatherMapApiKey)?,
    )))
}

fn zapier_tool(_: &Settings, secrets: &Secrets, ctx: &ToolContext) -> Result<Arc<dyn Tool>> {
    Ok(Arc::new(ZapierTool::new(
        ctx.http.clone(),
        ctx.endpoints.zapier.clone(),
        secrets.secret(SecretKey::ZapierNlaApiKey)?,
    )))
}

fn retrieval_tool(settings: &Settings, secrets: &Secrets, ctx: &ToolContext) -> Result<Arc<dyn Tool>> {
    Ok(Arc::new(RetrievalTool::new(
        ctx.http.clone(),
        &ctx.endpoints.pinecone_controller,
        secrets.secret(SecretKey::PineconeApiKey)?,
        settings.pinecone.clone(),
        ctx.chat.clone(),
        ctx.embedder.clone(),
    )))
}

/// Name and description of a registered tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
}

/// Registry of available tools, in registration order
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        ToolRegistry { tools: Vec::new() }
    }

    /// Build the registry for the enabled tool flags.
    ///
    /// Each enabled capability contributes exactly one tool, in priority
    /// order. A missing secret or a duplicate tool name is a configuration
    /// error.
    pub fn build(settings: &Settings, secrets: &Secrets, ctx: &ToolContext) -> Result<Self> {
        let mut registry = ToolRegistry::new();

        for capability in CAPABILITIES {
            if !settings.tools.is_enabled(capability.kind) {
                continue;
            }
            for key in capability.kind.required_secrets() {
                if !secrets.contains(*key) {
                    return Err(Error::Config(format!(
                        "{} is enabled but {} is not set",
                        capability.kind,
                        key.env_name()
                    )));
                }
            }
            registry.register((capability.factory)(settings, secrets, ctx)?)?;
        }

        if registry.is_empty() {
            warn!("No tools enabled; the agent will answer from the model alone");
        }
        info!("Registered tools: {}", registry.names().join(", "));

        Ok(registry)
    }

    /// Register a tool; names and their function-calling identifiers must
    /// be unique
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let identifier = function_name(tool.name());
        let clash = self
            .tools
            .iter()
            .any(|t| t.name() == tool.name() || function_name(t.name()) == identifier);
        if clash {
            return Err(Error::Config(format!("Duplicate tool name: {}", tool.name())));
        }
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by display name or by the identifier the model calls it by
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .or_else(|| self.tools.iter().find(|t| function_name(t.name()) == name))
            .map(|t| t.as_ref())
    }

    /// Descriptors in registration order
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|t| ToolDescriptor {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    /// Get all tool definitions
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Invoke a tool by name. Always yields text for the agent.
    pub async fn invoke(&self, name: &str, query: &str) -> String {
        self.execute(&ToolCall {
            id: String::new(),
            name: name.to_string(),
            arguments: json!({ "query": query }),
        })
        .await
    }

    /// Execute a tool call. Failures become `Error: ...` text.
    pub async fn execute(&self, call: &ToolCall) -> String {
        let Some(tool) = self.get(&call.name) else {
            return format!("Error: Unknown tool: {}", call.name);
        };

        let query = call.query();
        match tool.invoke(&query).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Tool {} failed: {}", call.name, e);
                format!("Error: {}", e)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// List tool names
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.names()).finish()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::offline_context;
    use super::*;
    use crate::config::test_support::sample_settings;
    use crate::config::ToolFlags;
    use crate::tools::traits::is_valid_function_name;
    use async_trait::async_trait;

    struct Labelled;

    #[async_trait]
    impl Tool for Labelled {
        fn name(&self) -> &str {
            "Pocket Calculator"
        }

        fn description(&self) -> &str {
            "Echoes its label"
        }

        async fn invoke(&self, query: &str) -> Result<String> {
            Ok(format!("Pocket Calculator: {}", query))
        }
    }

    fn all_secrets() -> Secrets {
        SecretKey::ALL
            .iter()
            .fold(Secrets::new(), |secrets, key| secrets.with(*key, "secret"))
    }

    #[test]
    fn test_build_sample_registry() {
        let registry =
            ToolRegistry::build(&sample_settings(), &Secrets::new(), &offline_context()).unwrap();
        assert_eq!(registry.names(), vec!["Wikipedia", "Calculator"]);
        assert_eq!(registry.definitions().len(), 2);
    }

    #[test]
    fn test_priority_order_and_one_descriptor_each() {
        let mut settings = sample_settings();
        for kind in ToolKind::ALL {
            settings.tools.set(kind, true);
        }
        settings.pinecone.pinecone_index = "notes".into();
        settings.pinecone.pinecone_env = "env".into();
        settings.pinecone.tool_name = "Notes".into();
        settings.pinecone.tool_description = "Household notes".into();

        let registry = ToolRegistry::build(&settings, &all_secrets(), &offline_context()).unwrap();
        assert_eq!(
            registry.names(),
            vec!["Search", "Wikipedia", "Calculator", "Wolfram Alpha", "Weather", "Zapier", "Notes"]
        );
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let settings = sample_settings();
        let ctx = offline_context();
        let first = ToolRegistry::build(&settings, &all_secrets(), &ctx).unwrap();
        let second = ToolRegistry::build(&settings, &all_secrets(), &ctx).unwrap();
        assert_eq!(first.descriptors(), second.descriptors());
    }

    #[test]
    fn test_missing_secret_is_config_error() {
        let mut settings = sample_settings();
        settings.tools = ToolFlags::only(ToolKind::Weather);

        let err = ToolRegistry::build(&settings, &Secrets::new(), &offline_context()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("OPENWEATHERMAP_API_KEY"));
    }

    #[test]
    fn test_duplicate_name_is_config_error() {
        let mut settings = sample_settings();
        settings.tools.set(ToolKind::VectorRetrieval, true);
        settings.pinecone.pinecone_index = "notes".into();
        settings.pinecone.pinecone_env = "env".into();
        settings.pinecone.tool_name = "Calculator".into();
        settings.pinecone.tool_description = "Shadows the calculator".into();

        let err = ToolRegistry::build(&settings, &all_secrets(), &offline_context()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Duplicate tool name"));
    }

    #[test]
    fn test_definition_names_are_api_safe() {
        let mut settings = sample_settings();
        for kind in ToolKind::ALL {
            settings.tools.set(kind, true);
        }
        settings.pinecone.pinecone_index = "notes".into();
        settings.pinecone.pinecone_env = "env".into();
        settings.pinecone.tool_name = "Home Notes".into();
        settings.pinecone.tool_description = "Household notes".into();

        let registry = ToolRegistry::build(&settings, &all_secrets(), &offline_context()).unwrap();
        for definition in registry.definitions() {
            assert!(
                is_valid_function_name(&definition.function.name),
                "{:?} is not a valid function name",
                definition.function.name
            );
        }
        let names: Vec<_> = registry.definitions().into_iter().map(|d| d.function.name).collect();
        assert!(names.contains(&"Wolfram_Alpha".to_string()));
        assert!(names.contains(&"Home_Notes".to_string()));
    }

    #[test]
    fn test_identifier_clash_is_duplicate() {
        let mut settings = sample_settings();
        settings.tools = ToolFlags::only(ToolKind::KnowledgeEngine);
        settings.tools.set(ToolKind::VectorRetrieval, true);
        settings.pinecone.pinecone_index = "notes".into();
        settings.pinecone.pinecone_env = "env".into();
        settings.pinecone.tool_name = "Wolfram_Alpha".into();
        settings.pinecone.tool_description = "Clashes once sanitised".into();

        let err = ToolRegistry::build(&settings, &all_secrets(), &offline_context()).unwrap_err();
        assert!(err.to_string().contains("Duplicate tool name"));
    }

    #[tokio::test]
    async fn test_call_by_function_identifier() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Labelled)).unwrap();

        let call = ToolCall {
            id: "call_1".to_string(),
            name: "Pocket_Calculator".to_string(),
            arguments: json!({ "query": "1+1" }),
        };
        assert_eq!(registry.execute(&call).await, "Pocket Calculator: 1+1");
        assert_eq!(registry.invoke("Pocket Calculator", "3").await, "Pocket Calculator: 3");
    }

    #[tokio::test]
    async fn test_invoke_always_returns_text() {
        let registry =
            ToolRegistry::build(&sample_settings(), &Secrets::new(), &offline_context()).unwrap();

        assert_eq!(registry.invoke("Calculator", "2+2").await, "4");
        assert_eq!(
            registry.invoke("Teleporter", "home").await,
            "Error: Unknown tool: Teleporter"
        );
    }
}
