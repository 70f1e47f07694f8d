//! Tool configuration types
//!
//! The `[tools]` flags and the `[pinecone]` retrieval backend section.

use serde::{Deserialize, Serialize};

use crate::config::secrets::SecretKey;

/// Per-tool enabled flags. Every flag must be present in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFlags {
    /// Web search
    pub enable_search: bool,
    /// Encyclopedia lookup
    pub enable_wikipedia: bool,
    /// Calculator
    pub enable_calculator: bool,
    /// Knowledge-engine query
    pub enable_wolfram_alpha: bool,
    /// Weather lookup
    pub enable_weather: bool,
    /// Workflow-automation actions
    pub enable_zapier: bool,
    /// Vector-index retrieval QA
    pub enable_pinecone: bool,
}

impl ToolFlags {
    /// All flags off
    pub fn none() -> Self {
        ToolFlags {
            enable_search: false,
            enable_wikipedia: false,
            enable_calculator: false,
            enable_wolfram_alpha: false,
            enable_weather: false,
            enable_zapier: false,
            enable_pinecone: false,
        }
    }

    /// Flags with a single capability switched on
    pub fn only(kind: ToolKind) -> Self {
        let mut flags = Self::none();
        flags.set(kind, true);
        flags
    }

    /// Whether a capability is enabled
    pub fn is_enabled(&self, kind: ToolKind) -> bool {
        match kind {
            ToolKind::Search => self.enable_search,
            ToolKind::Encyclopedia => self.enable_wikipedia,
            ToolKind::Calculator => self.enable_calculator,
            ToolKind::KnowledgeEngine => self.enable_wolfram_alpha,
            ToolKind::Weather => self.enable_weather,
            ToolKind::WorkflowAutomation => self.enable_zapier,
            ToolKind::VectorRetrieval => self.enable_pinecone,
        }
    }

    /// Switch a capability on or off
    pub fn set(&mut self, kind: ToolKind, enabled: bool) {
        let flag = match kind {
            ToolKind::Search => &mut self.enable_search,
            ToolKind::Encyclopedia => &mut self.enable_wikipedia,
            ToolKind::Calculator => &mut self.enable_calculator,
            ToolKind::KnowledgeEngine => &mut self.enable_wolfram_alpha,
            ToolKind::Weather => &mut self.enable_weather,
            ToolKind::WorkflowAutomation => &mut self.enable_zapier,
            ToolKind::VectorRetrieval => &mut self.enable_pinecone,
        };
        *flag = enabled;
    }

    /// Enabled capabilities in registry priority order
    pub fn enabled(&self) -> Vec<ToolKind> {
        ToolKind::ALL
            .iter()
            .copied()
            .filter(|kind| self.is_enabled(*kind))
            .collect()
    }
}

/// A capability the registry can offer to the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Search,
    Encyclopedia,
    Calculator,
    KnowledgeEngine,
    Weather,
    WorkflowAutomation,
    VectorRetrieval,
}

impl ToolKind {
    /// Every capability, in registry priority order
    pub const ALL: [ToolKind; 7] = [
        ToolKind::Search,
        ToolKind::Encyclopedia,
        ToolKind::Calculator,
        ToolKind::KnowledgeEngine,
        ToolKind::Weather,
        ToolKind::WorkflowAutomation,
        ToolKind::VectorRetrieval,
    ];

    /// Name of the `[tools]` flag that enables this capability
    pub fn flag_name(&self) -> &'static str {
        match self {
            ToolKind::Search => "enable_search",
            ToolKind::Encyclopedia => "enable_wikipedia",
            ToolKind::Calculator => "enable_calculator",
            ToolKind::KnowledgeEngine => "enable_wolfram_alpha",
            ToolKind::Weather => "enable_weather",
            ToolKind::WorkflowAutomation => "enable_zapier",
            ToolKind::VectorRetrieval => "enable_pinecone",
        }
    }

    /// Secrets the capability cannot run without
    pub fn required_secrets(&self) -> &'static [SecretKey] {
        match self {
            ToolKind::Search => &[SecretKey::GoogleApiKey, SecretKey::GoogleCseId],
            ToolKind::Encyclopedia => &[],
            ToolKind::Calculator => &[],
            ToolKind::KnowledgeEngine => &[SecretKey::WolframAlphaAppId],
            ToolKind::Weather => &[SecretKey::OpenWeatherMapApiKey],
            ToolKind::WorkflowAutomation => &[SecretKey::ZapierNlaApiKey],
            ToolKind::VectorRetrieval => &[SecretKey::PineconeApiKey, SecretKey::OpenAiApiKey],
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ToolKind::Search => "web search",
            ToolKind::Encyclopedia => "encyclopedia",
            ToolKind::Calculator => "calculator",
            ToolKind::KnowledgeEngine => "knowledge engine",
            ToolKind::Weather => "weather",
            ToolKind::WorkflowAutomation => "workflow automation",
            ToolKind::VectorRetrieval => "vector retrieval",
        };
        write!(f, "{}", name)
    }
}

/// Pinecone retrieval backend settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PineconeSettings {
    /// Index to query
    #[serde(default)]
    pub pinecone_index: String,
    /// Pinecone environment, e.g. `us-west1-gcp`
    #[serde(default)]
    pub pinecone_env: String,
    /// Tool name offered to the agent
    #[serde(default)]
    pub tool_name: String,
    /// Tool description offered to the agent
    #[serde(default)]
    pub tool_description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_follows_priority_order() {
        let mut flags = ToolFlags::none();
        flags.set(ToolKind::VectorRetrieval, true);
        flags.set(ToolKind::Search, true);
        flags.set(ToolKind::Weather, true);

        assert_eq!(
            flags.enabled(),
            vec![ToolKind::Search, ToolKind::Weather, ToolKind::VectorRetrieval]
        );
    }

    #[test]
    fn test_only() {
        let flags = ToolFlags::only(ToolKind::Calculator);
        assert_eq!(flags.enabled(), vec![ToolKind::Calculator]);
        assert!(!flags.is_enabled(ToolKind::Search));
    }
}
