//! Core tool trait and result types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::types::{AssistantToolCall, FunctionDefinition, ToolDefinition};
use crate::error::Result;

/// Longest function name the chat API accepts
pub const MAX_FUNCTION_NAME_LEN: usize = 64;

/// Identifier a tool is offered under for function calling.
///
/// The chat API only accepts `[A-Za-z0-9_-]`; every other character becomes
/// `_`, so "Wolfram Alpha" is offered as `Wolfram_Alpha`.
pub fn function_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Whether `name` can be sent to the chat API unchanged
pub fn is_valid_function_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_FUNCTION_NAME_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// JSON Schema shared by every tool: a single free-text `query`
pub fn query_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "Input for the tool"
            }
        },
        "required": ["query"]
    })
}

/// A capability the agent may invoke with a text query
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name
    fn name(&self) -> &str;

    /// Get the tool description
    fn description(&self) -> &str;

    /// Get the JSON Schema for tool parameters
    fn parameters_schema(&self) -> Value {
        query_schema()
    }

    /// Run the tool. An empty lookup is a text answer, not an error.
    async fn invoke(&self, query: &str) -> Result<String>;

    /// Convert to a function-calling tool definition
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: function_name(self.name()),
                description: self.description().to_string(),
                parameters: self.parameters_schema(),
            },
        }
    }
}

/// A tool call request from the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool call ID
    pub id: String,
    /// Tool name
    pub name: String,
    /// Tool arguments as JSON
    pub arguments: Value,
}

impl ToolCall {
    /// Text passed to the tool. Arguments that are not a JSON object with a
    /// `query` string are used verbatim.
    pub fn query(&self) -> String {
        match self.arguments.get("query").and_then(|v| v.as_str()) {
            Some(query) => query.to_string(),
            None => match &self.arguments {
                Value::String(raw) => raw.clone(),
                other => other.to_string(),
            },
        }
    }
}

impl From<&AssistantToolCall> for ToolCall {
    fn from(call: &AssistantToolCall) -> Self {
        let arguments = serde_json::from_str(&call.function.arguments)
            .unwrap_or_else(|_| Value::String(call.function.arguments.clone()));
        ToolCall {
            id: call.id.clone(),
            name: call.function.name.clone(),
            arguments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::types::FunctionCall;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "Echo Tool"
        }

        fn description(&self) -> &str {
            "Repeats the query"
        }

        async fn invoke(&self, query: &str) -> Result<String> {
            Ok(query.to_string())
        }
    }

    #[test]
    fn test_function_name_is_api_safe() {
        assert_eq!(function_name("Wolfram Alpha"), "Wolfram_Alpha");
        assert_eq!(function_name("Home Notes (2024)"), "Home_Notes__2024_");
        assert_eq!(function_name("Calculator"), "Calculator");
        assert_eq!(function_name("Café"), "Caf_");
        assert!(is_valid_function_name("Wolfram_Alpha"));
        assert!(!is_valid_function_name("Wolfram Alpha"));
        assert!(!is_valid_function_name(""));
        assert!(!is_valid_function_name(&"a".repeat(65)));
    }

    #[test]
    fn test_tool_call_query_from_raw_arguments() {
        let call = AssistantToolCall {
            id: "call_1".to_string(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: "Calculator".to_string(),
                arguments: "2+2".to_string(),
            },
        };
        assert_eq!(ToolCall::from(&call).query(), "2+2");

        let call = AssistantToolCall {
            function: FunctionCall {
                name: "Calculator".to_string(),
                arguments: r#"{"query":"3*3"}"#.to_string(),
            },
            ..call
        };
        assert_eq!(ToolCall::from(&call).query(), "3*3");
    }

    #[test]
    fn test_definition_has_query_parameter() {
        let definition = Echo.to_definition();
        assert_eq!(definition.function.name, "Echo_Tool");
        assert_eq!(definition.function.parameters["required"][0], "query");
    }
}
