//! Tools module - capabilities the agent can call
//!
//! Each tool is a self-contained module that implements the `Tool` trait.
//! `ToolRegistry::build` registers the ones enabled in `[tools]`, in a fixed
//! priority order, and exposes them to the model for function calling.
//!
//! ## Built-in Tools
//!
//! - **Search**: Google Custom Search (requires API key and engine id)
//! - **Wikipedia**: MediaWiki lookup, summarised by the chat model
//! - **Calculator**: local arithmetic
//! - **Wolfram Alpha**: Short Answers API (requires app id)
//! - **Weather**: OpenWeatherMap (requires API key)
//! - **Zapier**: Natural Language Actions (requires API key)
//! - **Vector retrieval**: question answering over a Pinecone index
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `src/tools/` (e.g., `my_tool.rs`)
//! 2. Implement the `Tool` trait
//! 3. Add a `ToolKind`, its flag and a row in the registry's capability table

mod calculator;
mod registry;
mod retrieval;
mod search;
mod traits;
mod weather;
mod wikipedia;
mod wolfram;
mod zapier;

// Core trait and types
pub use traits::{
    function_name, is_valid_function_name, query_schema, Tool, ToolCall, MAX_FUNCTION_NAME_LEN,
};

// Registry
pub use registry::{Endpoints, ToolContext, ToolDescriptor, ToolRegistry};

// Built-in tools
pub use calculator::{evaluate, format_number, CalcError, CalculatorTool};
pub use retrieval::RetrievalTool;
pub use search::SearchTool;
pub use weather::WeatherTool;
pub use wikipedia::{WikiPage, WikipediaTool};
pub use wolfram::WolframAlphaTool;
pub use zapier::{ExposedAction, ZapierTool};

#[cfg(test)]
pub(crate) use registry::test_support;
