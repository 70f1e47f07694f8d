//! # Alfred
//!
//! A voice and text assistant front-end built with Rust.
//!
//! ## Features
//!
//! - **Activation:** a hotkey press or a spoken wake word, whichever comes first
//! - **Tool-calling agent:** OpenAI chat completions with search, encyclopedia,
//!   calculator, knowledge engine, weather, workflow and vector retrieval tools
//! - **Fault-isolated turns:** a failed turn is answered with an apology, a full
//!   context window clears the memory, the session carries on
//! - **Text or voice:** typed input with printed replies, or recorded speech
//!   with spoken replies

pub mod agent;
pub mod channels;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod tools;

pub use config::Settings;
pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
