//! Configuration module
//!
//! - types/: `Settings` and its sections (`[settings]`, `[tools]`, `[pinecone]`, `[voice]`, `[model]`)
//! - secrets.rs: credentials for the external collaborators
//! - io.rs: layered loading (settings file, env overrides, secrets file, env secrets)
//! - validation.rs: cross-checks between tool flags and secrets
//! - paths.rs: default file locations
//! - store.rs: read/write contract used by a settings editor

mod io;
mod paths;
mod secrets;
mod store;
mod types;
mod validation;

pub use types::{GeneralSettings, Hotkey, Interface, Modifier, Settings};
pub use types::model::ModelSettings;
pub use types::tools::{PineconeSettings, ToolFlags, ToolKind};
pub use types::voice::VoiceSettings;

pub use secrets::{SecretKey, Secrets};

pub use io::{load, load_secrets, load_settings, read_env_file, ConfigSource, LoadedConfig};
pub use paths::{config_dir, secrets_path, settings_path};
pub use store::{SettingsSnapshot, SettingsStore};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};
