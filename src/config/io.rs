//! Configuration I/O - Loading settings and secrets
//!
//! Layered precedence, lowest first:
//! 1. `settings.ini`
//! 2. `ALFRED_<SECTION>__<KEY>` environment overrides
//! 3. the `.env` secrets file
//! 4. secret keys set in the process environment
//!
//! The environment is captured in [`ConfigSource`], so loading is a pure read
//! and never mutates the process environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Environment, File, FileFormat};
use tracing::{debug, info, warn};

use super::secrets::{SecretKey, Secrets};
use super::types::Settings;
use super::validation::validate_config;
use crate::error::{Error, Result};

/// Prefix of environment variables that override settings
pub const ENV_PREFIX: &str = "ALFRED";

/// Separator between section and key in override variables
pub const ENV_SEPARATOR: &str = "__";

/// Where configuration is read from
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Settings INI file
    pub settings_path: PathBuf,
    /// Secrets file (optional; secrets may come from the environment alone)
    pub secrets_path: Option<PathBuf>,
    /// Captured environment variables
    pub env: HashMap<String, String>,
}

impl ConfigSource {
    /// A source with an empty environment overlay
    pub fn new(settings_path: impl Into<PathBuf>, secrets_path: Option<PathBuf>) -> Self {
        ConfigSource {
            settings_path: settings_path.into(),
            secrets_path,
            env: HashMap::new(),
        }
    }

    /// A source overlaid with the current process environment. Variables
    /// that are not valid UTF-8 are skipped.
    pub fn from_process(settings_path: impl Into<PathBuf>, secrets_path: Option<PathBuf>) -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)));
        Self::new(settings_path, secrets_path).with_env(vars)
    }

    /// Replace the environment overlay
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }
}

/// Validated settings and secrets
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub settings: Settings,
    pub secrets: Secrets,
}

/// Load and validate configuration.
///
/// Fails with [`Error::Config`] when the settings file is missing or malformed,
/// a tool flag is absent, or an enabled tool lacks one of its secrets.
pub fn load(source: &ConfigSource) -> Result<LoadedConfig> {
    let settings = load_settings(source)?;
    let secrets = load_secrets(source)?;

    let result = validate_config(&settings, &secrets);
    for issue in &result.warnings {
        warn!("Configuration warning: {}", issue);
    }
    if !result.valid {
        return Err(Error::Config(result.error_summary()));
    }

    info!(
        bot_name = %settings.general.bot_name,
        interface = %settings.general.interface,
        tools = settings.tools.enabled().len(),
        "Configuration loaded from {}",
        source.settings_path.display()
    );

    Ok(LoadedConfig { settings, secrets })
}

/// Load the settings file with its environment overrides
pub fn load_settings(source: &ConfigSource) -> Result<Settings> {
    let path = &source.settings_path;
    if !path.exists() {
        return Err(Error::Config(format!(
            "Settings file not found: {}",
            path.display()
        )));
    }

    // Only section-qualified variables take part; ALFRED_SETTINGS and
    // friends name files, not values.
    let overrides: config::Map<String, String> = source
        .env
        .iter()
        .filter(|(key, _)| is_settings_override(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    debug!("Applying {} settings override(s) from the environment", overrides.len());

    let settings = config::Config::builder()
        .add_source(File::from(path.as_path()).format(FileFormat::Ini).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .source(Some(overrides)),
        )
        .build()
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?
        .try_deserialize::<Settings>()
        .map_err(|e| Error::Config(format!("Invalid settings in {}: {}", path.display(), e)))?;

    Ok(settings)
}

/// Load secrets from the secrets file, then the captured environment
pub fn load_secrets(source: &ConfigSource) -> Result<Secrets> {
    let mut secrets = match source.secrets_path {
        Some(ref path) if path.exists() => read_secrets_file(path)?,
        Some(ref path) => {
            debug!("No secrets file at {}", path.display());
            Secrets::new()
        }
        None => Secrets::new(),
    };

    for key in SecretKey::ALL {
        if let Some(value) = source.env.get(key.env_name()) {
            if !value.trim().is_empty() {
                secrets.insert(key, value.clone());
            }
        }
    }

    Ok(secrets)
}

/// Read `KEY=value` pairs from a dotenv file without touching the environment
pub fn read_env_file(path: &Path) -> Result<Vec<(String, String)>> {
    let iter = dotenvy::from_path_iter(path).map_err(|e| {
        Error::Config(format!("Failed to read secrets file {}: {}", path.display(), e))
    })?;

    iter.map(|item| {
        item.map_err(|e| {
            Error::Config(format!("Invalid line in secrets file {}: {}", path.display(), e))
        })
    })
    .collect()
}

fn read_secrets_file(path: &Path) -> Result<Secrets> {
    Ok(Secrets::from_pairs(read_env_file(path)?))
}

fn is_settings_override(key: &str) -> bool {
    key.get(..ENV_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(ENV_PREFIX))
        && key[ENV_PREFIX.len()..].starts_with('_')
        && key.len() > ENV_PREFIX.len() + 1
        && key.contains(ENV_SEPARATOR)
}
