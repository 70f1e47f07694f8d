//! Settings store - the storage contract behind a settings editor
//!
//! `read_all` returns the raw settings sections and secrets; `write_all`
//! persists them. Nothing is validated here: the next [`load`](super::load)
//! does that, and a changed configuration takes effect on restart.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{File, FileFormat};
use tracing::info;

use super::io::read_env_file;
use crate::error::{Error, Result};

/// Raw settings sections and secret values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsSnapshot {
    /// `section -> key -> value`
    pub sections: BTreeMap<String, BTreeMap<String, String>>,
    /// `NAME -> value`
    pub secrets: BTreeMap<String, String>,
}

impl SettingsSnapshot {
    /// Get a settings value
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(key))
            .map(|v| v.as_str())
    }

    /// Set a settings value
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Set a secret value
    pub fn set_secret(&mut self, name: &str, value: impl Into<String>) {
        self.secrets.insert(name.to_string(), value.into());
    }
}

/// File-backed settings and secrets storage
#[derive(Debug, Clone)]
pub struct SettingsStore {
    settings_path: PathBuf,
    secrets_path: PathBuf,
}

impl SettingsStore {
    /// Create a store over the given files
    pub fn new(settings_path: impl Into<PathBuf>, secrets_path: impl Into<PathBuf>) -> Self {
        SettingsStore {
            settings_path: settings_path.into(),
            secrets_path: secrets_path.into(),
        }
    }

    /// Settings file path
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Secrets file path
    pub fn secrets_path(&self) -> &Path {
        &self.secrets_path
    }

    /// Read both files as they are on disk
    pub fn read_all(&self) -> Result<SettingsSnapshot> {
        let sections = if self.settings_path.exists() {
            config::Config::builder()
                .add_source(File::from(self.settings_path.as_path()).format(FileFormat::Ini))
                .build()?
                .try_deserialize::<BTreeMap<String, BTreeMap<String, String>>>()?
        } else {
            BTreeMap::new()
        };

        let secrets = if self.secrets_path.exists() {
            read_env_file(&self.secrets_path)?.into_iter().collect()
        } else {
            BTreeMap::new()
        };

        Ok(SettingsSnapshot { sections, secrets })
    }

    /// Persist a snapshot.
    ///
    /// The settings file is rewritten whole. In the secrets file, lines that
    /// assign a known key are replaced in place and other lines are kept;
    /// keys that had no line are appended.
    pub fn write_all(&self, snapshot: &SettingsSnapshot) -> Result<()> {
        write_file(&self.settings_path, &render_ini(&snapshot.sections))?;

        let existing = if self.secrets_path.exists() {
            std::fs::read_to_string(&self.secrets_path)?
        } else {
            String::new()
        };
        write_file(&self.secrets_path, &update_env_lines(&existing, &snapshot.secrets))?;

        info!(
            "Settings saved to {} and {}; restart to apply",
            self.settings_path.display(),
            self.secrets_path.display()
        );
        Ok(())
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content).map_err(Error::Io)
}

fn render_ini(sections: &BTreeMap<String, BTreeMap<String, String>>) -> String {
    let mut out = String::new();
    for (name, entries) in sections {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("[{}]\n", name));
        for (key, value) in entries {
            out.push_str(&format!("{} = {}\n", key, value));
        }
    }
    out
}

fn update_env_lines(existing: &str, values: &BTreeMap<String, String>) -> String {
    let mut written = std::collections::HashSet::new();
    let mut out = String::new();

    for line in existing.lines() {
        let assigned = line
            .split_once('=')
            .map(|(key, _)| key.trim())
            .filter(|key| values.contains_key(*key));

        match assigned {
            Some(key) => {
                out.push_str(&format!("{}={}\n", key, values[key]));
                written.insert(key.to_string());
            }
            None => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }

    for (key, value) in values {
        if !written.contains(key) {
            out.push_str(&format!("{}={}\n", key, value));
        }
    }

    out
}
