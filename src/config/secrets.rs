//! Secrets - credentials for the external collaborators
//!
//! Values are held as `SecretString` so they never show up in `Debug`
//! output or logs.

use std::collections::HashMap;

use secrecy::SecretString;

use crate::error::{Error, Result};

/// A credential known to Alfred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SecretKey {
    OpenAiApiKey,
    GoogleApiKey,
    GoogleCseId,
    WolframAlphaAppId,
    OpenWeatherMapApiKey,
    ZapierNlaApiKey,
    PineconeApiKey,
}

impl SecretKey {
    /// Every known secret, in the order the editor lists them
    pub const ALL: [SecretKey; 7] = [
        SecretKey::OpenAiApiKey,
        SecretKey::GoogleApiKey,
        SecretKey::GoogleCseId,
        SecretKey::WolframAlphaAppId,
        SecretKey::OpenWeatherMapApiKey,
        SecretKey::ZapierNlaApiKey,
        SecretKey::PineconeApiKey,
    ];

    /// Variable name in the secrets file and process environment
    pub fn env_name(&self) -> &'static str {
        match self {
            SecretKey::OpenAiApiKey => "OPENAI_API_KEY",
            SecretKey::GoogleApiKey => "GOOGLE_API_KEY",
            SecretKey::GoogleCseId => "GOOGLE_CSE_ID",
            SecretKey::WolframAlphaAppId => "WOLFRAM_ALPHA_APPID",
            SecretKey::OpenWeatherMapApiKey => "OPENWEATHERMAP_API_KEY",
            SecretKey::ZapierNlaApiKey => "ZAPIER_NLA_API_KEY",
            SecretKey::PineconeApiKey => "PINE_API_KEY",
        }
    }

    /// Human-readable label
    pub fn display_name(&self) -> &'static str {
        match self {
            SecretKey::OpenAiApiKey => "OpenAI API Key",
            SecretKey::GoogleApiKey => "Google API Key",
            SecretKey::GoogleCseId => "Google CSE ID",
            SecretKey::WolframAlphaAppId => "Wolfram Alpha App ID",
            SecretKey::OpenWeatherMapApiKey => "OpenWeatherMap API Key",
            SecretKey::ZapierNlaApiKey => "Zapier NLA API Key",
            SecretKey::PineconeApiKey => "Pine API Key",
        }
    }

    /// Look a key up by its variable name
    pub fn from_env_name(name: &str) -> Option<SecretKey> {
        Self::ALL.iter().copied().find(|k| k.env_name() == name)
    }
}

impl std::fmt::Display for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.env_name())
    }
}

/// Loaded credentials. Blank values count as absent.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    values: HashMap<SecretKey, SecretString>,
}

impl Secrets {
    /// Create an empty secret set
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect known keys from `(name, value)` pairs; unknown names are ignored
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut secrets = Self::new();
        for (name, value) in pairs {
            if let Some(key) = SecretKey::from_env_name(name.as_ref()) {
                secrets.insert(key, value);
            }
        }
        secrets
    }

    /// Set a secret, replacing any previous value
    pub fn insert(&mut self, key: SecretKey, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            self.values.remove(&key);
        } else {
            self.values.insert(key, SecretString::from(value));
        }
    }

    /// Builder-style insert
    pub fn with(mut self, key: SecretKey, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a secret
    pub fn get(&self, key: SecretKey) -> Option<&SecretString> {
        self.values.get(&key)
    }

    /// Whether a non-blank value is present
    pub fn contains(&self, key: SecretKey) -> bool {
        self.values.contains_key(&key)
    }

    /// Get a secret or fail with a configuration error
    pub fn require(&self, key: SecretKey) -> Result<&SecretString> {
        self.get(key).ok_or_else(|| {
            Error::Config(format!("{} ({}) is required", key.env_name(), key.display_name()))
        })
    }

    /// An owned copy of a required secret, still redacted
    pub fn secret(&self, key: SecretKey) -> Result<SecretString> {
        Ok(self.require(key)?.clone())
    }

    /// Keys that are present
    pub fn keys(&self) -> Vec<SecretKey> {
        let mut keys: Vec<_> = self.values.keys().copied().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_ignores_unknown_and_blank() {
        let secrets = Secrets::from_pairs(vec![
            ("OPENAI_API_KEY", "sk-test"),
            ("GOOGLE_API_KEY", "   "),
            ("SOMETHING_ELSE", "x"),
        ]);

        assert!(secrets.contains(SecretKey::OpenAiApiKey));
        assert!(!secrets.contains(SecretKey::GoogleApiKey));
        assert_eq!(secrets.keys(), vec![SecretKey::OpenAiApiKey]);
    }

    #[test]
    fn test_debug_redacts_values() {
        let secrets = Secrets::new().with(SecretKey::OpenAiApiKey, "sk-very-secret");
        let rendered = format!("{:?}", secrets);
        assert!(!rendered.contains("sk-very-secret"));
    }

    #[test]
    fn test_require_names_missing_key() {
        let err = Secrets::new().require(SecretKey::PineconeApiKey).unwrap_err();
        assert!(err.to_string().contains("PINE_API_KEY"));
    }
}
