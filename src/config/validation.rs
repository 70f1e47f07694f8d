//! Configuration validation
//!
//! Checks settings and secrets together. A tool flag and the secrets that tool
//! needs are independent inputs; both are required when the flag is on.

use super::secrets::{SecretKey, Secrets};
use super::types::{Interface, Settings};
use crate::tools::{function_name, MAX_FUNCTION_NAME_LEN};

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }

    /// All error messages joined into one line
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|issue| issue.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Validate settings against the loaded secrets
pub fn validate_config(settings: &Settings, secrets: &Secrets) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    result = validate_general(settings, result);
    result = validate_secrets(settings, secrets, result);
    result = validate_pinecone(settings, result);
    result = validate_voice(settings, result);

    result
}

fn validate_general(settings: &Settings, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if settings.general.bot_name.trim().is_empty() {
        result = result.with_error(ValidationIssue::new(
            "settings.bot_name",
            "Bot name must not be empty",
        ));
    }

    if let Err(e) = settings.general.parsed_hotkey() {
        result = result.with_error(
            ValidationIssue::new("settings.hotkey", e.to_string())
                .with_suggestion("Use a combination such as ctrl+shift+1"),
        );
    }

    if settings.model.memory_token_limit == 0 {
        result = result.with_error(ValidationIssue::new(
            "model.memory_token_limit",
            "Memory token limit must be greater than zero",
        ));
    }

    result
}

fn validate_secrets(
    settings: &Settings,
    secrets: &Secrets,
    mut result: ConfigValidationResult,
) -> ConfigValidationResult {
    if !secrets.contains(SecretKey::OpenAiApiKey) {
        result = result.with_error(
            ValidationIssue::new(
                SecretKey::OpenAiApiKey.env_name(),
                "The chat model API key is required",
            )
            .with_suggestion("Set OPENAI_API_KEY in the .env file or the environment"),
        );
    }

    for kind in settings.tools.enabled() {
        for key in kind.required_secrets() {
            if *key == SecretKey::OpenAiApiKey {
                // Reported once above.
                continue;
            }
            if !secrets.contains(*key) {
                result = result.with_error(
                    ValidationIssue::new(
                        key.env_name(),
                        format!("Required by the {} tool ({} = true)", kind, kind.flag_name()),
                    )
                    .with_suggestion(format!(
                        "Set {} or disable {}",
                        key.env_name(),
                        kind.flag_name()
                    )),
                );
            }
        }
    }

    result
}

fn validate_pinecone(settings: &Settings, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if !settings.tools.enable_pinecone {
        return result;
    }

    let pinecone = &settings.pinecone;
    let fields = [
        ("pinecone.pinecone_index", &pinecone.pinecone_index),
        ("pinecone.pinecone_env", &pinecone.pinecone_env),
        ("pinecone.tool_name", &pinecone.tool_name),
        ("pinecone.tool_description", &pinecone.tool_description),
    ];
    for (path, value) in fields {
        if value.trim().is_empty() {
            result = result.with_error(ValidationIssue::new(
                path,
                "Required when enable_pinecone is true",
            ));
        }
    }

    let name = pinecone.tool_name.trim();
    let identifier = function_name(name);
    if identifier.len() > MAX_FUNCTION_NAME_LEN {
        result = result.with_error(ValidationIssue::new(
            "pinecone.tool_name",
            format!("Tool name must be at most {} characters", MAX_FUNCTION_NAME_LEN),
        ));
    } else if !name.is_empty() && identifier != name {
        result = result.with_warning(
            ValidationIssue::new(
                "pinecone.tool_name",
                format!("Offered to the model as '{}'", identifier),
            )
            .with_suggestion("Use only letters, digits, '_' and '-'"),
        );
    }

    result
}

fn validate_voice(settings: &Settings, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if settings.general.interface != Interface::Voice {
        return result;
    }

    if !settings.voice.record_command.contains("{output}") {
        result = result.with_error(
            ValidationIssue::new(
                "voice.record_command",
                "Recording command must contain an {output} placeholder",
            )
            .with_suggestion("e.g. rec -q -c 1 -r 16000 {output} trim 0 {seconds}"),
        );
    }

    if settings.voice.record_seconds == 0 {
        result = result.with_error(ValidationIssue::new(
            "voice.record_seconds",
            "Recording length must be at least one second",
        ));
    }

    if settings.voice.wake_word().is_none() {
        result = result.with_warning(ValidationIssue::new(
            "voice.wake_word",
            "No wake word configured; only the hotkey starts a conversation",
        ));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::tools::ToolKind;
    use crate::config::test_support::sample_settings;

    fn base_secrets() -> Secrets {
        Secrets::new().with(SecretKey::OpenAiApiKey, "sk-test")
    }

    #[test]
    fn test_valid_minimal_config() {
        let result = validate_config(&sample_settings(), &base_secrets());
        assert!(result.valid, "{}", result.error_summary());
    }

    #[test]
    fn test_enabled_tool_requires_its_secret() {
        let mut settings = sample_settings();
        settings.tools.set(ToolKind::Weather, true);

        let result = validate_config(&settings, &base_secrets());
        assert!(!result.valid);
        assert!(result.error_summary().contains("OPENWEATHERMAP_API_KEY"));

        let secrets = base_secrets().with(SecretKey::OpenWeatherMapApiKey, "owm");
        assert!(validate_config(&settings, &secrets).valid);
    }

    #[test]
    fn test_disabled_tool_ignores_missing_secret() {
        let mut settings = sample_settings();
        settings.tools.set(ToolKind::Search, false);
        let result = validate_config(&settings, &base_secrets());
        assert!(result.valid);
    }

    #[test]
    fn test_pinecone_section_required_when_enabled() {
        let mut settings = sample_settings();
        settings.tools.set(ToolKind::VectorRetrieval, true);
        let secrets = base_secrets().with(SecretKey::PineconeApiKey, "pc");

        let result = validate_config(&settings, &secrets);
        assert!(!result.valid);
        assert!(result.error_summary().contains("pinecone.pinecone_index"));
    }

    #[test]
    fn test_pinecone_tool_name_checked_for_function_calling() {
        let mut settings = sample_settings();
        settings.tools.set(ToolKind::VectorRetrieval, true);
        settings.pinecone.pinecone_index = "notes".into();
        settings.pinecone.pinecone_env = "us-west1-gcp".into();
        settings.pinecone.tool_name = "Home Notes".into();
        settings.pinecone.tool_description = "Household notes".into();
        let secrets = base_secrets().with(SecretKey::PineconeApiKey, "pc");

        let result = validate_config(&settings, &secrets);
        assert!(result.valid, "{}", result.error_summary());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.path == "pinecone.tool_name" && w.message.contains("Home_Notes")));

        settings.pinecone.tool_name = "n".repeat(MAX_FUNCTION_NAME_LEN + 1);
        let result = validate_config(&settings, &secrets);
        assert!(!result.valid);
        assert!(result.error_summary().contains("pinecone.tool_name"));
    }

    #[test]
    fn test_bad_hotkey_is_an_error() {
        let mut settings = sample_settings();
        settings.general.hotkey = "ctrl+".to_string();
        assert!(!validate_config(&settings, &base_secrets()).valid);
    }

    #[test]
    fn test_missing_chat_key_is_an_error() {
        let result = validate_config(&sample_settings(), &Secrets::new());
        assert!(!result.valid);
        assert!(result.error_summary().contains("OPENAI_API_KEY"));
    }
}
