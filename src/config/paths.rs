//! Configuration paths
//!
//! Resolves where the settings and secrets files live. The working directory
//! wins when it holds the file, then the per-user config directory.

use std::path::{Path, PathBuf};

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.ini";

/// Secrets file name
pub const SECRETS_FILE: &str = ".env";

/// Get the per-user configuration directory
pub fn config_dir() -> PathBuf {
    // Check for explicit override
    if let Ok(dir) = std::env::var("ALFRED_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    dirs::config_dir()
        .map(|d| d.join("alfred"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".config").join("alfred"))
                .unwrap_or_else(|| PathBuf::from(".alfred"))
        })
}

/// Get the settings file path
pub fn settings_path() -> PathBuf {
    if let Ok(path) = std::env::var("ALFRED_SETTINGS") {
        return PathBuf::from(path);
    }

    first_existing(Path::new(SETTINGS_FILE), config_dir().join(SETTINGS_FILE))
}

/// Get the secrets file path
pub fn secrets_path() -> PathBuf {
    if let Ok(path) = std::env::var("ALFRED_ENV_FILE") {
        return PathBuf::from(path);
    }

    first_existing(Path::new(SECRETS_FILE), config_dir().join(SECRETS_FILE))
}

fn first_existing(local: &Path, fallback: PathBuf) -> PathBuf {
    if local.exists() || !fallback.exists() {
        local.to_path_buf()
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_existing_prefers_local() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("settings.ini");
        let fallback = dir.path().join("user").join("settings.ini");

        // Neither exists: the local path is reported so errors name it.
        assert_eq!(first_existing(&local, fallback.clone()), local);

        std::fs::create_dir_all(fallback.parent().unwrap()).unwrap();
        std::fs::write(&fallback, "").unwrap();
        assert_eq!(first_existing(&local, fallback.clone()), fallback);

        std::fs::write(&local, "").unwrap();
        assert_eq!(first_existing(&local, fallback), local);
    }
}
