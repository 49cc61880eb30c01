// ⚙️ Configuration - config.json + preferences.json
//
// Missing files fall back to defaults. Malformed files are logged and
// replaced by defaults so a bad edit never keeps the app from starting.

use anyhow::{Context, Result};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "config.json";

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `log` level filter: error, warn, info, debug or trace
    pub log_level: String,
    pub log_file_path: PathBuf,
    pub user_prefs_file_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: "info".to_string(),
            log_file_path: PathBuf::from("loan-book.log"),
            user_prefs_file_path: PathBuf::from("preferences.json"),
        }
    }
}

impl Config {
    /// Read the config file, writing a default one when it does not exist yet
    pub fn load_or_init(path: &Path) -> Result<Config> {
        let config = match read_json_file::<Config>(path) {
            Ok(Some(config)) => config,
            Ok(None) => {
                info!("Config file {} not found, using defaults", path.display());
                Config::default()
            }
            Err(err) => {
                warn!("Config file {} is malformed, using defaults: {:#}", path.display(), err);
                Config::default()
            }
        };

        // Keep the file in sync with any newly added fields
        if let Err(err) = save_json_file(&config, path) {
            warn!("Failed to save config file {}: {:#}", path.display(), err);
        }

        Ok(config)
    }
}

// ============================================================================
// USER PREFS
// ============================================================================

/// Terminal size remembered between sessions (columns x rows)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuiSettings {
    pub window_width: u16,
    pub window_height: u16,
}

impl Default for GuiSettings {
    fn default() -> Self {
        GuiSettings {
            window_width: 120,
            window_height: 40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPrefs {
    pub gui_settings: GuiSettings,
    pub address_book_file_path: PathBuf,
}

impl Default for UserPrefs {
    fn default() -> Self {
        UserPrefs {
            gui_settings: GuiSettings::default(),
            address_book_file_path: PathBuf::from("data").join("addressbook.db"),
        }
    }
}

impl UserPrefs {
    pub fn load_or_default(path: &Path) -> UserPrefs {
        match read_json_file::<UserPrefs>(path) {
            Ok(Some(prefs)) => prefs,
            Ok(None) => {
                info!("Preferences file {} not found, using defaults", path.display());
                UserPrefs::default()
            }
            Err(err) => {
                warn!("Preferences file {} is malformed, using defaults: {:#}", path.display(), err);
                UserPrefs::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_json_file(self, path)
    }
}

// ============================================================================
// JSON HELPERS
// ============================================================================

/// `Ok(None)` when the file does not exist
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    Ok(Some(value))
}

pub fn save_json_file<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_config_is_created_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = Config::load_or_init(&path).unwrap();

        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn test_malformed_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let config = Config::load_or_init(&path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_config_keeps_given_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "log_level": "debug" }"#).unwrap();

        let config = Config::load_or_init(&path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.user_prefs_file_path, PathBuf::from("preferences.json"));
    }

    #[test]
    fn test_user_prefs_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let prefs = UserPrefs {
            gui_settings: GuiSettings {
                window_width: 200,
                window_height: 55,
            },
            address_book_file_path: PathBuf::from("elsewhere.db"),
        };
        prefs.save(&path).unwrap();

        assert_eq!(UserPrefs::load_or_default(&path), prefs);
    }

    #[test]
    fn test_missing_user_prefs_are_defaults() {
        let dir = tempdir().unwrap();
        let prefs = UserPrefs::load_or_default(&dir.path().join("none.json"));
        assert_eq!(prefs, UserPrefs::default());
    }
}
