use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use crate::export::DEFAULT_TEMPLATE;
use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default)]
    pub editor: Option<String>,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default)]
    pub export: ExportConfig,
    /// File-extension to opener command overrides, e.g. pdf = "zathura"
    #[serde(default)]
    pub open_with: HashMap<String, String>,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_select")]
    pub select: String,
    #[serde(default = "default_delete")]
    pub delete: String,
    #[serde(default = "default_list_up")]
    pub list_up: String,
    #[serde(default = "default_list_down")]
    pub list_down: String,
    #[serde(default = "default_today")]
    pub today: String,
    #[serde(default = "default_stats")]
    pub stats: String,
    #[serde(default = "default_tag_filter")]
    pub tag_filter: String,
    #[serde(default = "default_prev_month")]
    pub prev_month: String,
    #[serde(default = "default_next_month")]
    pub next_month: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_front_matter")]
    pub front_matter: bool,
    #[serde(default)]
    pub split_folders: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            editor: None,
            key_bindings: KeyBindings::default(),
            export: ExportConfig::default(),
            open_with: HashMap::new(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            select: default_select(),
            delete: default_delete(),
            list_up: default_list_up(),
            list_down: default_list_down(),
            today: default_today(),
            stats: default_stats(),
            tag_filter: default_tag_filter(),
            prev_month: default_prev_month(),
            next_month: default_next_month(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            front_matter: default_front_matter(),
            split_folders: false,
        }
    }
}

// Default value functions
fn default_database_path() -> String {
    // Fallback - the actual profile is applied at load time
    if let Some(data_dir) = utils::get_data_dir(utils::Profile::Prod) {
        data_dir.join("app.db").to_string_lossy().to_string()
    } else {
        "~/.local/share/timemap/app.db".to_string()
    }
}

fn default_quit() -> String {
    "q".to_string()
}

fn default_select() -> String {
    "Enter".to_string()
}

fn default_delete() -> String {
    "d".to_string()
}

fn default_list_up() -> String {
    "k".to_string()
}

fn default_list_down() -> String {
    "j".to_string()
}

fn default_today() -> String {
    "t".to_string()
}

fn default_stats() -> String {
    "s".to_string()
}

fn default_tag_filter() -> String {
    "/".to_string()
}

fn default_prev_month() -> String {
    "[".to_string()
}

fn default_next_month() -> String {
    "]".to_string()
}

fn default_output_dir() -> String {
    "output_files".to_string()
}

fn default_front_matter() -> bool {
    true
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
}

impl Config {
    /// Load configuration from file, or create default if missing
    /// Uses the provided profile to determine config and database paths
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let mut config: Config = toml::from_str(&contents)?;

            // Ensure database path matches profile (in case config was manually edited)
            config.database_path = Self::default_database_path_for_profile(profile);

            Ok(config)
        } else {
            let mut config = Config::default();
            config.database_path = Self::default_database_path_for_profile(profile);
            config.save_with_profile(profile)?;
            Ok(config)
        }
    }

    /// Load configuration from file, using production profile
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_profile(utils::Profile::Prod)
    }

    /// Save configuration to file
    pub fn save_with_profile(&mut self, profile: utils::Profile) -> Result<(), ConfigError> {
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        let config_path = Self::get_config_path(profile)?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, toml_string)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile).ok_or_else(|| {
            ConfigError::ConfigDirError("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get default database path for a specific profile
    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join("app.db").to_string_lossy().to_string()
        } else {
            match profile {
                utils::Profile::Dev => "~/.local/share/timemap-dev/app.db".to_string(),
                utils::Profile::Prod => "~/.local/share/timemap/app.db".to_string(),
            }
        }
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    /// Preferred editor: config, then $EDITOR, then vi
    pub fn get_editor(&self) -> String {
        if let Some(editor) = &self.editor {
            return editor.clone();
        }
        std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string())
    }
}

/// Path of the markdown export template
pub fn template_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
    let config_dir = utils::get_config_dir(profile).ok_or_else(|| {
        ConfigError::ConfigDirError("Could not determine config directory".to_string())
    })?;
    Ok(config_dir.join("output_template.md"))
}

/// Write the default template if none exists yet, returning its path
pub fn ensure_default_template(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
    let path = template_path(profile)?;
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }
        fs::write(&path, DEFAULT_TEMPLATE)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;
    }
    Ok(path)
}

/// Load the export template text, creating the default on first use.
/// The engine treats the text as opaque.
pub fn load_template(profile: utils::Profile) -> Result<String, ConfigError> {
    let path = ensure_default_template(profile)?;
    fs::read_to_string(&path).map_err(|e| ConfigError::ReadError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.key_bindings.quit, "q");
        assert_eq!(parsed.export.output_dir, "output_files");
        assert!(parsed.export.front_matter);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("database_path = \"/tmp/x.db\"").unwrap();
        assert_eq!(parsed.database_path, "/tmp/x.db");
        assert_eq!(parsed.key_bindings.select, "Enter");
        assert!(!parsed.export.split_folders);
    }
}
