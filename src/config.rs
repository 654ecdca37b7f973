//! Platy Configuration Module
//!
//! Manages persistent configuration for provider defaults and tracing.
//! Config is stored in `~/.config/platy/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. CLI flags
//! 2. Stack file (`provider:` field)
//! 3. Environment variable (`PLATY_PROVIDER`)
//! 4. Config file (`~/.config/platy/config.toml`)
//! 5. Built-in default (`local`)

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PlatyError, Result};

/// Built-in fallback provider
pub const DEFAULT_PROVIDER: &str = "local";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlatyConfig {
    /// Default provider settings
    #[serde(default)]
    pub defaults: Defaults,

    /// Trace persistence settings
    #[serde(default)]
    pub trace: TraceSettings,
}

/// Default settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Defaults {
    /// Default provider (local, mock)
    pub provider: Option<String>,
}

/// Trace persistence settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceSettings {
    /// Write an NDJSON trace per deployment run
    pub enabled: bool,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl PlatyConfig {
    /// Get the config directory path
    ///
    /// Returns `~/.config/platy/` on Unix, `%APPDATA%/platy/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("platy")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file
    ///
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but is malformed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| PlatyError::ConfigError {
            reason: format!("Failed to read config file: {}", e),
        })?;

        toml::from_str(&content).map_err(|e| PlatyError::ConfigError {
            reason: format!("Failed to parse config file: {}", e),
        })
    }

    /// Save configuration to file
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir();
        let path = Self::config_path();

        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| PlatyError::ConfigError {
                reason: format!("Failed to create config directory: {}", e),
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| PlatyError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(&path, content).map_err(|e| PlatyError::ConfigError {
            reason: format!("Failed to write config file: {}", e),
        })?;

        Ok(())
    }

    /// Merge with environment variables
    ///
    /// `PLATY_PROVIDER` takes precedence over the config file value.
    pub fn with_env(mut self) -> Self {
        if let Ok(provider) = std::env::var("PLATY_PROVIDER") {
            if !provider.is_empty() {
                self.defaults.provider = Some(provider);
            }
        }
        self
    }

    /// Effective default provider
    pub fn default_provider(&self) -> &str {
        self.defaults.provider.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_contains_platy() {
        let path = PlatyConfig::config_path();
        assert!(path.to_string_lossy().contains("platy"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn config_dir_is_parent_of_config_path() {
        let dir = PlatyConfig::config_dir();
        let path = PlatyConfig::config_path();
        assert_eq!(path.parent().unwrap(), dir);
    }

    #[test]
    fn default_config_uses_local_provider() {
        let config = PlatyConfig::default();
        assert_eq!(config.default_provider(), "local");
        assert!(config.trace.enabled);
    }

    #[test]
    fn configured_provider_wins_over_builtin() {
        let config = PlatyConfig {
            defaults: Defaults {
                provider: Some("mock".to_string()),
            },
            ..Default::default()
        };
        assert_eq!(config.default_provider(), "mock");
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let config = PlatyConfig {
            defaults: Defaults {
                provider: Some("mock".to_string()),
            },
            trace: TraceSettings { enabled: false },
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: PlatyConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let parsed: PlatyConfig = toml::from_str("").unwrap();
        assert_eq!(parsed, PlatyConfig::default());
        assert!(parsed.trace.enabled);
    }
}
