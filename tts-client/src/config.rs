use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, SpeechError};

/// Region used when the config file does not name one.
pub const DEFAULT_REGION: &str = "westeurope";

/// Speech service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Provider identifier (currently "azure")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Service region (e.g. "westeurope", "eastus")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// API key (optional, can use env var instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_provider() -> String {
    "azure".to_string()
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            region: None,
            api_key: None,
        }
    }
}

impl SpeechConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: SpeechConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home =
            std::env::var("HOME").map_err(|_| SpeechError::ConfigError("HOME not set".into()))?;
        Ok(PathBuf::from(home).join(".config/cli-programs/tts.toml"))
    }

    /// Service region, falling back to the default.
    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SpeechConfig::default();
        assert_eq!(config.provider, "azure");
        assert!(config.region.is_none());
        assert!(config.api_key.is_none());
        assert_eq!(config.region(), DEFAULT_REGION);
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
provider = "azure"
region = "northeurope"
api_key = "secret"
"#;
        let config: SpeechConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider, "azure");
        assert_eq!(config.region(), "northeurope");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config: SpeechConfig = toml::from_str("").unwrap();
        assert_eq!(config.provider, "azure");
        assert_eq!(config.region(), DEFAULT_REGION);
    }

    #[test]
    fn test_config_serialization() {
        let config = SpeechConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: SpeechConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider, config.provider);
    }
}
