//! Speech provider implementations

mod azure;
pub mod mock;

pub use azure::AzureProvider;
pub use mock::MockSynthesizer;

use crate::config::SpeechConfig;
use crate::error::{Result, SpeechError};
use crate::provider::SpeechProvider;

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Azure,
}

impl ProviderKind {
    /// Parse provider kind from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "azure" => Ok(Self::Azure),
            _ => Err(SpeechError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Azure => "AZURE_SPEECH_KEY",
        }
    }
}

/// Create a provider instance from the speech configuration
pub fn get_provider(config: &SpeechConfig) -> Result<Box<dyn SpeechProvider>> {
    let kind = ProviderKind::from_str(&config.provider)?;

    match kind {
        ProviderKind::Azure => {
            let api_key = get_api_key(config, kind.env_var(), "Azure")?;
            Ok(Box::new(AzureProvider::new(config.region(), api_key)?))
        }
    }
}

/// Get API key from config or environment variable
fn get_api_key(config: &SpeechConfig, env_var: &str, provider_name: &str) -> Result<String> {
    // Check config first
    if let Some(key) = config.api_key.clone() {
        return Ok(key);
    }

    // Fall back to environment variable
    std::env::var(env_var).map_err(|_| SpeechError::MissingApiKey {
        provider: provider_name.to_string(),
        env_var: env_var.to_string(),
    })
}
