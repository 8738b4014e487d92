use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

/// One synthesis call: a bounded chunk of text plus normalized voice
/// parameters (rate and volume already in signed-percentage form).
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: String,
    pub rate: String,
    pub volume: String,
}

/// One voice offered by a synthesis service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VoiceInfo {
    pub name: String,
    pub short_name: String,
    pub locale: String,
    pub gender: String,
}

/// Trait for speech-synthesis providers
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize one chunk of text, returning encoded MP3 bytes.
    async fn synthesize(&self, request: SpeechRequest) -> Result<Vec<u8>>;

    /// List the voices offered by the service.
    async fn voices(&self) -> Result<Vec<VoiceInfo>>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// Check if the provider is usable (API key set, endpoint reachable config-wise)
    fn is_available(&self) -> Result<()>;
}
