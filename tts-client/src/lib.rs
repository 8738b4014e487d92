//! Shared speech-synthesis client library for the doc2mp3 workspace
//!
//! Provides a unified interface to neural text-to-speech services:
//! - Azure Cognitive Services TTS (REST)
//! - Mock synthesizer for tests

pub mod config;
pub mod error;
pub mod provider;
pub mod providers;
pub mod voice;

pub use config::SpeechConfig;
pub use error::{Result, SpeechError};
pub use provider::{SpeechProvider, SpeechRequest, VoiceInfo};
pub use providers::{AzureProvider, MockSynthesizer, ProviderKind, get_provider};
pub use voice::{VoiceSettings, normalize_rate, normalize_volume};
