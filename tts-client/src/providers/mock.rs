//! Mock speech provider for testing
//!
//! Provides a configurable mock synthesizer that can simulate flaky-service
//! behavior: failures, retries, and successful responses.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, SpeechError};
use crate::provider::{SpeechProvider, SpeechRequest, VoiceInfo};

/// A mock synthesizer for testing retry and ordering behavior
pub struct MockSynthesizer {
    /// Number of times to fail before succeeding (0 = always succeed)
    fail_count: AtomicUsize,
    /// Current call count
    call_count: AtomicUsize,
    /// Error to return on failure (None = always succeed)
    fail_with: Mutex<Option<SpeechError>>,
    /// Audio bytes to return on success
    audio: Vec<u8>,
}

impl MockSynthesizer {
    /// Create a synthesizer that fails `n` times with the given error, then succeeds
    pub fn fails_then_succeeds(n: usize, error: SpeechError, audio: &[u8]) -> Self {
        Self {
            fail_count: AtomicUsize::new(n),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(Some(error)),
            audio: audio.to_vec(),
        }
    }

    /// Create a synthesizer that always fails with the given error
    pub fn always_fails(error: SpeechError) -> Self {
        Self {
            fail_count: AtomicUsize::new(usize::MAX),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(Some(error)),
            audio: Vec::new(),
        }
    }

    /// Create a synthesizer that always succeeds with the given audio
    pub fn always_succeeds(audio: &[u8]) -> Self {
        Self {
            fail_count: AtomicUsize::new(0),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(None),
            audio: audio.to_vec(),
        }
    }

    /// Get the number of times synthesize() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechProvider for MockSynthesizer {
    async fn synthesize(&self, _request: SpeechRequest) -> Result<Vec<u8>> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        let fail_count = self.fail_count.load(Ordering::SeqCst);

        if call_num < fail_count {
            // Should fail on this call
            let error = self.fail_with.lock().unwrap();
            if let Some(err) = error.as_ref() {
                return Err(clone_error(err));
            }
        }

        Ok(self.audio.clone())
    }

    async fn voices(&self) -> Result<Vec<VoiceInfo>> {
        Ok(vec![VoiceInfo {
            name: "Mock Voice".to_string(),
            short_name: "xx-XX-MockNeural".to_string(),
            locale: "xx-XX".to_string(),
            gender: "Neutral".to_string(),
        }])
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }
}

/// Clone a SpeechError (needed because SpeechError doesn't implement Clone)
fn clone_error(err: &SpeechError) -> SpeechError {
    match err {
        SpeechError::MissingApiKey { provider, env_var } => SpeechError::MissingApiKey {
            provider: provider.clone(),
            env_var: env_var.clone(),
        },
        SpeechError::ProviderUnavailable(s) => SpeechError::ProviderUnavailable(s.clone()),
        SpeechError::RateLimited { retry_after } => SpeechError::RateLimited {
            retry_after: *retry_after,
        },
        SpeechError::ServerOverloaded { message } => SpeechError::ServerOverloaded {
            message: message.clone(),
        },
        SpeechError::ApiError {
            message,
            status_code,
        } => SpeechError::ApiError {
            message: message.clone(),
            status_code: *status_code,
        },
        SpeechError::InvalidParameter(s) => SpeechError::InvalidParameter(s.clone()),
        SpeechError::ConfigError(s) => SpeechError::ConfigError(s.clone()),
        // For Io and Toml errors, we create a generic error since they can't be cloned
        SpeechError::Io(_) => SpeechError::ConfigError("IO error (mock)".to_string()),
        SpeechError::TomlParse(_) => SpeechError::ConfigError("TOML parse error (mock)".to_string()),
        SpeechError::TomlSerialize(_) => {
            SpeechError::ConfigError("TOML serialize error (mock)".to_string())
        }
    }
}
