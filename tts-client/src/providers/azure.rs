//! Azure Cognitive Services neural TTS provider
//!
//! Direct HTTP implementation of the text-to-speech REST API. Each request
//! carries an SSML body and returns encoded MP3 audio.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{Result, SpeechError};
use crate::provider::{SpeechProvider, SpeechRequest, VoiceInfo};

/// MP3 output matching the assembler's expectations (24 kHz mono).
const OUTPUT_FORMAT: &str = "audio-24khz-96kbitrate-mono-mp3";

const USER_AGENT: &str = concat!("tts-client/", env!("CARGO_PKG_VERSION"));

/// Provider for the Azure TTS REST endpoint
pub struct AzureProvider {
    region: String,
    api_key: String,
    client: Client,
}

impl AzureProvider {
    /// Create a new Azure provider for the given service region
    pub fn new(region: &str, api_key: String) -> Result<Self> {
        let client = Client::new();

        Ok(Self {
            region: region.to_string(),
            api_key,
            client,
        })
    }

    fn synthesis_url(&self) -> String {
        format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.region
        )
    }

    fn voices_url(&self) -> String {
        format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/voices/list",
            self.region
        )
    }
}

/// Build the SSML body for one synthesis request.
fn build_ssml(request: &SpeechRequest) -> String {
    format!(
        "<speak version='1.0' xml:lang='{lang}'>\
         <voice name='{voice}'>\
         <prosody rate='{rate}' volume='{volume}'>{text}</prosody>\
         </voice></speak>",
        lang = voice_locale(&request.voice),
        voice = escape_xml(&request.voice),
        rate = request.rate,
        volume = request.volume,
        text = escape_xml(&request.text),
    )
}

/// Locale prefix of a neural voice name ("fi-FI-SelmaNeural" -> "fi-FI").
fn voice_locale(voice: &str) -> &str {
    voice
        .match_indices('-')
        .nth(1)
        .map(|(i, _)| &voice[..i])
        .unwrap_or("en-US")
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&apos;")
        .replace('"', "&quot;")
}

#[async_trait]
impl SpeechProvider for AzureProvider {
    async fn synthesize(&self, request: SpeechRequest) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(self.synthesis_url())
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .header("User-Agent", USER_AGENT)
            .body(build_ssml(&request))
            .send()
            .await
            .map_err(|e| SpeechError::ApiError {
                message: format!("Request failed: {}", e),
                status_code: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            // 429 carries an optional Retry-After hint for the retry loop
            if status.as_u16() == 429 {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                return Err(SpeechError::RateLimited { retry_after });
            }

            let message = response.text().await.unwrap_or_default();

            if status.as_u16() == 503 {
                return Err(SpeechError::ServerOverloaded { message });
            }

            return Err(SpeechError::ApiError {
                message,
                status_code: Some(status.as_u16()),
            });
        }

        let audio = response.bytes().await.map_err(|e| SpeechError::ApiError {
            message: format!("Failed to read audio body: {}", e),
            status_code: None,
        })?;

        if audio.is_empty() {
            return Err(SpeechError::ApiError {
                message: "Service returned empty audio".to_string(),
                status_code: None,
            });
        }

        Ok(audio.to_vec())
    }

    async fn voices(&self) -> Result<Vec<VoiceInfo>> {
        let response = self
            .client
            .get(self.voices_url())
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| SpeechError::ApiError {
                message: format!("Request failed: {}", e),
                status_code: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SpeechError::ApiError {
                message,
                status_code: Some(status.as_u16()),
            });
        }

        response.json().await.map_err(|e| SpeechError::ApiError {
            message: format!("Failed to parse voice list: {}", e),
            status_code: None,
        })
    }

    fn name(&self) -> &'static str {
        "Azure"
    }

    fn is_available(&self) -> Result<()> {
        // API key was provided in constructor
        Ok(())
    }
}
