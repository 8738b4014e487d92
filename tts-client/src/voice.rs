//! Voice parameter handling: normalization of rate and volume values.

use crate::error::{Result, SpeechError};
use crate::provider::SpeechRequest;

/// Validated voice parameters for a run. Construction normalizes rate and
/// volume, so a malformed value is rejected before any synthesis starts.
#[derive(Debug, Clone)]
pub struct VoiceSettings {
    pub voice: String,
    pub rate: String,
    pub volume: String,
}

impl VoiceSettings {
    pub fn new(voice: impl Into<String>, rate: &str, volume: &str) -> Result<Self> {
        Ok(Self {
            voice: voice.into(),
            rate: normalize_rate(rate)?,
            volume: normalize_volume(volume)?,
        })
    }

    /// Build the synthesis request for one chunk of text.
    pub fn request_for(&self, text: &str) -> SpeechRequest {
        SpeechRequest {
            text: text.to_string(),
            voice: self.voice.clone(),
            rate: self.rate.clone(),
            volume: self.volume.clone(),
        }
    }
}

/// Normalize a speech rate to the signed-percentage form the synthesis
/// services accept: "-5" and "-5%" both become "-5%", "3" becomes "+3%".
pub fn normalize_rate(value: &str) -> Result<String> {
    normalize_percent(value, false)
}

/// Normalize a volume value. Accepts the same forms as rate plus a "dB"
/// suffix; the number is reused as a percentage ("+3dB" -> "+3%"). This is a
/// fixed mapping, not an acoustic conversion.
pub fn normalize_volume(value: &str) -> Result<String> {
    normalize_percent(value, true)
}

fn normalize_percent(value: &str, accept_db: bool) -> Result<String> {
    let trimmed = value.trim();

    let number = if let Some(stripped) = strip_suffix_ci(trimmed, "db") {
        if !accept_db {
            return Err(SpeechError::InvalidParameter(format!(
                "'{value}': a dB suffix is only valid for volume"
            )));
        }
        stripped
    } else {
        trimmed.strip_suffix('%').unwrap_or(trimmed)
    };

    let percent: i32 = number.trim().parse().map_err(|_| {
        SpeechError::InvalidParameter(format!("'{value}' is not a valid percentage"))
    })?;

    Ok(format!("{percent:+}%"))
}

fn strip_suffix_ci<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    if s.len() >= suffix.len() && s[s.len() - suffix.len()..].eq_ignore_ascii_case(suffix) {
        Some(&s[..s.len() - suffix.len()])
    } else {
        None
    }
}
