//! doc2mp3 configuration management.

use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::text::chunker::DEFAULT_MAX_CHUNK_CHARS;

const DEFAULT_VOICE: &str = "fi-FI-SelmaNeural";
const DEFAULT_RATE: &str = "-5%";
const DEFAULT_VOLUME: &str = "+0%";
const DEFAULT_BITRATE: &str = "192k";
const DEFAULT_CHAPTER_GAP_MS: u64 = 1200;
const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_UNTITLED_TITLE: &str = "Introduction";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doc2Mp3Config {
    /// Default neural voice
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Default speech rate (accepts -5 or -5%)
    #[serde(default = "default_rate")]
    pub rate: String,

    /// Default volume (accepts +3, +3% or +3dB)
    #[serde(default = "default_volume")]
    pub volume: String,

    /// Default MP3 bitrate
    #[serde(default = "default_bitrate")]
    pub bitrate: String,

    /// Silence between chapters in the combined file (ms)
    #[serde(default = "default_chapter_gap_ms")]
    pub chapter_gap_ms: u64,

    /// Maximum characters per synthesis call
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Concurrent synthesis requests
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Title given to a leading chapter that has no heading
    #[serde(default = "default_untitled_title")]
    pub untitled_title: String,
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_rate() -> String {
    DEFAULT_RATE.to_string()
}

fn default_volume() -> String {
    DEFAULT_VOLUME.to_string()
}

fn default_bitrate() -> String {
    DEFAULT_BITRATE.to_string()
}

fn default_chapter_gap_ms() -> u64 {
    DEFAULT_CHAPTER_GAP_MS
}

fn default_max_chunk_chars() -> usize {
    DEFAULT_MAX_CHUNK_CHARS
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_untitled_title() -> String {
    DEFAULT_UNTITLED_TITLE.to_string()
}

impl Default for Doc2Mp3Config {
    fn default() -> Self {
        Self {
            voice: default_voice(),
            rate: default_rate(),
            volume: default_volume(),
            bitrate: default_bitrate(),
            chapter_gap_ms: default_chapter_gap_ms(),
            max_chunk_chars: default_max_chunk_chars(),
            concurrency: default_concurrency(),
            untitled_title: default_untitled_title(),
        }
    }
}

impl Doc2Mp3Config {
    /// Get the config file path: ~/.config/cli-programs/doc2mp3.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| ConvertError::InvalidConfiguration("HOME not set".to_string()))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("cli-programs")
            .join("doc2mp3.toml"))
    }

    /// Load config from file, returning defaults if the file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Doc2Mp3Config = toml::from_str(&content)
            .map_err(|e| ConvertError::InvalidConfiguration(format!("{}: {e}", path.display())))?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConvertError::InvalidConfiguration(e.to_string()))?;
        fs::write(&path, content)?;
        Ok(())
    }
}

/// Immutable settings for one conversion run, resolved from CLI flags over
/// the config file over built-in defaults.
#[derive(Debug, Clone)]
pub struct OutputSpec {
    pub outdir: PathBuf,
    pub prefix: Option<String>,
    pub album: String,
    pub author: String,
    pub voice: String,
    pub rate: String,
    pub volume: String,
    pub per_chapter: bool,
    pub combined_name: String,
    pub chapter_gap_ms: u64,
    pub bitrate: String,
    pub max_chunk_chars: usize,
    pub concurrency: usize,
    pub untitled_title: String,
}

impl OutputSpec {
    /// Reject malformed settings before any synthesis starts. Rate and
    /// volume are validated separately when voice settings are built.
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_chars == 0 {
            return Err(ConvertError::InvalidConfiguration(
                "max_chunk_chars must be positive".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(ConvertError::InvalidConfiguration(
                "concurrency must be positive".to_string(),
            ));
        }
        if !is_valid_bitrate(&self.bitrate) {
            return Err(ConvertError::InvalidConfiguration(format!(
                "invalid bitrate '{}' (expected e.g. 128k, 192k, 320k)",
                self.bitrate
            )));
        }
        if self.combined_name.trim().is_empty() {
            return Err(ConvertError::InvalidConfiguration(
                "combined_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn is_valid_bitrate(bitrate: &str) -> bool {
    let digits = bitrate.strip_suffix('k').unwrap_or(bitrate);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> OutputSpec {
        OutputSpec {
            outdir: PathBuf::from("out"),
            prefix: None,
            album: "Audiobook".to_string(),
            author: "Unknown Author".to_string(),
            voice: DEFAULT_VOICE.to_string(),
            rate: DEFAULT_RATE.to_string(),
            volume: DEFAULT_VOLUME.to_string(),
            per_chapter: true,
            combined_name: "book_combined.mp3".to_string(),
            chapter_gap_ms: DEFAULT_CHAPTER_GAP_MS,
            bitrate: DEFAULT_BITRATE.to_string(),
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            concurrency: DEFAULT_CONCURRENCY,
            untitled_title: DEFAULT_UNTITLED_TITLE.to_string(),
        }
    }

    #[test]
    fn test_default_config() {
        let config = Doc2Mp3Config::default();
        assert_eq!(config.voice, "fi-FI-SelmaNeural");
        assert_eq!(config.rate, "-5%");
        assert_eq!(config.volume, "+0%");
        assert_eq!(config.bitrate, "192k");
        assert_eq!(config.chapter_gap_ms, 1200);
        assert_eq!(config.max_chunk_chars, 2200);
        assert_eq!(config.concurrency, 4);
    }

    #[test]
    fn test_config_path() {
        let path = Doc2Mp3Config::config_path().unwrap();
        assert!(path.ends_with("cli-programs/doc2mp3.toml"));
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
voice = "en-US-AriaNeural"
rate = "+0%"
chapter_gap_ms = 800
"#;
        let config: Doc2Mp3Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.voice, "en-US-AriaNeural");
        assert_eq!(config.rate, "+0%");
        assert_eq!(config.chapter_gap_ms, 800);
        // Unspecified fields keep their defaults
        assert_eq!(config.bitrate, "192k");
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Doc2Mp3Config = toml::from_str("").unwrap();
        assert_eq!(config.voice, DEFAULT_VOICE);
        assert_eq!(config.max_chunk_chars, DEFAULT_MAX_CHUNK_CHARS);
    }

    #[test]
    fn test_valid_spec() {
        assert!(spec().validate().is_ok());
    }

    #[test]
    fn test_invalid_bitrate_rejected() {
        let mut bad = spec();
        bad.bitrate = "fast".to_string();
        assert!(matches!(
            bad.validate(),
            Err(ConvertError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_bitrate_forms_accepted() {
        for bitrate in ["128k", "192k", "320k", "192000"] {
            let mut ok = spec();
            ok.bitrate = bitrate.to_string();
            assert!(ok.validate().is_ok(), "bitrate {bitrate} should be valid");
        }
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let mut bad = spec();
        bad.max_chunk_chars = 0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut bad = spec();
        bad.concurrency = 0;
        assert!(bad.validate().is_err());
    }
}
