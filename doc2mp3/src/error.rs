use std::path::PathBuf;
use thiserror::Error;
use tts_client::SpeechError;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("unsupported input format '{extension}' (expected .docx or .txt)")]
    UnsupportedFormat { extension: String },

    #[error("cannot read {path}: {reason}")]
    UnreadableFile { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("synthesis failed for chapter {chapter}, chunk {chunk}: {source}")]
    Synthesis {
        chapter: u32,
        chunk: usize,
        #[source]
        source: SpeechError,
    },

    #[error("audio encoding failed: {0}")]
    Encoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
