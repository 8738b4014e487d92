//! Text processing for synthesis: chunking and sentence splitting.

pub mod chunker;
mod sentences;

pub use chunker::chunk_chapter;

/// A bounded-length slice of chapter text sized for one synthesis call.
#[derive(Debug, Clone)]
pub struct TextChunk {
    /// The chapter this chunk belongs to (1-based ordinal)
    pub chapter_ordinal: u32,
    /// The chunk index within the chapter (0-based)
    pub sequence_index: usize,
    /// The text content
    pub text: String,
}

impl TextChunk {
    /// Create a new text chunk.
    pub fn new(chapter_ordinal: u32, sequence_index: usize, text: String) -> Self {
        Self {
            chapter_ordinal,
            sequence_index,
            text,
        }
    }
}
