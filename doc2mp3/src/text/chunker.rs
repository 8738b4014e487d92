//! Text chunking for synthesis calls.
//!
//! Chunks accumulate whole paragraphs up to the configured limit. A
//! paragraph that alone exceeds the limit is split at sentence boundaries;
//! a sentence that alone exceeds the limit is hard-split at the limit.
//! Lengths are counted in characters, matching the synthesis service's
//! per-request text limit.

use super::TextChunk;
use super::sentences::split_sentences;
use crate::chapters::Chapter;

/// Default maximum chunk size in characters.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 2200;

/// Separator between paragraphs accumulated into one chunk.
const PARAGRAPH_SEP: &str = "\n\n";

/// Chunk a chapter's body into synthesis-sized pieces.
pub fn chunk_chapter(chapter: &Chapter, max_chars: usize) -> Vec<TextChunk> {
    chunk_paragraphs(&chapter.body, max_chars)
        .into_iter()
        .enumerate()
        .map(|(sequence_index, text)| TextChunk::new(chapter.ordinal, sequence_index, text))
        .collect()
}

/// Accumulate paragraphs into chunks of at most `max_chars` characters.
pub fn chunk_paragraphs(paragraphs: &[String], max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buffer = String::new();

    for paragraph in paragraphs {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        // An oversized paragraph gets its own sentence-level split;
        // flushing around it keeps chunk boundaries on paragraph edges.
        if char_len(paragraph) > max_chars {
            flush(&mut buffer, &mut chunks);
            chunks.extend(split_paragraph(paragraph, max_chars));
            continue;
        }

        let separator = if buffer.is_empty() {
            0
        } else {
            PARAGRAPH_SEP.len()
        };
        if char_len(&buffer) + separator + char_len(paragraph) > max_chars {
            flush(&mut buffer, &mut chunks);
        }

        if !buffer.is_empty() {
            buffer.push_str(PARAGRAPH_SEP);
        }
        buffer.push_str(paragraph);
    }

    flush(&mut buffer, &mut chunks);
    chunks
}

fn flush(buffer: &mut String, chunks: &mut Vec<String>) {
    if !buffer.is_empty() {
        chunks.push(std::mem::take(buffer));
    }
}

/// Split one oversized paragraph at sentence boundaries, hard-splitting any
/// sentence that alone exceeds the limit.
fn split_paragraph(paragraph: &str, max_chars: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut buffer = String::new();

    for sentence in split_sentences(paragraph) {
        if char_len(sentence) > max_chars {
            flush(&mut buffer, &mut parts);
            parts.extend(hard_split(sentence, max_chars));
            continue;
        }

        let separator = if buffer.is_empty() { 0 } else { 1 };
        if char_len(&buffer) + separator + char_len(sentence) > max_chars {
            flush(&mut buffer, &mut parts);
        }

        if !buffer.is_empty() {
            buffer.push(' ');
        }
        buffer.push_str(sentence);
    }

    flush(&mut buffer, &mut parts);
    parts
}

/// Hard split at exact character positions (last resort).
fn hard_split(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut parts = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = std::cmp::min(start + max_chars, chars.len());
        parts.push(chars[start..end].iter().collect());
        start = end;
    }

    parts
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
