//! Plain-text loading with heuristic chapter-marker detection.

use super::{Document, ParaStyle, Paragraph};
use crate::error::{ConvertError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Words that open a chapter heading line, matched case-insensitively and
/// optionally followed by a number or colon ("Chapter 3", "Luku 1:", "Osa").
const CHAPTER_MARKERS: &[&str] = &["Chapter", "Luku", "Osa"];

static MARKER_RE: OnceLock<Regex> = OnceLock::new();

fn marker_re() -> &'static Regex {
    MARKER_RE.get_or_init(|| {
        let words = CHAPTER_MARKERS.join("|");
        Regex::new(&format!(r"(?i)^(?:{words})\b")).expect("chapter marker regex compiles")
    })
}

pub fn load(path: &Path) -> Result<Document> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConvertError::UnreadableFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut paragraphs = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        // Blank lines separate paragraphs but are not paragraphs themselves
        if line.is_empty() {
            continue;
        }

        let style = if marker_re().is_match(line) {
            ParaStyle::Heading1
        } else {
            ParaStyle::Body
        };
        paragraphs.push(Paragraph {
            text: line.to_string(),
            style,
        });
    }

    Ok(Document {
        title: None,
        paragraphs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn load_str(content: &str) -> Document {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.txt");
        std::fs::write(&path, content).unwrap();
        load(&path).unwrap()
    }

    #[test]
    fn test_marker_lines_become_headings() {
        let document = load_str("Chapter 1\n\nOnce upon a time.\n\nLuku 2: Loppu\nSe loppui.\n");
        let styles: Vec<ParaStyle> = document.paragraphs.iter().map(|p| p.style).collect();
        assert_eq!(
            styles,
            vec![
                ParaStyle::Heading1,
                ParaStyle::Body,
                ParaStyle::Heading1,
                ParaStyle::Body
            ]
        );
        assert_eq!(document.paragraphs[2].text, "Luku 2: Loppu");
    }

    #[test]
    fn test_markers_are_case_insensitive() {
        let document = load_str("chapter one\nOSA 2\n");
        assert!(document.paragraphs.iter().all(|p| p.style == ParaStyle::Heading1));
    }

    #[test]
    fn test_marker_requires_word_boundary() {
        // "Chapters" is prose, not a heading
        let document = load_str("Chapters can be long.\n");
        assert_eq!(document.paragraphs[0].style, ParaStyle::Body);
    }

    #[test]
    fn test_blank_lines_not_emitted() {
        let document = load_str("One.\n\n\n\nTwo.\n");
        assert_eq!(document.paragraphs.len(), 2);
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let err = load(Path::new("/nonexistent/book.txt")).unwrap_err();
        assert!(matches!(err, ConvertError::UnreadableFile { .. }));
    }
}
