// Document loading and paragraph extraction

mod docx;
mod txt;

use crate::error::{ConvertError, Result};
use std::path::Path;

/// Style hint attached to a loaded paragraph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParaStyle {
    Heading1,
    Heading2,
    Body,
}

impl ParaStyle {
    /// Whether this style opens a new chapter
    pub fn is_heading(self) -> bool {
        matches!(self, ParaStyle::Heading1 | ParaStyle::Heading2)
    }
}

/// A single paragraph with its style hint
#[derive(Debug, Clone)]
pub struct Paragraph {
    pub text: String,
    pub style: ParaStyle,
}

/// A loaded manuscript: ordered paragraphs plus an optional document title
#[derive(Debug)]
pub struct Document {
    pub title: Option<String>,
    pub paragraphs: Vec<Paragraph>,
}

/// Heading style names recognized across locales, folded to lowercase with
/// whitespace removed so both style names ("Heading 1") and raw style IDs
/// ("Heading1", "Otsikko2") classify. Extend here; call sites are untouched.
const HEADING_STYLES: &[(&str, ParaStyle)] = &[
    ("heading1", ParaStyle::Heading1),
    ("heading2", ParaStyle::Heading2),
    ("otsikko1", ParaStyle::Heading1),
    ("otsikko2", ParaStyle::Heading2),
];

/// Classify a paragraph style name into a heading level.
pub(crate) fn classify_style_name(name: &str) -> ParaStyle {
    let folded: String = name
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    for (key, style) in HEADING_STYLES {
        if folded.contains(key) {
            return *style;
        }
    }
    ParaStyle::Body
}

/// Load a manuscript, dispatching on the file extension.
pub fn load_document(path: &Path) -> Result<Document> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "docx" => docx::load(path),
        "txt" => txt::load(path),
        _ => Err(ConvertError::UnsupportedFormat { extension }),
    }
}
