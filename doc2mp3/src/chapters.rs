//! Chapter segmentation: partition a loaded document into titled chapters.

use crate::document::Document;
use std::path::Path;

/// Title given to an implicit leading chapter before any heading. Rewritten
/// to the configured placeholder by [`apply_untitled_title`].
pub const UNTITLED: &str = "Untitled";

/// A chapter: title, 1-based ordinal, and ordered body paragraphs.
#[derive(Debug, Clone)]
pub struct Chapter {
    pub title: String,
    pub ordinal: u32,
    pub body: Vec<String>,
}

impl Chapter {
    fn untitled() -> Self {
        Self {
            title: UNTITLED.to_string(),
            ordinal: 0,
            body: Vec::new(),
        }
    }
}

/// Partition a document into chapters.
///
/// Every heading paragraph starts a new chapter; body paragraphs append to
/// the current one. Body text before the first heading forms an implicit
/// "Untitled" leading chapter, which is kept even when later passes leave it
/// empty so ordinal numbering stays stable across runs. A document with no
/// headings at all becomes a single chapter titled from the document title,
/// else the first body paragraph that looks like a title, else the input
/// filename stem.
pub fn segment(document: &Document, source: &Path) -> Vec<Chapter> {
    let mut chapters: Vec<Chapter> = Vec::new();
    let mut current: Option<Chapter> = None;

    for paragraph in &document.paragraphs {
        if paragraph.style.is_heading() {
            if let Some(chapter) = current.take() {
                chapters.push(chapter);
            }
            current = Some(Chapter {
                title: paragraph.text.clone(),
                ordinal: 0,
                body: Vec::new(),
            });
        } else {
            current
                .get_or_insert_with(Chapter::untitled)
                .body
                .push(paragraph.text.clone());
        }
    }
    if let Some(chapter) = current {
        chapters.push(chapter);
    }

    let saw_heading = document.paragraphs.iter().any(|p| p.style.is_heading());
    if !saw_heading && !chapters.is_empty() {
        chapters[0].title = fallback_title(document, source);
    }

    for (index, chapter) in chapters.iter_mut().enumerate() {
        chapter.ordinal = (index + 1) as u32;
    }

    chapters
}

/// Title for a heading-less document: document title, else the first body
/// paragraph that looks like a title, else the input filename stem.
fn fallback_title(document: &Document, source: &Path) -> String {
    document
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| {
            document
                .paragraphs
                .iter()
                .map(|p| p.text.trim())
                .find(|t| looks_like_title(t))
                .map(str::to_string)
        })
        .or_else(|| {
            source
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "Book".to_string())
}

/// Short, single-line, no trailing punctuation.
fn looks_like_title(text: &str) -> bool {
    !text.is_empty()
        && text.chars().count() <= 60
        && !text.ends_with(['.', '!', '?', ',', ';', ':'])
}

/// Rewrite an "Untitled" first chapter to the configured placeholder title.
///
/// Presentation-layer normalization, applied after segmentation and before
/// filenames or tags are derived.
pub fn apply_untitled_title(mut chapters: Vec<Chapter>, placeholder: &str) -> Vec<Chapter> {
    if let Some(first) = chapters.first_mut() {
        if first.title == UNTITLED {
            first.title = placeholder.to_string();
        }
    }
    chapters
}
