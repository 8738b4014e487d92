//! Output naming: filename sanitization and prefix resolution.
//!
//! The prefix precedence here is a contract: any external caller that wants
//! to predict the output path before conversion (for skip-if-exists checks)
//! must reproduce it exactly. The `predict` subcommand exposes it directly.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

static UNSAFE_CHARS_RE: OnceLock<Regex> = OnceLock::new();
static UNDERSCORE_RUNS_RE: OnceLock<Regex> = OnceLock::new();

fn unsafe_chars_re() -> &'static Regex {
    UNSAFE_CHARS_RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.-]+").expect("unsafe-chars regex compiles"))
}

fn underscore_runs_re() -> &'static Regex {
    UNDERSCORE_RUNS_RE.get_or_init(|| Regex::new(r"_+").expect("underscore-run regex compiles"))
}

/// Filesystem-safe name from a title: unsafe characters become underscores,
/// runs collapse, and leading/trailing separators are trimmed. May return an
/// empty string when nothing survives.
pub fn sanitize_title(name: &str) -> String {
    let replaced = unsafe_chars_re().replace_all(name.trim(), "_");
    let collapsed = underscore_runs_re().replace_all(&replaced, "_");
    collapsed.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Titles that carry no information and never become a prefix.
fn is_placeholder(title: &str) -> bool {
    matches!(title.trim().to_lowercase().as_str(), "" | "untitled" | "unknown")
}

/// Resolve the output filename prefix.
///
/// Precedence: explicit prefix > document title (non-empty, not a
/// placeholder) > first chapter title > input filename stem. Candidates
/// whose sanitized form is empty are skipped; the terminal fallback is
/// "book".
pub fn resolve_prefix(
    explicit: Option<&str>,
    document_title: Option<&str>,
    first_chapter_title: Option<&str>,
    source: &Path,
) -> String {
    if let Some(prefix) = explicit {
        let sanitized = sanitize_title(prefix);
        if !sanitized.is_empty() {
            return sanitized;
        }
    }

    for candidate in [document_title, first_chapter_title].into_iter().flatten() {
        if is_placeholder(candidate) {
            continue;
        }
        let sanitized = sanitize_title(candidate);
        if !sanitized.is_empty() {
            return sanitized;
        }
    }

    if let Some(stem) = source.file_stem() {
        let sanitized = sanitize_title(&stem.to_string_lossy());
        if !sanitized.is_empty() {
            return sanitized;
        }
    }

    "book".to_string()
}

/// Per-chapter output filename: `{prefix}_{ordinal:02}_{sanitized_title}.mp3`
pub fn chapter_file_name(prefix: &str, ordinal: u32, title: &str) -> String {
    let slug = sanitize_title(title);
    let slug = if slug.is_empty() { "chapter" } else { slug.as_str() };
    format!("{prefix}_{ordinal:02}_{slug}.mp3")
}

/// Combined output filename: `{prefix}_{combined_name}`
pub fn combined_file_name(prefix: &str, combined_name: &str) -> String {
    format!("{prefix}_{combined_name}")
}
