//! Sentence splitting at terminal punctuation.

use regex::Regex;
use std::sync::OnceLock;

static BOUNDARY_RE: OnceLock<Regex> = OnceLock::new();

/// A boundary is terminal punctuation, optionally followed by a closing
/// quote or bracket, followed by whitespace.
fn boundary_re() -> &'static Regex {
    BOUNDARY_RE.get_or_init(|| {
        Regex::new(r#"[.!?…]["')\]]*\s+"#).expect("sentence boundary regex compiles")
    })
}

/// Split text into sentences. Boundary whitespace is dropped; everything
/// else is preserved verbatim.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for boundary in boundary_re().find_iter(text) {
        let sentence = text[start..boundary.end()].trim_end();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = boundary.end();
    }

    let tail = text[start..].trim_end();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_two_sentences() {
        assert_eq!(
            split_sentences("Hello world. How are you?"),
            vec!["Hello world.", "How are you?"]
        );
    }

    #[test]
    fn test_terminal_punctuation_variants() {
        assert_eq!(
            split_sentences("Wait… what? Yes! Fine."),
            vec!["Wait…", "what?", "Yes!", "Fine."]
        );
    }

    #[test]
    fn test_closing_quotes_stay_with_sentence() {
        assert_eq!(
            split_sentences("\"Stop.\" He ran."),
            vec!["\"Stop.\"", "He ran."]
        );
    }

    #[test]
    fn test_no_boundary_returns_whole_text() {
        assert_eq!(split_sentences("no terminal punctuation"), vec!["no terminal punctuation"]);
    }

    #[test]
    fn test_abbreviation_mid_sentence_still_splits() {
        // Periods followed by whitespace are boundaries even inside
        // abbreviations; the chunker only needs safe cut points, not
        // linguistically perfect sentences.
        let sentences = split_sentences("It was approx. ten meters. Far.");
        assert_eq!(sentences.len(), 3);
    }

    #[test]
    fn test_empty_input() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   ").is_empty());
    }
}
