//! DOCX loading: paragraph and style extraction from the OOXML container.
//!
//! A .docx file is a zip archive. Paragraphs live in `word/document.xml` as
//! `<w:p>` elements whose style reference (`<w:pStyle w:val="..."/>`) points
//! at a style ID defined in `word/styles.xml`; the human-readable style name
//! ("Heading 1", "Otsikko 1") is that style's `<w:name>`. The document title
//! comes from `docProps/core.xml`. The fixed shape of these three parts lets
//! us scan for the handful of tags we need instead of parsing the schema.

use super::{Document, Paragraph, classify_style_name};
use crate::error::{ConvertError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use zip::ZipArchive;

pub fn load(path: &Path) -> Result<Document> {
    let file = File::open(path).map_err(|e| ConvertError::UnreadableFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut archive =
        ZipArchive::new(BufReader::new(file)).map_err(|e| ConvertError::UnreadableFile {
            path: path.to_path_buf(),
            reason: format!("not a valid DOCX archive: {e}"),
        })?;

    let document_xml =
        read_entry(&mut archive, "word/document.xml").ok_or_else(|| ConvertError::UnreadableFile {
            path: path.to_path_buf(),
            reason: "missing word/document.xml".to_string(),
        })?;

    // Optional parts: a document without them still loads.
    let styles_xml = read_entry(&mut archive, "word/styles.xml").unwrap_or_default();
    let core_xml = read_entry(&mut archive, "docProps/core.xml");

    let style_names = parse_style_names(&styles_xml);
    let paragraphs = parse_paragraphs(&document_xml, &style_names);
    let title = core_xml.as_deref().and_then(extract_dc_title);

    Ok(Document { title, paragraphs })
}

fn read_entry<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>, name: &str) -> Option<String> {
    let mut entry = archive.by_name(name).ok()?;
    let mut content = String::new();
    entry.read_to_string(&mut content).ok()?;
    Some(content)
}

/// Map style IDs to style names from `word/styles.xml`.
fn parse_style_names(styles_xml: &str) -> HashMap<String, String> {
    let mut names = HashMap::new();
    let mut pos = 0;

    while let Some(element) = next_element(styles_xml, pos, "w:style") {
        pos = element.end;
        let Some(style_id) = attr_value(element.open_tag, "w:styleId") else {
            continue;
        };
        if let Some(name_tag) = next_element(element.inner, 0, "w:name") {
            if let Some(name) = attr_value(name_tag.open_tag, "w:val") {
                names.insert(style_id.to_string(), name.to_string());
            }
        }
    }

    names
}

/// Extract paragraphs from `word/document.xml`, classifying each by the
/// resolved style name (falling back to the raw style ID).
fn parse_paragraphs(document_xml: &str, style_names: &HashMap<String, String>) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();
    let mut pos = 0;

    while let Some(element) = next_element(document_xml, pos, "w:p") {
        pos = element.end;

        let style_id = next_element(element.inner, 0, "w:pStyle")
            .and_then(|style| attr_value(style.open_tag, "w:val"));
        let style_name = style_id.map(|id| style_names.get(id).map(String::as_str).unwrap_or(id));
        let style = style_name
            .map(classify_style_name)
            .unwrap_or(super::ParaStyle::Body);

        let text = paragraph_text(element.inner);
        if text.is_empty() {
            continue;
        }

        paragraphs.push(Paragraph { text, style });
    }

    paragraphs
}

/// Concatenate the text runs (`<w:t>`) of one paragraph.
fn paragraph_text(paragraph_inner: &str) -> String {
    let mut text = String::new();
    let mut pos = 0;

    while let Some(run) = next_element(paragraph_inner, pos, "w:t") {
        pos = run.end;
        text.push_str(&decode_entities(run.inner));
    }

    text.trim().to_string()
}

/// Document title from `docProps/core.xml` (`<dc:title>`).
fn extract_dc_title(core_xml: &str) -> Option<String> {
    let title = next_element(core_xml, 0, "dc:title")?;
    let title = decode_entities(title.inner).trim().to_string();
    if title.is_empty() { None } else { Some(title) }
}

struct Element<'a> {
    /// Byte offset just past this element, for resuming the scan
    end: usize,
    /// The opening tag including attributes
    open_tag: &'a str,
    /// Content between the opening and closing tags ("" when self-closed)
    inner: &'a str,
}

/// Find the next `<tag ...>...</tag>` (or self-closed `<tag .../>`) element
/// at or after `from`. The character after the tag name must be a delimiter,
/// so scanning for `w:p` never matches `w:pPr`.
fn next_element<'a>(xml: &'a str, from: usize, tag: &str) -> Option<Element<'a>> {
    let open_pat = format!("<{tag}");
    let close_pat = format!("</{tag}>");
    let mut search = from;

    loop {
        let start = search + xml[search..].find(&open_pat)?;
        let after_name = start + open_pat.len();

        match xml[after_name..].chars().next() {
            Some(c) if c == '>' || c == '/' || c.is_whitespace() => {
                let tag_end = start + xml[start..].find('>')?;
                let open_tag = &xml[start..=tag_end];

                if open_tag.ends_with("/>") {
                    return Some(Element {
                        end: tag_end + 1,
                        open_tag,
                        inner: "",
                    });
                }

                let inner_start = tag_end + 1;
                let inner_end = inner_start + xml[inner_start..].find(&close_pat)?;
                return Some(Element {
                    end: inner_end + close_pat.len(),
                    open_tag,
                    inner: &xml[inner_start..inner_end],
                });
            }
            _ => search = after_name,
        }
    }
}

/// Value of an attribute inside an opening tag.
fn attr_value<'a>(open_tag: &'a str, name: &str) -> Option<&'a str> {
    for quote in ['"', '\''] {
        let pattern = format!("{name}={quote}");
        if let Some(start) = open_tag.find(&pattern) {
            let value_start = start + pattern.len();
            let value_end = value_start + open_tag[value_start..].find(quote)?;
            return Some(&open_tag[value_start..value_end]);
        }
    }
    None
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ParaStyle;
    use std::io::Write;
    use tempfile::TempDir;

    const STYLES_XML: &str = r#"<?xml version="1.0"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:styleId="H1"><w:name w:val="heading 1"/></w:style>
  <w:style w:type="paragraph" w:styleId="FinH2"><w:name w:val="Otsikko 2"/></w:style>
  <w:style w:type="paragraph" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
</w:styles>"#;

    const DOCUMENT_XML: &str = r#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
  <w:p><w:pPr><w:pStyle w:val="H1"/></w:pPr><w:r><w:t>Chapter One</w:t></w:r></w:p>
  <w:p><w:r><w:t xml:space="preserve">Split </w:t></w:r><w:r><w:t>across runs &amp; decoded.</w:t></w:r></w:p>
  <w:p><w:pPr><w:pStyle w:val="FinH2"/></w:pPr><w:r><w:t>Toinen luku</w:t></w:r></w:p>
  <w:p><w:r><w:t>Body text.</w:t></w:r></w:p>
  <w:p/>
</w:body></w:document>"#;

    const CORE_XML: &str = r#"<?xml version="1.0"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties"
 xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>My Book</dc:title></cp:coreProperties>"#;

    fn write_test_docx(
        dir: &TempDir,
        document_xml: &str,
        styles_xml: Option<&str>,
        core_xml: Option<&str>,
    ) -> std::path::PathBuf {
        let path = dir.path().join("book.docx");
        let file = File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();

        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        if let Some(styles) = styles_xml {
            writer.start_file("word/styles.xml", options).unwrap();
            writer.write_all(styles.as_bytes()).unwrap();
        }
        if let Some(core) = core_xml {
            writer.start_file("docProps/core.xml", options).unwrap();
            writer.write_all(core.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    #[test]
    fn test_load_docx() {
        let dir = TempDir::new().unwrap();
        let path = write_test_docx(&dir, DOCUMENT_XML, Some(STYLES_XML), Some(CORE_XML));

        let document = load(&path).unwrap();

        assert_eq!(document.title.as_deref(), Some("My Book"));
        assert_eq!(document.paragraphs.len(), 4);
        assert_eq!(document.paragraphs[0].text, "Chapter One");
        assert_eq!(document.paragraphs[0].style, ParaStyle::Heading1);
        assert_eq!(document.paragraphs[1].text, "Split across runs & decoded.");
        assert_eq!(document.paragraphs[1].style, ParaStyle::Body);
        assert_eq!(document.paragraphs[2].text, "Toinen luku");
        assert_eq!(document.paragraphs[2].style, ParaStyle::Heading2);
        assert_eq!(document.paragraphs[3].style, ParaStyle::Body);
    }

    #[test]
    fn test_style_ids_classify_without_styles_part() {
        // No styles.xml: the raw style ID is classified directly
        let document_xml = r#"<w:document><w:body>
  <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Title</w:t></w:r></w:p>
</w:body></w:document>"#;
        let dir = TempDir::new().unwrap();
        let path = write_test_docx(&dir, document_xml, None, None);

        let document = load(&path).unwrap();
        assert!(document.title.is_none());
        assert_eq!(document.paragraphs[0].style, ParaStyle::Heading1);
    }

    #[test]
    fn test_not_a_zip_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.docx");
        std::fs::write(&path, b"this is not a zip").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, ConvertError::UnreadableFile { .. }));
    }

    #[test]
    fn test_missing_document_part_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.docx");
        let file = File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("unrelated.txt", options).unwrap();
        writer.write_all(b"nothing").unwrap();
        writer.finish().unwrap();

        let err = load(&path).unwrap_err();
        match err {
            ConvertError::UnreadableFile { reason, .. } => {
                assert!(reason.contains("word/document.xml"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_next_element_skips_longer_tag_names() {
        // Scanning for w:p must not stop inside w:pPr
        let xml = "<w:pPr><w:x/></w:pPr><w:p><w:t>hi</w:t></w:p>";
        let element = next_element(xml, 0, "w:p").unwrap();
        assert!(element.inner.contains("hi"));
    }

    #[test]
    fn test_attr_value_quote_styles() {
        assert_eq!(attr_value(r#"<w:pStyle w:val="H1"/>"#, "w:val"), Some("H1"));
        assert_eq!(attr_value("<w:pStyle w:val='H2'/>", "w:val"), Some("H2"));
        assert_eq!(attr_value("<w:pStyle/>", "w:val"), None);
    }
}
