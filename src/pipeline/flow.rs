//! Flow-document extraction: unpack a DOCX into newline-separated paragraphs.
//!
//! A DOCX file is a zip container; the body text lives in
//! `word/document.xml` as WordprocessingML. The source format already
//! encodes reading order, so extraction is a single forward scan of the
//! XML event stream:
//!
//! | Element | Emitted |
//! |---------|---------|
//! | `w:t`   | its text content |
//! | `w:tab` inside `w:r` | `\t` |
//! | `w:br`, `w:cr` inside `w:r` | `\n` |
//! | end of `w:p` | `\n` |
//!
//! Everything else (run properties, drawings, field codes) is skipped.
//! Tab-stop definitions (`w:pPr/w:tabs/w:tab`) share the `tab` name with
//! real tabs, so tabs and breaks only count inside a run.

use crate::error::IngestError;
use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract the text of a DOCX held in memory.
pub fn extract_flow(bytes: &[u8], file_name: &str) -> Result<String, IngestError> {
    let corrupt = |detail: String| IngestError::CorruptFlowDocument {
        file_name: file_name.to_string(),
        detail,
    };

    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| corrupt(format!("not a zip container: {e}")))?;
    let mut entry = archive
        .by_name(DOCUMENT_PART)
        .map_err(|_| corrupt(format!("missing {DOCUMENT_PART}")))?;
    let mut xml = Vec::new();
    entry
        .read_to_end(&mut xml)
        .map_err(|e| corrupt(format!("failed to inflate {DOCUMENT_PART}: {e}")))?;

    let text = document_xml_to_text(&xml).map_err(corrupt)?;
    debug!(
        "Unpacked '{}': {} bytes of XML → {} chars",
        file_name,
        xml.len(),
        text.len()
    );
    Ok(text)
}

/// Walk WordprocessingML and collect paragraph text.
fn document_xml_to_text(xml: &[u8]) -> Result<String, String> {
    let mut reader = XmlReader::from_reader(xml);
    reader.trim_text(false);
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut in_text = false;
    let mut run_depth = 0usize;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"r" => run_depth += 1,
                b"t" => in_text = true,
                b"tab" if run_depth > 0 => out.push('\t'),
                b"br" | b"cr" if run_depth > 0 => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"tab" if run_depth > 0 => out.push('\t'),
                b"br" | b"cr" if run_depth > 0 => out.push('\n'),
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if in_text {
                    let text = t
                        .unescape()
                        .unwrap_or_else(|_| String::from_utf8_lossy(&t));
                    out.push_str(&text);
                }
            }
            Ok(Event::CData(t)) => {
                if in_text {
                    out.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"r" => run_depth = run_depth.saturating_sub(1),
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(format!(
                    "XML error at byte {}: {err}",
                    reader.buffer_position()
                ))
            }
            _ => {}
        }
    }

    Ok(out)
}

/// Strip a namespace prefix: `w:t` → `t`.
fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().rposition(|&b| b == b':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    /// Build a minimal DOCX container around `body` (inner `w:body` XML).
    pub(crate) fn docx_with_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("[Content_Types].xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<Types/>").unwrap();
        zip.start_file(DOCUMENT_PART, SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn paragraphs_become_lines() {
        let docx = docx_with_body(
            "<w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p>\
             <w:p><w:r><w:t xml:space=\"preserve\">Senior </w:t></w:r><w:r><w:t>Engineer</w:t></w:r></w:p>",
        );
        let text = extract_flow(&docx, "cv.docx").unwrap();
        assert_eq!(text, "Jane Doe\nSenior Engineer\n");
    }

    #[test]
    fn tabs_breaks_and_entities() {
        let docx = docx_with_body(
            "<w:p><w:r><w:t>R&amp;D</w:t><w:tab/><w:t>2019</w:t><w:br/><w:t>Berlin</w:t></w:r></w:p><w:p/>",
        );
        let text = extract_flow(&docx, "cv.docx").unwrap();
        assert_eq!(text, "R&D\t2019\nBerlin\n\n");
    }

    #[test]
    fn tab_stop_definitions_are_not_tabs() {
        let para = |text: &str| {
            format!(
                "<w:p><w:pPr><w:tabs><w:tab w:val=\"left\" w:pos=\"720\"/></w:tabs></w:pPr>\
                 <w:r><w:t>{text}</w:t></w:r></w:p>"
            )
        };
        let docx = docx_with_body(&format!("{}{}", para("Jane Doe"), para("Skills")));
        let text = extract_flow(&docx, "cv.docx").unwrap();
        assert_eq!(text, "Jane Doe\nSkills\n");
        assert_eq!(crate::pipeline::sanitize::sanitize(&text), "Jane Doe\nSkills");
    }

    #[test]
    fn run_properties_are_ignored() {
        let docx = docx_with_body(
            "<w:p><w:pPr><w:pStyle w:val=\"Heading1\"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>Skills</w:t></w:r></w:p>",
        );
        assert_eq!(extract_flow(&docx, "cv.docx").unwrap(), "Skills\n");
    }

    #[test]
    fn not_a_zip_is_corrupt() {
        let err = extract_flow(b"plain bytes", "cv.docx").unwrap_err();
        assert!(matches!(err, IngestError::CorruptFlowDocument { .. }));
        assert_eq!(err.category(), ErrorCategory::Extraction);
    }

    #[test]
    fn missing_document_part_is_corrupt() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("other.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<x/>").unwrap();
        let bytes = zip.finish().unwrap().into_inner();
        let err = extract_flow(&bytes, "cv.docx").unwrap_err();
        assert!(err.to_string().contains("word/document.xml"), "{err}");
    }

    #[test]
    fn local_name_strips_prefix() {
        assert_eq!(local_name(b"w:t"), b"t");
        assert_eq!(local_name(b"p"), b"p");
    }
}
