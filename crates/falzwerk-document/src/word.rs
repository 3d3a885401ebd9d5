// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Minimal WordprocessingML (.docx) container: plain paragraphs in, text runs
// out. No styles, tables or images.

use falzwerk_core::error::{FalzwerkError, Result};
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use tracing::{debug, instrument};

use crate::archive::{self, ArchiveBuilder};

/// Archive entry holding the document body.
pub const DOCUMENT_PART: &str = "word/document.xml";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const RELATIONSHIPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

/// Package `text` as a .docx, one paragraph per line.
#[instrument(skip(text), fields(text_len = text.len()))]
pub fn build_document(text: &str) -> Result<Vec<u8>> {
    let mut body = String::with_capacity(text.len() + 256);
    body.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    body.push('\n');
    body.push_str(
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    );
    body.push_str("\n<w:body>\n");
    for line in text.split('\n') {
        body.push_str("<w:p><w:r><w:t>");
        body.push_str(&escape(line));
        body.push_str("</w:t></w:r></w:p>");
    }
    body.push_str("\n</w:body>\n</w:document>");

    let mut builder = ArchiveBuilder::new();
    builder.add_entry("[Content_Types].xml", CONTENT_TYPES.as_bytes())?;
    builder.add_entry("_rels/.rels", RELATIONSHIPS.as_bytes())?;
    builder.add_entry(DOCUMENT_PART, body.as_bytes())?;
    builder.finish()
}

/// Text of every non-empty `<w:t>` run in document order, joined with single
/// spaces.
#[instrument(skip_all, fields(bytes_len = docx.len()))]
pub fn extract_text(docx: &[u8]) -> Result<String> {
    let xml = archive::read_text_entry(docx, DOCUMENT_PART)?;
    let runs = text_runs(&xml)?;
    debug!(runs = runs.len(), "Text runs extracted");
    Ok(runs.join(" "))
}

fn text_runs(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut runs = Vec::new();
    let mut current: Option<String> = None;

    loop {
        let event = reader.read_event().map_err(|err| {
            FalzwerkError::Decode(format!(
                "malformed {DOCUMENT_PART} at byte {}: {err}",
                reader.buffer_position()
            ))
        })?;

        match event {
            Event::Start(e) if e.name().as_ref() == b"w:t" => current = Some(String::new()),
            Event::End(e) if e.name().as_ref() == b"w:t" => {
                if let Some(run) = current.take().filter(|run| !run.is_empty()) {
                    runs.push(run);
                }
            }
            Event::Text(t) => {
                if let Some(run) = current.as_mut() {
                    let text = t.unescape().map_err(|err| {
                        FalzwerkError::Decode(format!("bad text in {DOCUMENT_PART}: {err}"))
                    })?;
                    run.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(run) = current.as_mut() {
                    run.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_has_the_three_parts() {
        let docx = build_document("hello").unwrap();
        assert_eq!(
            archive::entry_names(&docx).unwrap(),
            vec!["[Content_Types].xml", "_rels/.rels", DOCUMENT_PART]
        );
    }

    #[test]
    fn each_line_becomes_a_paragraph() {
        let docx = build_document("first line\nsecond line").unwrap();
        let xml = archive::read_text_entry(&docx, DOCUMENT_PART).unwrap();
        assert_eq!(xml.matches("<w:p>").count(), 2);
        assert_eq!(extract_text(&docx).unwrap(), "first line second line");
    }

    #[test]
    fn markup_characters_are_escaped() {
        let docx = build_document("Fish & Chips <cheap>").unwrap();
        let xml = archive::read_text_entry(&docx, DOCUMENT_PART).unwrap();
        assert!(xml.contains("Fish &amp; Chips &lt;cheap&gt;"));
        assert_eq!(extract_text(&docx).unwrap(), "Fish & Chips <cheap>");
    }

    #[test]
    fn empty_runs_are_skipped() {
        let xml = r#"<w:document><w:body>
            <w:p><w:r><w:t>a</w:t></w:r><w:r><w:t></w:t></w:r></w:p>
            <w:p><w:r><w:t xml:space="preserve">b c</w:t></w:r></w:p>
            <w:p><w:r><w:rPr/><w:t>d</w:t></w:r></w:p>
        </w:body></w:document>"#;
        assert_eq!(text_runs(xml).unwrap(), vec!["a", "b c", "d"]);
    }

    #[test]
    fn missing_body_part_is_a_decode_error() {
        let mut builder = ArchiveBuilder::new();
        builder.add_entry("other.xml", b"<x/>").unwrap();
        let docx = builder.finish().unwrap();
        assert!(matches!(extract_text(&docx), Err(FalzwerkError::Decode(_))));
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let mut builder = ArchiveBuilder::new();
        builder
            .add_entry(DOCUMENT_PART, b"<w:document><w:t>open</w:p>")
            .unwrap();
        let docx = builder.finish().unwrap();
        assert!(matches!(extract_text(&docx), Err(FalzwerkError::Decode(_))));
    }
}
