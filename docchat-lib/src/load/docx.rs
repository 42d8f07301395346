use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;
use zip::ZipArchive;

use crate::{Error, Result};

const BODY: &str = "word/document.xml";

/// Extract the text of every paragraph, one line each.
///
/// Paragraphs whose text cannot be decoded are skipped.
pub(super) fn extract(bytes: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::Extraction(format!("unreadable docx archive: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(BODY)
        .map_err(|e| Error::Extraction(format!("docx without {BODY}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| Error::Extraction(format!("unreadable {BODY}: {e}")))?;

    Ok(paragraphs(&xml)?.join("\n"))
}

/// A `w:p` whose end tag has not been seen yet
#[derive(Default)]
struct OpenParagraph {
    text: String,
    broken: bool,
}

/// Text of every `w:p`, in the order the paragraphs close.
///
/// Paragraphs nest inside text boxes, so a box's paragraphs come out before
/// the paragraph anchoring it, and that paragraph keeps the runs on both
/// sides of the box. Tabs and breaks only count inside runs, which keeps the
/// tab stops declared in paragraph properties out of the text.
fn paragraphs(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut open: Vec<OpenParagraph> = Vec::new();
    let mut closed = Vec::new();
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::Extraction(format!(
                "malformed {BODY} near byte {}: {e}",
                reader.buffer_position()
            ))
        })?;

        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => open.push(OpenParagraph::default()),
                b"w:r" => run_depth += 1,
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:p" => match open.pop() {
                    Some(p) if p.broken => {
                        debug!(paragraph = closed.len() + 1, "skipping docx paragraph");
                    }
                    Some(p) => closed.push(p.text),
                    None => {}
                },
                b"w:r" => run_depth = run_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Empty(e) => match (e.name().as_ref(), open.last_mut()) {
                (b"w:p", _) => closed.push(String::new()),
                (b"w:tab", Some(p)) if run_depth > 0 => p.text.push('\t'),
                (b"w:br" | b"w:cr", Some(p)) if run_depth > 0 => p.text.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => {
                if let Some(p) = open.last_mut() {
                    match t.unescape() {
                        Ok(text) => p.text.push_str(&text),
                        Err(e) => {
                            debug!(error = %e, "undecodable docx run");
                            p.broken = true;
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(closed)
}
