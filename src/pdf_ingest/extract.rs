//! PDF text extraction via `lopdf`, grounded on the `extract_pdf_text`
//! panic-safety pattern from the doc-simfinder reference (untrusted PDFs
//! are parsed behind `catch_unwind` since malformed input can panic deep
//! inside third-party parsers).

use std::panic::{catch_unwind, AssertUnwindSafe};

use lopdf::Document as LopdfDocument;

use super::{ExtractedSegment, SegmentKind};
use crate::error::PdfExtractionError;

const MAX_PDF_SIZE: usize = 10 * 1024 * 1024;

/// Extracts per-page text segments from raw PDF bytes. Every page is
/// classified `Body` for now: `lopdf` gives us text content but not layout
/// roles, so the table-of-contents/header/footer/bibliography
/// classification the §6 filter rules expect is approximated by text-shape
/// heuristics rather than true layout analysis.
pub fn extract_text(bytes: &[u8]) -> Result<Vec<ExtractedSegment>, PdfExtractionError> {
    if bytes.len() > MAX_PDF_SIZE {
        return Err(PdfExtractionError::Malformed(format!(
            "PDF exceeds max size of {MAX_PDF_SIZE} bytes"
        )));
    }

    let bytes = bytes.to_vec();
    let result = catch_unwind(AssertUnwindSafe(|| extract_inner(&bytes)));
    match result {
        Ok(inner) => inner,
        Err(_) => Err(PdfExtractionError::Malformed(
            "PDF parser panicked on malformed input".to_string(),
        )),
    }
}

fn extract_inner(bytes: &[u8]) -> Result<Vec<ExtractedSegment>, PdfExtractionError> {
    let document =
        LopdfDocument::load_mem(bytes).map_err(|e| PdfExtractionError::Malformed(e.to_string()))?;

    let mut segments = Vec::new();
    for (page_number, page_id) in document.get_pages() {
        let text = document
            .extract_text(&[page_number])
            .map_err(|e| PdfExtractionError::Malformed(e.to_string()))?;
        let _ = page_id;
        if text.trim().is_empty() {
            continue;
        }
        segments.push(ExtractedSegment {
            kind: classify(&text),
            text,
        });
    }

    Ok(segments)
}

/// Cheap heuristic classification so the §6 discard rules have something
/// to act on: short, heading-shaped pages are treated as front/back matter.
fn classify(text: &str) -> SegmentKind {
    let lower = text.to_lowercase();
    if lower.contains("table of contents") || lower.contains("contents\n") {
        SegmentKind::TableOfContents
    } else if lower.starts_with("bibliography") || lower.starts_with("references") {
        SegmentKind::Bibliography
    } else if lower.contains("list of figures") {
        SegmentKind::ListOfFigures
    } else if lower.contains("list of tables") {
        SegmentKind::ListOfTables
    } else {
        SegmentKind::Body
    }
}
