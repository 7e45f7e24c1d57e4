//! PDF ingest adapter (§6): object fetch from a MinIO/S3-compatible store
//! plus PDF text extraction and the classification/length filter, feeding
//! the standard ingest/check path. Kept in its own module with a narrow
//! trait boundary since it is an external collaborator from the
//! detector's viewpoint (§1).

mod extract;
mod minio;

pub use extract::extract_text;
pub use minio::{MinioObjectStore, ObjectStoreClient};

use crate::error::PdfExtractionError;

/// A segment of extracted PDF text tagged with the element kind the
/// extractor inferred, so the discard rules in §6 can be applied.
#[derive(Debug, Clone)]
pub struct ExtractedSegment {
    pub kind: SegmentKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Body,
    TableOfContents,
    Header,
    Footer,
    ListOfFigures,
    ListOfTables,
    Bibliography,
}

/// §6: discard table-of-contents, header, footer, list-of-figures,
/// list-of-tables, bibliography segments, and any segment shorter than
/// `min_chars`. Remaining text is concatenated for the standard ingest
/// path.
pub fn filter_segments(segments: Vec<ExtractedSegment>, min_chars: usize) -> Result<String, PdfExtractionError> {
    let kept: Vec<String> = segments
        .into_iter()
        .filter(|segment| segment.kind == SegmentKind::Body)
        .filter(|segment| segment.text.trim().chars().count() >= min_chars)
        .map(|segment| segment.text)
        .collect();

    if kept.is_empty() {
        return Err(PdfExtractionError::EmptyAfterFiltering);
    }
    Ok(kept.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(kind: SegmentKind, text: &str) -> ExtractedSegment {
        ExtractedSegment {
            kind,
            text: text.to_string(),
        }
    }

    #[test]
    fn discards_non_body_segments() {
        let segments = vec![
            segment(SegmentKind::TableOfContents, &"x".repeat(500)),
            segment(SegmentKind::Bibliography, &"y".repeat(500)),
            segment(SegmentKind::Body, &"this is the actual body text that matters".repeat(10)),
        ];
        let result = filter_segments(segments, 200).unwrap();
        assert!(result.contains("actual body text"));
        assert!(!result.contains("xxxx"));
    }

    #[test]
    fn discards_short_body_segments() {
        let segments = vec![segment(SegmentKind::Body, "too short")];
        let result = filter_segments(segments, 200);
        assert!(result.is_err());
    }
}
