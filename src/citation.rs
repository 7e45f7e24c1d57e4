//! C5: heuristic citation detection and the penalty it applies to a
//! candidate match's combined score (§4.5).

use std::sync::LazyLock;

use regex::{Regex, RegexSet};

/// The fixed penalty factor applied once per chunk when a citation is
/// present and the matched source is not the cited one.
pub const CITATION_PENALTY: f64 = 0.15;

static CITATION_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"\([A-Z][A-Za-z.\-]*(?:\s+(?:et al\.?|&|and)\s+[A-Za-z.\-]+)?,\s*\d{4}\)", // (Name, YYYY)
        r"\[\d{1,3}\]",                                                             // [N]
        r"10\.\d{4,}/",                                                             // DOI prefix
        r"https?://",                                                               // bare URL
    ])
    .expect("citation pattern set is a fixed, known-valid set")
});

/// Returns true iff `text` contains at least one citation marker (§4.5).
/// Detection fires once per chunk regardless of how many markers appear.
pub fn has_citation(text: &str) -> bool {
    CITATION_PATTERNS.is_match(text)
}

/// Applies the citation penalty to `combined` when `input_chunk` carries a
/// citation and `cited_source_title` (the name the citation appears to
/// reference, if extractable) does not match `matched_doc_title`.
///
/// The source text rarely lets us resolve the cited name to a concrete
/// document, so the conservative rule implemented here is: any citation in
/// the input chunk whose matched source isn't named in the same sentence
/// triggers the penalty. This follows §4.5's stated intent — citing a
/// source should not be mistaken for copying it — without inventing a
/// bibliographic resolver out of scope for this component.
pub fn apply_penalty(combined: f64, input_chunk: &str, matched_doc_title: &str) -> f64 {
    if has_citation(input_chunk) && !cites_source(input_chunk, matched_doc_title) {
        combined * (1.0 - CITATION_PENALTY)
    } else {
        combined
    }
}

/// Best-effort check for whether the visible citation in `text` names
/// `doc_title` (case-insensitive substring match on the bracketed name).
fn cites_source(text: &str, doc_title: &str) -> bool {
    if doc_title.is_empty() {
        return false;
    }
    static NAME_CAPTURE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\(([^,)]+),\s*\d{4}\)").expect("valid regex"));
    let lower_title = doc_title.to_lowercase();
    NAME_CAPTURE.captures_iter(text).any(|cap| {
        cap.get(1)
            .map(|m| lower_title.contains(&m.as_str().to_lowercase()))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_name_year_citation() {
        assert!(has_citation("As stated in (Smith, 2020), copying happens."));
    }

    #[test]
    fn detects_numeric_bracket_citation() {
        assert!(has_citation("This was shown previously [12]."));
    }

    #[test]
    fn detects_doi() {
        assert!(has_citation("see 10.1000/xyz123 for details"));
    }

    #[test]
    fn detects_bare_url() {
        assert!(has_citation("see https://example.com/paper for details"));
    }

    #[test]
    fn plain_text_has_no_citation() {
        assert!(!has_citation("just an ordinary sentence with no markers"));
    }

    #[test]
    fn penalty_reduces_score_by_fixed_fraction() {
        let combined = 0.80;
        let penalised = apply_penalty(combined, "As stated in (Smith, 2020), it happened.", "Unrelated Paper");
        assert!((penalised - combined * 0.85).abs() < 1e-9);
    }

    #[test]
    fn no_penalty_without_citation() {
        let combined = 0.80;
        let penalised = apply_penalty(combined, "no citation here at all", "Some Paper");
        assert_eq!(penalised, combined);
    }

    #[test]
    fn no_penalty_when_citation_names_the_matched_source() {
        let combined = 0.80;
        let penalised = apply_penalty(combined, "As stated in (Smith, 2020), it happened.", "Smith");
        assert_eq!(penalised, combined);
    }
}
