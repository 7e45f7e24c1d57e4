//! C4: symmetric and asymmetric lexical similarity between two chunks of
//! text (§4.4).

use std::collections::HashSet;

/// Score `input` against `matched` in [0,1]. Picks the symmetric or
/// asymmetric path based on the length ratio of the two token streams.
pub fn score(input: &str, matched: &str) -> f64 {
    let input_tokens = tokenize(input);
    let matched_tokens = tokenize(matched);

    if input_tokens.is_empty() || matched_tokens.is_empty() {
        return 0.0;
    }

    let len_ratio = input_tokens.len().min(matched_tokens.len()) as f64
        / input_tokens.len().max(matched_tokens.len()) as f64;

    if len_ratio > 0.7 {
        symmetric(&input_tokens, &matched_tokens)
    } else {
        asymmetric(&input_tokens, &matched_tokens)
    }
}

/// Lowercase, strip punctuation, split on whitespace. Stopwords are kept
/// (§4.4: "stopwords are NOT removed").
fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

/// Jaccard on word sets (weight 0.6) + LCS ratio on the token stream
/// (weight 0.4).
fn symmetric(a: &[String], b: &[String]) -> f64 {
    let jaccard = jaccard_similarity(a, b);
    let lcs = lcs_ratio(a, b);
    0.6 * jaccard + 0.4 * lcs
}

/// Asymmetric containment of the shorter side (weight 0.6) + character
/// sequence-match ratio (weight 0.4).
fn asymmetric(a: &[String], b: &[String]) -> f64 {
    let containment = containment(a, b);
    let char_ratio = char_sequence_match_ratio(&a.join(" "), &b.join(" "));
    0.6 * containment + 0.4 * char_ratio
}

fn jaccard_similarity(a: &[String], b: &[String]) -> f64 {
    let set_a: HashSet<&String> = a.iter().collect();
    let set_b: HashSet<&String> = b.iter().collect();
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// `|intersection| / |shorter set|`.
fn containment(a: &[String], b: &[String]) -> f64 {
    let set_a: HashSet<&String> = a.iter().collect();
    let set_b: HashSet<&String> = b.iter().collect();
    let shorter = set_a.len().min(set_b.len());
    if shorter == 0 {
        return 0.0;
    }
    set_a.intersection(&set_b).count() as f64 / shorter as f64
}

/// Length of the longest common subsequence of tokens, normalised by the
/// length of the longer stream.
fn lcs_ratio(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let longest = a.len().max(b.len());
    lcs_len(a, b) as f64 / longest as f64
}

fn lcs_len(a: &[String], b: &[String]) -> usize {
    let (n, m) = (a.len(), b.len());
    let mut prev = vec![0usize; m + 1];
    let mut curr = vec![0usize; m + 1];
    for i in 1..=n {
        for j in 1..=m {
            curr[j] = if a[i - 1] == b[j - 1] {
                prev[j - 1] + 1
            } else {
                prev[j].max(curr[j - 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[m]
}

/// `difflib`-style ratio: `2 * matches / (len(a) + len(b))` over the
/// longest common contiguous-match total found via a simple LCS on chars,
/// matching Python's `SequenceMatcher.ratio()` definition closely enough
/// for a surface-similarity signal.
fn char_sequence_match_ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() && b_chars.is_empty() {
        return 1.0;
    }
    if a_chars.is_empty() || b_chars.is_empty() {
        return 0.0;
    }
    let matches = longest_common_subsequence_len(&a_chars, &b_chars);
    2.0 * matches as f64 / (a_chars.len() + b_chars.len()) as f64
}

fn longest_common_subsequence_len(a: &[char], b: &[char]) -> usize {
    let (n, m) = (a.len(), b.len());
    let mut prev = vec![0usize; m + 1];
    let mut curr = vec![0usize; m + 1];
    for i in 1..=n {
        for j in 1..=m {
            curr[j] = if a[i - 1] == b[j - 1] {
                prev[j - 1] + 1
            } else {
                prev[j].max(curr[j - 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[m]
}
