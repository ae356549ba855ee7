//! Token-order-insensitive string similarity.
//!
//! Scores are integers on a 0-100 scale computed from the normalized Indel
//! similarity of the sorted, cleaned token strings.

use rapidfuzz::distance::indel;

/// A fuzzy match is accepted only when its score is strictly greater than this.
pub const FUZZY_MATCH_THRESHOLD: u8 = 50;

/// Lowercases, drops non-ASCII characters and replaces punctuation with spaces.
pub fn full_process(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

fn sorted_tokens(raw: &str) -> String {
    let processed = full_process(raw);
    let mut tokens: Vec<&str> = processed.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Similarity of two strings after sorting their tokens.
///
/// Empty input on either side scores 0.
pub fn token_sort_ratio(left: &str, right: &str) -> u8 {
    let left = sorted_tokens(left);
    let right = sorted_tokens(right);
    if left.is_empty() || right.is_empty() {
        return 0;
    }
    let similarity = indel::normalized_similarity(left.chars(), right.chars());
    (similarity * 100.0).round_ties_even().clamp(0.0, 100.0) as u8
}

/// Best-scoring option; ties go to the earliest option.
pub fn extract_one<'a, I>(query: &str, options: I) -> Option<(&'a str, u8)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, u8)> = None;
    for option in options {
        let score = token_sort_ratio(query, option);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((option, score));
        }
    }
    best
}
