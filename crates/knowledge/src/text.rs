//! Tokenization and small string helpers shared by the ranking stages.

use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Split text into lowercase alphanumeric word tokens.
///
/// Word boundaries follow Unicode segmentation, so Cyrillic and other
/// non-Latin scripts tokenize the same way as ASCII. Characters that are
/// not alphanumeric (apostrophes, dots inside numbers) split a word.
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words()
        .flat_map(|word| word.split(|c: char| !c.is_alphanumeric()))
        .map(|piece| {
            piece
                .to_lowercase()
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
        })
        .filter(|token| !token.is_empty())
        .collect()
}

/// Distinct tokens of at least `min_chars` characters, in first-seen order.
pub fn keywords(text: &str, min_chars: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|token| token.chars().count() >= min_chars)
        .filter(|token| seen.insert(token.clone()))
        .collect()
}

/// Replace every whitespace run with a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to `max_chars` characters, marking the cut with `...`.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let mut cut: String = text.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    } else {
        text.to_string()
    }
}
