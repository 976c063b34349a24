//! Question-to-question similarity.
//!
//! Ratcliff/Obershelp: find the longest common block, recurse on the pieces
//! to its left and right, and score `2 * matched / total_len`. Both inputs
//! are lowercased and whitespace-collapsed first.
//!
//! When several longest blocks tie, the earliest one in the first argument
//! is taken, so `ratio(a, b)` and `ratio(b, a)` can differ slightly.
//! [`similarity`] takes the larger of the two and is commutative.

use crate::text::collapse_whitespace;
use crate::types::QaPair;

/// A stored QA pair scored against a question.
#[derive(Debug, Clone, PartialEq)]
pub struct QaHit {
    pub pair: QaPair,
    pub score: f64,
}

fn normalize(text: &str) -> Vec<char> {
    collapse_whitespace(&text.to_lowercase()).chars().collect()
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]` as `(i, j, len)`.
///
/// Ties resolve to the smallest `i`, then the smallest `j`.
fn longest_match(
    a: &[char],
    b: &[char],
    (alo, ahi): (usize, usize),
    (blo, bhi): (usize, usize),
) -> (usize, usize, usize) {
    let width = bhi - blo + 1;
    let mut best = (alo, blo, 0);
    let mut prev = vec![0usize; width];
    let mut cur = vec![0usize; width];

    for i in alo..ahi {
        for j in blo..bhi {
            let slot = j - blo + 1;
            if a[i] == b[j] {
                let len = prev[slot - 1] + 1;
                cur[slot] = len;
                if len > best.2 {
                    best = (i + 1 - len, j + 1 - len, len);
                }
            } else {
                cur[slot] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    best
}

/// Total size of the recursively found matching blocks.
fn matched_chars(a: &[char], b: &[char]) -> usize {
    let mut total = 0;
    let mut pending = vec![((0, a.len()), (0, b.len()))];

    while let Some(((alo, ahi), (blo, bhi))) = pending.pop() {
        let (i, j, len) = longest_match(a, b, (alo, ahi), (blo, bhi));
        if len == 0 {
            continue;
        }
        total += len;
        if alo < i && blo < j {
            pending.push(((alo, i), (blo, j)));
        }
        if i + len < ahi && j + len < bhi {
            pending.push(((i + len, ahi), (j + len, bhi)));
        }
    }

    total
}

/// One-directional Ratcliff/Obershelp ratio in [0, 1].
///
/// Two empty inputs score 0.0: there is nothing to match on.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }
    2.0 * matched_chars(&a, &b) as f64 / total as f64
}

/// Commutative similarity score in [0, 1].
pub fn similarity(a: &str, b: &str) -> f64 {
    ratio(a, b).max(ratio(b, a))
}

/// Score `pairs` against `question`, keep those at or above `threshold`,
/// best first, at most `limit`.
///
/// Pairs with equal scores keep their input order.
pub fn rank_qa_pairs(question: &str, pairs: &[QaPair], threshold: f64, limit: usize) -> Vec<QaHit> {
    let mut hits: Vec<QaHit> = pairs
        .iter()
        .filter_map(|pair| {
            let score = similarity(question, &pair.question);
            (score >= threshold).then(|| QaHit {
                pair: pair.clone(),
                score,
            })
        })
        .collect();

    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits.truncate(limit);
    hits
}
