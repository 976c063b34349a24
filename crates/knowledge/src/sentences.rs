//! Sentence splitting and relevance scoring.

use crate::config::RetrievalConfig;
use crate::text::keywords;
use std::sync::Arc;

/// Strategy for cutting a body into sentences.
pub trait SentenceSplitter: Send + Sync {
    /// Trimmed, non-empty sentences borrowed from `text`.
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

/// Boundary after a run of `.`, `!` or `?` that is followed by whitespace and
/// then an uppercase letter or a digit.
///
/// Abbreviations followed by a capitalized name ("И. Иванов") still split.
#[derive(Debug, Clone, Copy, Default)]
pub struct PunctuationSplitter;

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

impl SentenceSplitter for PunctuationSplitter {
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut sentences = Vec::new();
        let mut start = 0;
        let mut i = 0;

        while i < chars.len() {
            if !is_terminal(chars[i].1) {
                i += 1;
                continue;
            }

            let mut end = i;
            while end + 1 < chars.len() && is_terminal(chars[end + 1].1) {
                end += 1;
            }

            let mut next = end + 1;
            while next < chars.len() && chars[next].1.is_whitespace() {
                next += 1;
            }

            let boundary = next > end + 1
                && next < chars.len()
                && (chars[next].1.is_uppercase() || chars[next].1.is_numeric());

            if boundary {
                let cut = chars[end].0 + chars[end].1.len_utf8();
                push_trimmed(&mut sentences, &text[start..cut]);
                start = chars[next].0;
                i = next;
            } else {
                i = end + 1;
            }
        }

        push_trimmed(&mut sentences, &text[start..]);
        sentences
    }
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, piece: &'a str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        out.push(piece);
    }
}

/// A sentence with its relevance score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredSentence {
    pub text: String,
    pub score: u32,
    pub word_count: usize,
}

/// Scores sentences of a body against a question.
///
/// Scoring: `keyword_weight` points per distinct question keyword contained
/// in the sentence, one point per occurrence of each topical term, one point
/// when the word count is within the preferred range. If the question has
/// keywords, a sentence with none of them scores zero.
#[derive(Clone)]
pub struct SentenceRanker {
    splitter: Arc<dyn SentenceSplitter>,
    keyword_min_chars: usize,
    keyword_weight: u32,
    topical_terms: Vec<String>,
    min_words: usize,
    max_words: usize,
}

impl SentenceRanker {
    pub fn new(config: &RetrievalConfig) -> Self {
        Self {
            splitter: Arc::new(PunctuationSplitter),
            keyword_min_chars: config.question_keyword_min_chars,
            keyword_weight: config.keyword_weight,
            topical_terms: config
                .topical_terms
                .iter()
                .map(|t| t.to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            min_words: config.min_sentence_words,
            max_words: config.max_sentence_words,
        }
    }

    /// Replace the sentence splitting strategy.
    pub fn with_splitter(mut self, splitter: Arc<dyn SentenceSplitter>) -> Self {
        self.splitter = splitter;
        self
    }

    /// Keywords of `question` as used for scoring.
    pub fn question_keywords(&self, question: &str) -> Vec<String> {
        keywords(question, self.keyword_min_chars)
    }

    /// Top `max_sentences` sentences of `body` for `question`.
    pub fn rank(&self, body: &str, question: &str, max_sentences: usize) -> Vec<ScoredSentence> {
        self.rank_with_keywords(body, &self.question_keywords(question), max_sentences)
    }

    /// Like [`rank`](Self::rank) with precomputed keywords.
    pub fn rank_with_keywords(
        &self,
        body: &str,
        keywords: &[String],
        max_sentences: usize,
    ) -> Vec<ScoredSentence> {
        if body.trim().is_empty() || max_sentences == 0 {
            return Vec::new();
        }

        let mut scored: Vec<ScoredSentence> = self
            .splitter
            .split(body)
            .into_iter()
            .filter_map(|sentence| {
                let (score, word_count) = self.score(sentence, keywords);
                (score > 0).then(|| ScoredSentence {
                    text: sentence.trim().to_string(),
                    score,
                    word_count,
                })
            })
            .collect();

        // Stable: equal (score, length) keep document order
        scored.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.word_count.cmp(&a.word_count))
        });
        scored.truncate(max_sentences);
        scored
    }

    /// Score a single sentence, returning `(score, word_count)`.
    pub fn score(&self, sentence: &str, keywords: &[String]) -> (u32, usize) {
        let lower = sentence.to_lowercase();
        let word_count = sentence.split_whitespace().count();

        let keyword_hits = keywords
            .iter()
            .filter(|k| lower.contains(k.as_str()))
            .count() as u32;

        if !keywords.is_empty() && keyword_hits == 0 {
            return (0, word_count);
        }

        let topical: u32 = self
            .topical_terms
            .iter()
            .map(|term| lower.matches(term.as_str()).count() as u32)
            .sum();

        let length_bonus = u32::from((self.min_words..=self.max_words).contains(&word_count));

        (
            keyword_hits * self.keyword_weight + topical + length_bonus,
            word_count,
        )
    }
}

impl std::fmt::Debug for SentenceRanker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentenceRanker")
            .field("keyword_min_chars", &self.keyword_min_chars)
            .field("keyword_weight", &self.keyword_weight)
            .field("min_words", &self.min_words)
            .field("max_words", &self.max_words)
            .finish_non_exhaustive()
    }
}
