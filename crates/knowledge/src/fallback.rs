//! Deterministic answer built from ranked sentences.

use crate::config::RetrievalConfig;
use crate::context::DocumentContext;
use crate::text::{collapse_whitespace, keywords};

/// Returned when there are no document contexts at all.
pub const NO_MATERIAL_ANSWER: &str =
    "К сожалению, в методических материалах не найдено информации по вашему вопросу.";

/// Returned when contexts exist but none of their sentences is usable.
pub const NOT_RELEVANT_ANSWER: &str =
    "В найденных материалах есть информация, но она недостаточно релевантна вашему вопросу.";

const HEADER: &str = "На основе анализа методических материалов:";
const REFINE_HINT: &str = "\nДля получения более подробной информации уточните ваш вопрос.";
const MAX_CANDIDATES: usize = 4;

#[derive(Debug, Clone)]
pub struct FallbackComposer {
    documents: usize,
    sentences_per_document: usize,
    keyword_min_chars: usize,
    min_sentence_chars: usize,
}

impl FallbackComposer {
    pub fn new(config: &RetrievalConfig) -> Self {
        Self {
            documents: config.fallback_documents,
            sentences_per_document: config.fallback_sentences_per_document,
            keyword_min_chars: config.question_keyword_min_chars,
            min_sentence_chars: config.min_fallback_sentence_chars,
        }
    }

    /// Numbered list of the best keyword-bearing sentences of the top contexts.
    pub fn compose(&self, contexts: &[DocumentContext], question: &str) -> String {
        if contexts.is_empty() {
            return NO_MATERIAL_ANSWER.to_string();
        }

        let question_keywords = keywords(question, self.keyword_min_chars);

        let candidates: Vec<String> = contexts
            .iter()
            .take(self.documents)
            .flat_map(|ctx| ctx.sentences.iter().take(self.sentences_per_document))
            .filter(|sentence| {
                if question_keywords.is_empty() {
                    return true;
                }
                let lower = sentence.text.to_lowercase();
                question_keywords.iter().any(|k| lower.contains(k.as_str()))
            })
            .map(|sentence| collapse_whitespace(&sentence.text))
            .take(MAX_CANDIDATES)
            .collect();

        let mut selected: Vec<String> = Vec::new();
        for sentence in candidates {
            if sentence.chars().count() >= self.min_sentence_chars && !selected.contains(&sentence)
            {
                selected.push(sentence);
            }
        }

        if selected.is_empty() {
            return NOT_RELEVANT_ANSWER.to_string();
        }

        let mut parts = vec![HEADER.to_string()];
        for (index, sentence) in selected.iter().enumerate() {
            parts.push(format!("{}. {}", index + 1, sentence));
        }
        parts.push(REFINE_HINT.to_string());
        parts.join("\n")
    }
}
