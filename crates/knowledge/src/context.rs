//! Assembly of the grounding context sent to the LLM.

use crate::config::RetrievalConfig;
use crate::sentences::ScoredSentence;
use crate::similarity::QaHit;
use crate::text::{collapse_whitespace, truncate_with_ellipsis};
use crate::types::Document;

/// Context text used when retrieval produced nothing.
pub const NOTHING_FOUND_CONTEXT: &str = "Релевантные методические материалы не найдены.";

/// Rules appended to every grounded context.
pub const ANSWER_POLICY: &str = "ПРАВИЛА ОТВЕТА:
- Используй только сведения из приведенных материалов, ничего не добавляй от себя.
- Указывай источник: номер и название методички.
- Если сведений недостаточно, прямо напиши: \"В предоставленных материалах недостаточно информации для ответа на этот вопрос\".";

/// A QA hit together with the document it links to, if any.
#[derive(Debug, Clone)]
pub struct QaContext {
    pub hit: QaHit,
    pub document: Option<Document>,
}

/// A matched document with its best sentences.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    pub document: Document,
    /// Best first
    pub sentences: Vec<ScoredSentence>,
}

impl DocumentContext {
    pub fn best_score(&self) -> u32 {
        self.sentences.first().map(|s| s.score).unwrap_or(0)
    }

    pub fn best_sentence(&self) -> Option<&str> {
        self.sentences.first().map(|s| s.text.as_str())
    }
}

/// Everything retrieval found for one question.
#[derive(Debug, Clone, Default)]
pub struct RankedContext {
    pub qa: Vec<QaContext>,
    pub documents: Vec<DocumentContext>,
}

impl RankedContext {
    pub fn is_empty(&self) -> bool {
        self.qa.is_empty() && self.documents.is_empty()
    }
}

/// The assembled context, or the explicit absence of one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptContext {
    NothingFound,
    Grounded(String),
}

impl PromptContext {
    /// Text to embed in the instruction.
    pub fn text(&self) -> &str {
        match self {
            Self::NothingFound => NOTHING_FOUND_CONTEXT,
            Self::Grounded(text) => text,
        }
    }

    pub fn is_grounded(&self) -> bool {
        matches!(self, Self::Grounded(_))
    }
}

/// Renders a [`RankedContext`] into bounded text.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    max_sentence_chars: usize,
    max_context_chars: usize,
    excerpt_chars: usize,
}

impl ContextAssembler {
    pub fn new(config: &RetrievalConfig) -> Self {
        Self {
            max_sentence_chars: config.max_sentence_chars,
            max_context_chars: config.max_context_chars,
            excerpt_chars: config.snippet_chars,
        }
    }

    /// Build the context: QA pairs first, then numbered documents, then the
    /// answer policy. Material is cut so the whole text fits the budget.
    pub fn assemble(&self, ranked: &RankedContext) -> PromptContext {
        if ranked.is_empty() {
            return PromptContext::NothingFound;
        }

        let mut material = String::new();

        if !ranked.qa.is_empty() {
            material.push_str("ГОТОВЫЕ ОТВЕТЫ:\n");
            for qa in &ranked.qa {
                material.push_str(&format!("Вопрос: {}\n", qa.hit.pair.question.trim()));
                material.push_str(&format!("Ответ: {}\n", qa.hit.pair.answer.trim()));
                if let Some(doc) = &qa.document {
                    material.push_str(&format!("Источник: {}", doc.display_title()));
                    if let Some(author) = &doc.author {
                        material.push_str(&format!(" ({})", author));
                    }
                    material.push('\n');
                }
                material.push('\n');
            }
        }

        if !ranked.documents.is_empty() {
            material.push_str("МЕТОДИЧЕСКИЕ МАТЕРИАЛЫ:\n");
            for (index, ctx) in ranked.documents.iter().enumerate() {
                let doc = &ctx.document;
                material.push_str(&format!("Методичка №{}: {}\n", index + 1, doc.display_title()));
                if let Some(author) = &doc.author {
                    material.push_str(&format!("Автор: {}\n", author));
                }
                if let Some(subject) = &doc.subject {
                    material.push_str(&format!("Предмет: {}\n", subject));
                }

                if ctx.sentences.is_empty() {
                    let excerpt =
                        truncate_with_ellipsis(&collapse_whitespace(&doc.body), self.excerpt_chars);
                    material.push_str(&format!("Фрагмент: {}\n", excerpt));
                } else {
                    for sentence in &ctx.sentences {
                        let text = collapse_whitespace(&sentence.text);
                        material.push_str(&format!(
                            "- {}\n",
                            truncate_with_ellipsis(&text, self.max_sentence_chars)
                        ));
                    }
                }
                material.push('\n');
            }
        }

        let separator = "\n\n";
        let budget = self
            .max_context_chars
            .saturating_sub(ANSWER_POLICY.chars().count() + separator.len());
        let material = material.trim_end();
        let material: String = if material.chars().count() > budget {
            tracing::debug!(
                "Context material cut from {} to {} chars",
                material.chars().count(),
                budget
            );
            material.chars().take(budget).collect()
        } else {
            material.to_string()
        };

        PromptContext::Grounded(format!("{}{}{}", material, separator, ANSWER_POLICY))
    }
}
