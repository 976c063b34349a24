//! Question answering orchestration.
//!
//! States, first success wins:
//! 1. QA shortcut: a stored QA pair similar enough to the question
//! 2. Lexical document search; no hits ends with a fixed answer
//! 3. Sentence ranking and context assembly
//! 4. LLM summarization
//! 5. Quality gate, with the deterministic fallback on rejection or failure
//! 6. Source list

use crate::config::RetrievalConfig;
use crate::context::{ContextAssembler, DocumentContext, QaContext, RankedContext};
use crate::fallback::FallbackComposer;
use crate::lexical::{DocumentField, LexicalFilter, QaField};
use crate::quality::QualityGate;
use crate::sentences::{SentenceRanker, SentenceSplitter};
use crate::similarity::rank_qa_pairs;
use crate::store::MethodicStore;
use crate::summarizer::{LlmReply, Summarizer};
use crate::text::{collapse_whitespace, truncate_with_ellipsis};
use crate::types::{AnswerSource, ChatRequest, ChatResponse, Document, QaPair, SourceSnippet};
use methodics_core::{AppError, AppResult};
use std::sync::Arc;
use tracing::Instrument;

/// Answer when the document search finds nothing.
pub const NOTHING_FOUND_ANSWER: &str = "По вашему запросу не найдено информации в методических материалах. \
     Попробуйте переформулировать вопрос или обратитесь к администратору.";

const MULTIPLE_QA_HEADER: &str = "Найдено несколько похожих вопросов:";

/// Number of QA answers combined on the shortcut path.
const SHORTCUT_ANSWERS: usize = 3;

pub struct ChatService {
    store: Arc<dyn MethodicStore>,
    summarizer: Summarizer,
    config: RetrievalConfig,
    ranker: SentenceRanker,
    assembler: ContextAssembler,
    gate: QualityGate,
    composer: FallbackComposer,
}

impl ChatService {
    pub fn new(store: Arc<dyn MethodicStore>, summarizer: Summarizer, config: RetrievalConfig) -> Self {
        Self {
            ranker: SentenceRanker::new(&config),
            assembler: ContextAssembler::new(&config),
            gate: QualityGate::new(&config),
            composer: FallbackComposer::new(&config),
            store,
            summarizer,
            config,
        }
    }

    /// Replace the sentence splitting strategy.
    pub fn with_splitter(mut self, splitter: Arc<dyn SentenceSplitter>) -> Self {
        self.ranker = self.ranker.with_splitter(splitter);
        self
    }

    pub fn store(&self) -> &dyn MethodicStore {
        self.store.as_ref()
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    /// Lexical search over title, body, subject and author.
    pub fn search_documents(&self, query: &str, limit: usize) -> AppResult<Vec<Document>> {
        let filter = LexicalFilter::from_query(
            query,
            self.config.search_keyword_min_chars,
            &DocumentField::ALL,
        );
        if filter.is_empty() {
            tracing::debug!("No usable keywords in query");
            return Ok(Vec::new());
        }
        self.store.filter_documents(&filter, limit)
    }

    /// Lexical search over QA questions and answers.
    pub fn search_qa_text(&self, query: &str, limit: usize) -> AppResult<Vec<QaPair>> {
        let filter =
            LexicalFilter::from_query(query, self.config.search_keyword_min_chars, &QaField::ALL);
        self.store.filter_qa_pairs(&filter, limit)
    }

    /// QA pairs whose question is similar to `query`, with linked documents.
    pub fn search_qa(&self, query: &str, threshold: f64, limit: usize) -> AppResult<Vec<QaContext>> {
        let pairs = self.store.list_qa_pairs()?;
        rank_qa_pairs(query, &pairs, threshold, limit)
            .into_iter()
            .map(|hit| -> AppResult<QaContext> {
                let document = match hit.pair.document_id {
                    Some(id) => self.store.get_document(id)?,
                    None => None,
                };
                Ok(QaContext { hit, document })
            })
            .collect()
    }

    /// Answer a question.
    ///
    /// Storage failures are returned as errors; LLM problems never are.
    pub async fn answer(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        let span = tracing::info_span!("chat", question = %request.question);
        self.answer_inner(request).instrument(span).await
    }

    async fn answer_inner(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        let question = request.question.trim();

        let shortcut_threshold = match request.similarity_threshold {
            Some(t) if !t.is_finite() || !(0.0..=1.0).contains(&t) => {
                return Err(AppError::Validation(
                    "similarity_threshold must be between 0 and 1".to_string(),
                ));
            }
            Some(t) => t,
            None => self.config.qa_shortcut_threshold,
        };

        // One ranking pass serves both the shortcut and the related pairs
        let floor = shortcut_threshold.min(self.config.qa_context_threshold);
        let qa_hits = self.search_qa(question, floor, self.config.qa_limit)?;

        let shortcut: Vec<QaContext> = qa_hits
            .iter()
            .filter(|qa| qa.hit.score >= shortcut_threshold)
            .cloned()
            .collect();
        if !shortcut.is_empty() {
            tracing::info!(
                "Answered from {} stored QA pair(s), best score {:.3}",
                shortcut.len(),
                shortcut[0].hit.score
            );
            return Ok(self.answer_from_qa(&shortcut));
        }

        let related_qa: Vec<QaContext> = qa_hits
            .into_iter()
            .filter(|qa| qa.hit.score >= self.config.qa_context_threshold)
            .collect();

        let documents = self.search_documents(question, request.max_results.max(1))?;
        if documents.is_empty() {
            tracing::info!("No methodics matched the question");
            return Ok(ChatResponse {
                answer: NOTHING_FOUND_ANSWER.to_string(),
                sources: Vec::new(),
                found_count: 0,
                origin: AnswerSource::NothingFound,
            });
        }
        tracing::info!("Found {} matching methodic(s)", documents.len());

        let keywords = self.ranker.question_keywords(question);
        let mut contexts: Vec<DocumentContext> = documents
            .into_iter()
            .map(|document| DocumentContext {
                sentences: self.ranker.rank_with_keywords(
                    &document.body,
                    &keywords,
                    self.config.max_sentences_per_document,
                ),
                document,
            })
            .collect();
        contexts.sort_by(|a, b| b.best_score().cmp(&a.best_score()));

        let ranked = RankedContext {
            qa: related_qa,
            documents: contexts,
        };
        let context = self.assembler.assemble(&ranked);
        tracing::debug!("Assembled context of {} chars", context.text().chars().count());

        let (answer, origin) = match self.summarizer.summarize(&context, question).await {
            LlmReply::Answer(text) => match self.gate.evaluate(&text, question) {
                Ok(()) => {
                    tracing::info!("LLM answer accepted");
                    (text, AnswerSource::Llm)
                }
                Err(rejection) => {
                    tracing::info!("LLM answer rejected: {}", rejection);
                    self.fallback(&ranked.documents, question)
                }
            },
            LlmReply::Empty => {
                tracing::info!("LLM returned no text");
                self.fallback(&ranked.documents, question)
            }
            LlmReply::Failed(reason) => {
                tracing::warn!("LLM unavailable: {}", reason);
                self.fallback(&ranked.documents, question)
            }
        };

        let sources = ranked
            .documents
            .iter()
            .take(self.config.max_sources)
            .map(|ctx| SourceSnippet::from_document(&ctx.document, self.snippet(ctx, request.full)))
            .collect();

        Ok(ChatResponse {
            answer,
            sources,
            found_count: ranked.documents.len(),
            origin,
        })
    }

    fn fallback(&self, contexts: &[DocumentContext], question: &str) -> (String, AnswerSource) {
        (self.composer.compose(contexts, question), AnswerSource::Fallback)
    }

    fn answer_from_qa(&self, hits: &[QaContext]) -> ChatResponse {
        let answer = if hits.len() == 1 {
            hits[0].hit.pair.answer.clone()
        } else {
            let mut parts = vec![MULTIPLE_QA_HEADER.to_string()];
            for (index, qa) in hits.iter().take(SHORTCUT_ANSWERS).enumerate() {
                parts.push(format!("\n{}. {}", index + 1, qa.hit.pair.answer));
            }
            parts.join("\n")
        };

        let sources = hits
            .iter()
            .take(SHORTCUT_ANSWERS)
            .filter_map(|qa| {
                qa.document.as_ref().map(|doc| {
                    let question: String = qa
                        .hit
                        .pair
                        .question
                        .chars()
                        .take(self.config.qa_snippet_chars)
                        .collect();
                    SourceSnippet::from_document(doc, format!("Связанный вопрос: {}...", question))
                })
            })
            .collect();

        ChatResponse {
            answer,
            sources,
            found_count: hits.len(),
            origin: AnswerSource::QaMatch,
        }
    }

    fn snippet(&self, ctx: &DocumentContext, full: bool) -> String {
        if full {
            return ctx.document.body.clone();
        }
        match ctx.best_sentence() {
            Some(sentence) => {
                truncate_with_ellipsis(&collapse_whitespace(sentence), self.config.max_sentence_chars)
            }
            None => truncate_with_ellipsis(&ctx.document.body, self.config.snippet_chars),
        }
    }
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("summarizer", &self.summarizer)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
