//! Retrieval domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title shown for documents stored without one.
pub const UNTITLED: &str = "Без названия";

/// A stored methodic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub subject: Option<String>,
    pub author: Option<String>,
    /// Full text
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Title for display, substituting a placeholder when blank.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }
}

/// Input for creating a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    pub body: String,
}

/// A curated question/answer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    pub id: i64,
    pub question: String,
    pub answer: String,
    /// Methodic this pair was derived from
    pub document_id: Option<i64>,
}

/// Input for creating a QA pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQaPair {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub document_id: Option<i64>,
}

/// Row counts reported by a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub documents: u64,
    pub qa_pairs: u64,
    /// QA pairs that reference a document
    pub linked_qa_pairs: u64,
}

fn default_max_results() -> usize {
    5
}

/// An incoming question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,

    /// Upper bound on documents pulled by the lexical search
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Return whole bodies instead of snippets
    #[serde(default)]
    pub full: bool,

    /// Overrides the QA shortcut threshold
    #[serde(default)]
    pub similarity_threshold: Option<f64>,
}

impl ChatRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            max_results: default_max_results(),
            full: false,
            similarity_threshold: None,
        }
    }
}

/// One entry of the source list returned with an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSnippet {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub snippet: String,
}

impl SourceSnippet {
    pub fn from_document(document: &Document, snippet: impl Into<String>) -> Self {
        Self {
            id: document.id,
            title: document.display_title().to_string(),
            author: document.author.clone(),
            subject: document.subject.clone(),
            snippet: snippet.into(),
        }
    }
}

/// Which branch of the answering pipeline produced the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    /// Stored QA pair similar enough to the question
    QaMatch,
    /// Summary accepted by the quality gate
    Llm,
    /// Deterministic extraction from ranked sentences
    Fallback,
    /// No document matched
    NothingFound,
}

/// Answer plus the material it was drawn from.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<SourceSnippet>,
    /// Number of matched documents (or QA pairs on the shortcut path)
    pub found_count: usize,
    #[serde(skip)]
    pub origin: AnswerSource,
}
