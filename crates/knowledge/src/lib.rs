//! Retrieval and answering over a corpus of methodics.
//!
//! The pipeline: keyword extraction, lexical document search, QA similarity,
//! sentence ranking, context assembly, LLM summarization behind a quality
//! gate, and a deterministic fallback. Storage is SQLite.

pub mod chat;
pub mod config;
pub mod context;
pub mod fallback;
pub mod ingest;
pub mod lexical;
pub mod quality;
pub mod sentences;
pub mod similarity;
pub mod store;
pub mod summarizer;
pub mod text;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chat::{ChatService, NOTHING_FOUND_ANSWER};
pub use config::RetrievalConfig;
pub use context::{PromptContext, QaContext};
pub use lexical::{DocumentField, LexicalFilter, QaField};
pub use similarity::{similarity, QaHit};
pub use store::{MethodicStore, SqliteStore};
pub use summarizer::{LlmReply, Summarizer, SummarizerSettings};
pub use types::{
    AnswerSource, ChatRequest, ChatResponse, Document, NewDocument, NewQaPair, QaPair,
    SourceSnippet, StoreStats,
};
