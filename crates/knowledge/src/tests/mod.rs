//! Cross-module tests of the answering pipeline.

mod scenarios;

use crate::chat::ChatService;
use crate::config::RetrievalConfig;
use crate::store::{MethodicStore, SqliteStore};
use crate::summarizer::{Summarizer, SummarizerSettings};
use crate::lexical::{DocumentField, LexicalFilter, QaField};
use crate::types::{Document, NewDocument, NewQaPair, QaPair, StoreStats};
use methodics_core::{AppError, AppResult};
use methodics_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use methodics_prompt::default_prompt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted LLM that records the prompts it receives.
pub(crate) struct MockClient {
    reply: Option<String>,
    delay: Duration,
    pub(crate) prompts: Mutex<Vec<String>>,
}

impl MockClient {
    pub(crate) fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(text.to_string()),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: Some("Слишком поздний ответ про Python и его применение.".to_string()),
            delay,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub(crate) fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        tokio::time::sleep(self.delay).await;
        match &self.reply {
            Some(text) => Ok(LlmResponse {
                content: text.clone(),
                model: request.model.clone(),
                usage: LlmUsage::new(10, 10),
            }),
            None => Err(AppError::Llm("Gemini API error (503): unavailable".to_string())),
        }
    }
}

pub(crate) fn service_with(
    store: Arc<SqliteStore>,
    client: Arc<MockClient>,
    timeout: Duration,
) -> ChatService {
    let settings = SummarizerSettings {
        timeout,
        ..Default::default()
    };
    let summarizer = Summarizer::new(client, settings, default_prompt().unwrap());
    ChatService::new(store, summarizer, RetrievalConfig::default())
}

pub(crate) fn service(store: Arc<SqliteStore>, client: Arc<MockClient>) -> ChatService {
    service_with(store, client, Duration::from_secs(5))
}

pub(crate) fn empty_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().unwrap())
}

pub(crate) fn add_document(
    store: &SqliteStore,
    title: &str,
    body: &str,
    author: Option<&str>,
) -> Document {
    store
        .create_document(&NewDocument {
            title: title.to_string(),
            subject: Some("Информатика".to_string()),
            author: author.map(str::to_string),
            body: body.to_string(),
        })
        .unwrap()
}

pub(crate) fn add_qa(
    store: &SqliteStore,
    question: &str,
    answer: &str,
    document_id: Option<i64>,
) -> QaPair {
    store
        .create_qa_pair(&NewQaPair {
            question: question.to_string(),
            answer: answer.to_string(),
            document_id,
        })
        .unwrap()
}

/// Store wrapper counting full QA table scans.
pub(crate) struct CountingStore {
    inner: SqliteStore,
    pub(crate) qa_scans: AtomicUsize,
}

impl CountingStore {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: SqliteStore::open_in_memory().unwrap(),
            qa_scans: AtomicUsize::new(0),
        })
    }

    pub(crate) fn inner(&self) -> &SqliteStore {
        &self.inner
    }

    pub(crate) fn scans(&self) -> usize {
        self.qa_scans.load(Ordering::SeqCst)
    }
}

impl MethodicStore for CountingStore {
    fn create_document(&self, document: &NewDocument) -> AppResult<Document> {
        self.inner.create_document(document)
    }

    fn get_document(&self, id: i64) -> AppResult<Option<Document>> {
        self.inner.get_document(id)
    }

    fn delete_document(&self, id: i64) -> AppResult<bool> {
        self.inner.delete_document(id)
    }

    fn filter_documents(
        &self,
        filter: &LexicalFilter<DocumentField>,
        limit: usize,
    ) -> AppResult<Vec<Document>> {
        self.inner.filter_documents(filter, limit)
    }

    fn create_qa_pair(&self, pair: &NewQaPair) -> AppResult<QaPair> {
        self.inner.create_qa_pair(pair)
    }

    fn list_qa_pairs(&self) -> AppResult<Vec<QaPair>> {
        self.qa_scans.fetch_add(1, Ordering::SeqCst);
        self.inner.list_qa_pairs()
    }

    fn filter_qa_pairs(
        &self,
        filter: &LexicalFilter<QaField>,
        limit: usize,
    ) -> AppResult<Vec<QaPair>> {
        self.inner.filter_qa_pairs(filter, limit)
    }

    fn stats(&self) -> AppResult<StoreStats> {
        self.inner.stats()
    }
}
