//! Command handlers for the methodics CLI.
//!
//! Every command resolves its services from the same [`AppConfig`]; see
//! [`build_service`].

pub mod add;
pub mod ask;
pub mod init;
pub mod prompts;
pub mod search;
pub mod seed;
pub mod serve;
pub mod show;
pub mod stats;

// Re-export command types for convenience
pub use add::{AddCommand, AddQaCommand};
pub use ask::AskCommand;
pub use init::InitCommand;
pub use prompts::PromptsCommand;
pub use search::SearchCommand;
pub use seed::SeedCommand;
pub use serve::ServeCommand;
pub use show::ShowCommand;
pub use stats::StatsCommand;

use methodics_core::{config::AppConfig, AppResult};
use methodics_knowledge::config::load_config;
use methodics_knowledge::{ChatService, SqliteStore, Summarizer, SummarizerSettings};
use methodics_llm::{create_client, ProviderSettings};
use methodics_prompt::{load_prompt, DEFAULT_PROMPT_ID};
use std::sync::Arc;
use std::time::Duration;

/// Open the configured SQLite database, creating it if needed.
pub fn open_store(config: &AppConfig) -> AppResult<Arc<SqliteStore>> {
    let path = config.database_file();
    tracing::debug!("Opening database {:?}", path);
    Ok(Arc::new(SqliteStore::open(&path)?))
}

/// Wire store, retrieval settings, prompt and LLM client into a chat service.
///
/// A client that cannot be built (typically a missing API key) is not
/// fatal: the service answers through the fallback and logs a warning.
pub fn build_service(config: &AppConfig) -> AppResult<ChatService> {
    let store = open_store(config)?;
    let retrieval = load_config(&config.workspace)?;
    let prompt = load_prompt(&config.workspace, DEFAULT_PROMPT_ID)?;

    let timeout = Duration::from_secs(config.llm.timeout_secs);
    let settings = SummarizerSettings {
        model: config.model.clone(),
        temperature: config.llm.temperature,
        max_tokens: config.llm.max_tokens,
        top_p: config.llm.top_p,
        timeout,
        max_context_chars: retrieval.max_context_chars,
    };

    let provider = ProviderSettings::new(config.provider.clone(), config.model.clone())
        .with_endpoint(config.llm.endpoint.clone())
        .with_api_key(config.resolve_api_key())
        .with_timeout(timeout);

    let summarizer = match create_client(&provider) {
        Ok(client) => {
            tracing::info!("Using {} model {}", client.provider_name(), config.model);
            Summarizer::new(client, settings, prompt)
        }
        Err(e) => {
            tracing::warn!("LLM disabled, answers will use the fallback: {}", e);
            Summarizer::unavailable(e.to_string(), settings, prompt)
        }
    };

    Ok(ChatService::new(store, summarizer, retrieval))
}
