//! Search command handler.

use super::build_service;
use clap::Args;
use methodics_core::{config::AppConfig, AppResult};
use methodics_knowledge::text::truncate_with_ellipsis;
use methodics_knowledge::SourceSnippet;

/// Search methodics and QA pairs by keyword
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Search query
    pub query: String,

    /// Maximum number of results per kind
    #[arg(short, long, default_value = "10")]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let service = build_service(config)?;
        let preview_chars = service.config().snippet_chars;

        let methodics: Vec<SourceSnippet> = service
            .search_documents(&self.query, self.limit)?
            .iter()
            .map(|doc| {
                SourceSnippet::from_document(doc, truncate_with_ellipsis(&doc.body, preview_chars))
            })
            .collect();
        let qa_pairs = service.search_qa_text(&self.query, self.limit)?;

        tracing::info!(
            "Search found {} methodic(s) and {} QA pair(s)",
            methodics.len(),
            qa_pairs.len()
        );

        if self.json {
            let output = serde_json::json!({
                "methodics": methodics,
                "qa": qa_pairs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        if methodics.is_empty() && qa_pairs.is_empty() {
            println!("Nothing found for '{}'", self.query);
            return Ok(());
        }

        if !methodics.is_empty() {
            println!("Methodics:");
            for snippet in &methodics {
                println!("  [{}] {}", snippet.id, snippet.title);
                println!("      {}", snippet.snippet.replace('\n', " "));
            }
        }

        if !qa_pairs.is_empty() {
            println!("QA pairs:");
            for pair in &qa_pairs {
                println!("  [{}] {}", pair.id, pair.question);
                println!("      {}", pair.answer);
            }
        }

        Ok(())
    }
}
