//! Ask command handler.
//!
//! Runs the full answering pipeline locally and prints the answer to stdout.

use super::build_service;
use clap::Args;
use methodics_core::{config::AppConfig, AppError, AppResult};
use methodics_knowledge::{ChatRequest, ChatResponse};

/// Ask a question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Maximum number of methodics to consider
    #[arg(long, default_value = "5")]
    pub max_results: usize,

    /// Show the whole methodic text in sources
    #[arg(long)]
    pub full: bool,

    /// Similarity needed to answer from a stored QA pair (0.0-1.0)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::debug!("Ask command options: {:?}", self);

        if let Some(threshold) = self.threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(AppError::Validation(
                    "--threshold must be between 0 and 1".to_string(),
                ));
            }
        }

        let service = build_service(config)?;
        let request = ChatRequest {
            question: self.question.clone(),
            max_results: self.max_results,
            full: self.full,
            similarity_threshold: self.threshold,
        };

        let response = service.answer(&request).await?;

        if self.json {
            let output = serde_json::json!({
                "answer": response.answer,
                "sources": response.sources,
                "found_count": response.found_count,
                "origin": response.origin,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", render_text(&response));
        }

        Ok(())
    }
}

fn render_text(response: &ChatResponse) -> String {
    let mut out = response.answer.clone();
    if response.sources.is_empty() {
        return out;
    }

    out.push_str("\n\nИсточники:");
    for source in &response.sources {
        out.push_str(&format!("\n[{}] {}", source.id, source.title));
        if let Some(author) = &source.author {
            out.push_str(&format!(" ({})", author));
        }
        out.push_str(&format!("\n    {}", source.snippet));
    }
    out
}
