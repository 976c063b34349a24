//! Serve command handler.

use super::build_service;
use clap::Args;
use methodics_core::{config::AppConfig, AppResult};
use std::sync::Arc;

/// Run the HTTP API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Bind address (overrides server.bind)
    #[arg(short, long)]
    pub bind: Option<String>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let service = Arc::new(build_service(config)?);
        let bind = self.bind.as_deref().unwrap_or(&config.bind);

        let stats = service.store().stats()?;
        tracing::info!(
            "Serving {} methodic(s) and {} QA pair(s)",
            stats.documents,
            stats.qa_pairs
        );

        methodics_server::run_server(bind, service).await
    }
}
