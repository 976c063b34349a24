//! Stats command handler.

use super::open_store;
use clap::Args;
use methodics_core::{config::AppConfig, AppResult};
use methodics_knowledge::MethodicStore;

/// Show database statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let store = open_store(config)?;
        let stats = store.stats()?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("Database:        {}", config.database_file().display());
            println!("Methodics:       {}", stats.documents);
            println!("QA pairs:        {}", stats.qa_pairs);
            println!("Linked QA pairs: {}", stats.linked_qa_pairs);
        }
        Ok(())
    }
}
