//! Seed command handler.

use super::open_store;
use clap::Args;
use methodics_core::{config::AppConfig, AppResult};
use methodics_knowledge::ingest::seed_samples;

/// Load the sample methodics into an empty database
#[derive(Args, Debug)]
pub struct SeedCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SeedCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let store = open_store(config)?;
        let stats = seed_samples(store.as_ref())?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else if stats.skipped {
            println!("Database already has methodics, nothing seeded");
        } else {
            println!(
                "Seeded {} methodics and {} QA pairs",
                stats.documents, stats.qa_pairs
            );
        }
        Ok(())
    }
}
