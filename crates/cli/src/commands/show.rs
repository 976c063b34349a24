//! Show command handler.

use super::open_store;
use clap::Args;
use methodics_core::{config::AppConfig, AppResult};
use methodics_knowledge::MethodicStore;

/// Show a methodic by id
#[derive(Args, Debug)]
pub struct ShowCommand {
    /// Methodic id
    pub id: i64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ShowCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let store = open_store(config)?;
        let document = store.require_document(self.id)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&document)?);
            return Ok(());
        }

        println!("[{}] {}", document.id, document.display_title());
        if let Some(author) = &document.author {
            println!("Автор: {}", author);
        }
        if let Some(subject) = &document.subject {
            println!("Предмет: {}", subject);
        }
        println!("Добавлено: {}", document.created_at.format("%Y-%m-%d %H:%M"));
        println!();
        println!("{}", document.body);
        Ok(())
    }
}
