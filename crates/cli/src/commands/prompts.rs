//! Prompts command handler.

use clap::Args;
use methodics_core::{config::AppConfig, AppResult};
use methodics_prompt::{list_prompts, load_prompt};

/// List and validate prompt definitions
#[derive(Args, Debug)]
pub struct PromptsCommand {}

impl PromptsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        for id in list_prompts(&config.workspace)? {
            match load_prompt(&config.workspace, &id) {
                Ok(def) => println!("{:<28} {} ({})", def.id, def.title, def.api_version),
                Err(e) => println!("{:<28} invalid: {}", id, e),
            }
        }
        Ok(())
    }
}
