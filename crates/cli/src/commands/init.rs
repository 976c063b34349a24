//! Init command handler.

use clap::Args;
use methodics_core::{config::AppConfig, AppResult};
use methodics_knowledge::config::{get_config_path, save_config};
use methodics_knowledge::RetrievalConfig;

/// Write the default retrieval settings into the workspace
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Overwrite an existing retrieval.yaml
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let path = get_config_path(&config.workspace);
        if path.exists() && !self.force {
            println!("{} already exists (use --force to overwrite)", path.display());
            return Ok(());
        }

        save_config(&config.workspace, &RetrievalConfig::default())?;
        println!("Wrote {}", path.display());
        Ok(())
    }
}
