//! Methodics CLI
//!
//! Entry point for the `methodics` tool: runs the HTTP service, answers
//! questions from the terminal and manages the methodics database.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    AddCommand, AddQaCommand, AskCommand, InitCommand, PromptsCommand, SearchCommand,
    SeedCommand, ServeCommand, ShowCommand, StatsCommand,
};
use methodics_core::logging::{self, LogFormat};
use methodics_core::{config::AppConfig, AppResult};
use std::path::PathBuf;
use tracing::Instrument;

/// Methodics Q&A - answers grounded in teaching methodics
#[derive(Parser, Debug)]
#[command(name = "methodics")]
#[command(about = "Question answering over a corpus of teaching methodics", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "METHODICS_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "METHODICS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (gemini, ollama)
    #[arg(short, long, global = true, env = "METHODICS_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "METHODICS_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve(ServeCommand),

    /// Ask a question
    Ask(AskCommand),

    /// Search methodics and QA pairs by keyword
    Search(SearchCommand),

    /// Add a methodic from a file or inline text
    Add(AddCommand),

    /// Add a question-answer pair
    AddQa(AddQaCommand),

    /// Show a methodic by id
    Show(ShowCommand),

    /// Load the sample methodics into an empty database
    Seed(SeedCommand),

    /// Show database statistics
    Stats(StatsCommand),

    /// Write the default retrieval settings into the workspace
    Init(InitCommand),

    /// List and validate prompt definitions
    Prompts(PromptsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.workspace.clone(), cli.config.clone())?.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(
        config.log_level.as_deref(),
        config.no_color,
        LogFormat::parse(&config.log_format),
    )?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Ask(_) => "ask",
        Commands::Search(_) => "search",
        Commands::Add(_) => "add",
        Commands::AddQa(_) => "add-qa",
        Commands::Show(_) => "show",
        Commands::Seed(_) => "seed",
        Commands::Stats(_) => "stats",
        Commands::Init(_) => "init",
        Commands::Prompts(_) => "prompts",
    };
    let span = tracing::info_span!("command", name = command_name);

    let result = async {
        match cli.command {
            Commands::Serve(cmd) => cmd.execute(&config).await,
            Commands::Ask(cmd) => cmd.execute(&config).await,
            Commands::Search(cmd) => cmd.execute(&config),
            Commands::Add(cmd) => cmd.execute(&config),
            Commands::AddQa(cmd) => cmd.execute(&config),
            Commands::Show(cmd) => cmd.execute(&config),
            Commands::Seed(cmd) => cmd.execute(&config),
            Commands::Stats(cmd) => cmd.execute(&config),
            Commands::Init(cmd) => cmd.execute(&config),
            Commands::Prompts(cmd) => cmd.execute(&config),
        }
    }
    .instrument(span)
    .await;

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
