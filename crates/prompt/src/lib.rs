//! Prompt system for the methodics assistant.
//!
//! This crate provides:
//! - YAML-based prompt definitions with an embedded default
//! - Workspace overrides under `.methodics/prompts/`
//! - Handlebars template rendering with bounded context injection

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{default_prompt, list_prompts, load_prompt, validate_prompt, DEFAULT_PROMPT_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
