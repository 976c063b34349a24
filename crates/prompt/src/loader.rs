//! Prompt loader for YAML prompt definitions.

use crate::types::PromptDefinition;
use methodics_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Identifier of the built-in summarization prompt.
pub const DEFAULT_PROMPT_ID: &str = "methodics.summarize";

const DEFAULT_PROMPT_YAML: &str = include_str!("../prompts/methodics.summarize.yml");

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".methodics/prompts")
}

/// The built-in summarization prompt.
pub fn default_prompt() -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(DEFAULT_PROMPT_YAML)
        .map_err(|e| AppError::Prompt(format!("Failed to parse built-in prompt: {}", e)))?;
    validate_prompt(&definition)?;
    Ok(definition)
}

/// Load a prompt definition by ID.
///
/// A file `.methodics/prompts/<id>.yml` in the workspace wins; otherwise the
/// built-in definition is used when `prompt_id` is [`DEFAULT_PROMPT_ID`].
///
/// # Example
/// ```no_run
/// use methodics_prompt::{load_prompt, DEFAULT_PROMPT_ID};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), DEFAULT_PROMPT_ID)?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompts_dir(workspace_path).join(format!("{}.yml", prompt_id));

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        if prompt_id == DEFAULT_PROMPT_ID {
            tracing::debug!("Using built-in prompt {}", DEFAULT_PROMPT_ID);
            return default_prompt();
        }
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// List available prompt IDs: the built-in one plus workspace files, sorted.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let mut prompt_ids = vec![DEFAULT_PROMPT_ID.to_string()];
    let dir = prompts_dir(workspace_path);

    if dir.exists() {
        for entry in walkdir::WalkDir::new(&dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    prompt_ids.push(stem.to_string());
                }
            }
        }
    }

    prompt_ids.sort();
    prompt_ids.dedup();
    Ok(prompt_ids)
}

/// Validate a prompt definition.
pub fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    // The answer path has nothing to ground on without the context slot
    if !def.template.contains("{{context}}") {
        return Err(AppError::Prompt(format!(
            "Prompt {} must reference {{{{context}}}}",
            def.id
        )));
    }

    Ok(())
}
