//! Prompt builder for rendering templates and injecting retrieval context.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
use handlebars::Handlebars;
use methodics_core::{AppError, AppResult};
use std::collections::HashMap;

/// Build a prompt from a definition, the user's question and the assembled
/// retrieval context.
///
/// The context is cut to `max_context_chars` characters before rendering.
///
/// # Example
/// ```no_run
/// use methodics_prompt::{build_prompt, default_prompt};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = default_prompt()?;
/// let built = build_prompt(&def, "Что такое Python?", "Методичка №1: ...", 5000)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    question: &str,
    context: &str,
    max_context_chars: usize,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let total_chars = context.chars().count();
    let context_truncated = total_chars > max_context_chars;
    let embedded: String = if context_truncated {
        context.chars().take(max_context_chars).collect()
    } else {
        context.to_string()
    };

    if context_truncated {
        tracing::debug!(
            "Context truncated from {} to {} chars",
            total_chars,
            max_context_chars
        );
    }

    let mut variables = HashMap::new();
    variables.insert("question".to_string(), question.to_string());
    variables.insert("context".to_string(), embedded);

    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt {
        system: definition.system.clone(),
        user,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            context_chars: total_chars.min(max_context_chars),
            context_truncated,
        },
    })
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}
