//! LLM provider implementations.

mod gemini;
mod ollama;

pub use gemini::GeminiClient;
pub use ollama::{OllamaClient, DEFAULT_OLLAMA_URL};
