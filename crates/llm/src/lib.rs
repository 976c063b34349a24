//! LLM integration crate for the methodics assistant.
//!
//! A provider-agnostic completion trait with two implementations:
//! - **Gemini**: Google's hosted `generateContent` API (default)
//! - **Ollama**: local LLM runtime
//!
//! # Example
//! ```no_run
//! use methodics_llm::{create_client, LlmRequest, ProviderSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = ProviderSettings::new("ollama", "llama3");
//! let client = create_client(&settings)?;
//! let response = client.complete(&LlmRequest::new("Hello, world!", "llama3")).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{GeminiClient, OllamaClient};
pub use types::{ProviderSettings, ProviderType};
