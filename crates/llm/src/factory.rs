//! LLM provider factory.
//!
//! Resolves a provider name from configuration into a concrete client.

use crate::client::LlmClient;
use crate::providers::{GeminiClient, OllamaClient};
use crate::types::{ProviderSettings, ProviderType};
use methodics_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client from provider settings.
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// API key is missing, and `AppError::Llm` if the HTTP client cannot be built.
pub fn create_client(settings: &ProviderSettings) -> AppResult<Arc<dyn LlmClient>> {
    let provider = ProviderType::parse(&settings.provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", settings.provider)))?;

    tracing::debug!(
        "Creating {} client for model {}",
        provider.as_str(),
        settings.model
    );

    match provider {
        ProviderType::Gemini => {
            let api_key = settings
                .api_key
                .as_deref()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| {
                    AppError::Config("Gemini provider requires an API key".to_string())
                })?;

            let client = match settings.endpoint.as_deref() {
                Some(endpoint) => GeminiClient::with_endpoint(endpoint, api_key, settings.timeout)?,
                None => GeminiClient::new(&settings.model, api_key, settings.timeout)?,
            };
            Ok(Arc::new(client))
        }
        ProviderType::Ollama => {
            let base_url = settings
                .endpoint
                .as_deref()
                .unwrap_or(crate::providers::DEFAULT_OLLAMA_URL);
            Ok(Arc::new(OllamaClient::new(base_url, settings.timeout)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client(&ProviderSettings::new("ollama", "llama3")).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let settings = ProviderSettings::new("ollama", "llama3")
            .with_endpoint(Some("http://localhost:8080".to_string()));
        assert!(create_client(&settings).is_ok());
    }

    #[test]
    fn test_gemini_requires_api_key() {
        match create_client(&ProviderSettings::new("gemini", "gemini-2.0-flash")) {
            Err(AppError::Config(msg)) => assert!(msg.contains("requires an API key")),
            Err(other) => panic!("Unexpected error: {}", other),
            Ok(_) => panic!("Expected error for Gemini without API key"),
        }
    }

    #[test]
    fn test_gemini_blank_key_rejected() {
        let settings = ProviderSettings::new("gemini", "gemini-2.0-flash")
            .with_api_key(Some("   ".to_string()));
        assert!(create_client(&settings).is_err());
    }

    #[test]
    fn test_create_gemini_client() {
        let settings = ProviderSettings::new("google", "gemini-2.0-flash")
            .with_api_key(Some("secret".to_string()));
        let client = create_client(&settings).unwrap();
        assert_eq!(client.provider_name(), "gemini");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client(&ProviderSettings::new("unknown", "m")) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
