//! Error types for the methodics service.
//!
//! One error enum covers configuration, storage, LLM, prompt and input
//! validation failures. The HTTP layer maps variants to status codes, so
//! the split between `NotFound`, `Validation` and the rest matters.

use thiserror::Error;

/// Unified error type for the methodics crates.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage backend errors (fatal for the current request)
    #[error("Storage error: {0}")]
    Storage(String),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Rejected user input (empty title, empty answer, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Lookup of a persisted entity that does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
