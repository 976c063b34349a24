//! Retrieval tuning configuration.
//!
//! Every ranking constant lives here with its default. The file
//! `.methodics/retrieval.yaml` may set any subset of the fields.

use methodics_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Thresholds and limits used by the answering pipeline.
///
/// The quality gate values (`max_bullets`, `max_answer_sentences`,
/// `short_answer_chars`) have no measured derivation and are expected to be
/// retuned against real traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Minimum keyword length for document search
    pub search_keyword_min_chars: usize,

    /// Minimum keyword length for sentence scoring, quality gate and fallback
    pub question_keyword_min_chars: usize,

    /// Default threshold for QA similarity search
    pub qa_similarity_threshold: f64,

    /// Threshold for answering directly from a stored QA pair
    pub qa_shortcut_threshold: f64,

    /// Threshold for QA pairs added to the LLM context
    pub qa_context_threshold: f64,

    /// Maximum QA hits used by the shortcut and the context
    pub qa_limit: usize,

    pub max_sentences_per_document: usize,
    pub min_sentence_words: usize,
    pub max_sentence_words: usize,

    /// Points per distinct question keyword found in a sentence
    pub keyword_weight: u32,

    /// Display cap for a single sentence in context and snippets
    pub max_sentence_chars: usize,

    /// Cap on the context embedded in the LLM instruction
    pub max_context_chars: usize,

    pub max_sources: usize,

    /// Body prefix used as a snippet when no sentence was ranked
    pub snippet_chars: usize,

    /// Question prefix shown for QA-derived sources
    pub qa_snippet_chars: usize,

    pub min_answer_chars: usize,
    pub max_bullets: usize,
    pub keyword_coverage: f64,
    pub max_answer_sentences: usize,
    pub short_answer_chars: usize,

    pub fallback_documents: usize,
    pub fallback_sentences_per_document: usize,
    pub min_fallback_sentence_chars: usize,

    /// Domain stems that add a point per occurrence
    pub topical_terms: Vec<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            search_keyword_min_chars: 3,
            question_keyword_min_chars: 4,
            qa_similarity_threshold: 0.6,
            qa_shortcut_threshold: 0.75,
            qa_context_threshold: 0.45,
            qa_limit: 3,
            max_sentences_per_document: 3,
            min_sentence_words: 10,
            max_sentence_words: 30,
            keyword_weight: 3,
            max_sentence_chars: 300,
            max_context_chars: 5000,
            max_sources: 5,
            snippet_chars: 200,
            qa_snippet_chars: 150,
            min_answer_chars: 30,
            max_bullets: 10,
            keyword_coverage: 0.3,
            max_answer_sentences: 8,
            short_answer_chars: 200,
            fallback_documents: 2,
            fallback_sentences_per_document: 2,
            min_fallback_sentence_chars: 20,
            topical_terms: [
                "студент",
                "обучени",
                "обучающ",
                "преподава",
                "учебн",
                "метод",
                "занят",
                "урок",
                "школ",
                "student",
                "teach",
                "method",
                "lesson",
                "learn",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl RetrievalConfig {
    /// Check that thresholds and limits are usable.
    pub fn validate(&self) -> AppResult<()> {
        for (name, value) in [
            ("qa_similarity_threshold", self.qa_similarity_threshold),
            ("qa_shortcut_threshold", self.qa_shortcut_threshold),
            ("qa_context_threshold", self.qa_context_threshold),
            ("keyword_coverage", self.keyword_coverage),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AppError::Config(format!(
                    "retrieval.{} must be in [0.0, 1.0], got {}",
                    name, value
                )));
            }
        }

        if self.min_sentence_words > self.max_sentence_words {
            return Err(AppError::Config(
                "retrieval.min_sentence_words must not exceed max_sentence_words".to_string(),
            ));
        }

        if self.max_context_chars == 0 || self.max_sentence_chars == 0 {
            return Err(AppError::Config(
                "retrieval character limits must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Load retrieval configuration.
///
/// Loads from `.methodics/retrieval.yaml` if it exists, otherwise returns
/// the defaults.
pub fn load_config(workspace: &Path) -> AppResult<RetrievalConfig> {
    let config_path = get_config_path(workspace);

    if !config_path.exists() {
        tracing::debug!("Using default retrieval config (no config file found)");
        return Ok(RetrievalConfig::default());
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        AppError::Config(format!("Failed to read config at {:?}: {}", config_path, e))
    })?;

    let config: RetrievalConfig = serde_yaml::from_str(&content).map_err(|e| {
        AppError::Config(format!("Failed to parse config at {:?}: {}", config_path, e))
    })?;

    config.validate()?;

    tracing::debug!("Loaded retrieval config from {:?}", config_path);
    Ok(config)
}

/// Save retrieval configuration.
pub fn save_config(workspace: &Path, config: &RetrievalConfig) -> AppResult<()> {
    let config_path = get_config_path(workspace);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    let yaml = serde_yaml::to_string(config)
        .map_err(|e| AppError::Config(format!("Failed to serialize config: {}", e)))?;

    fs::write(&config_path, yaml).map_err(|e| {
        AppError::Config(format!("Failed to write config to {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Saved retrieval config to {:?}", config_path);
    Ok(())
}

/// Get the path to the retrieval config file.
pub fn get_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".methodics").join("retrieval.yaml")
}
