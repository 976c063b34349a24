//! Configuration management for the methodics service.
//!
//! Settings are resolved once at start-up, in increasing precedence:
//! - Built-in defaults
//! - Config file (`.methodics/config.yaml` or `METHODICS_CONFIG`)
//! - Environment variables
//! - Command-line flags (applied by the CLI through [`AppConfig::with_overrides`])
//!
//! The resulting [`AppConfig`] is passed explicitly to the services; nothing
//! reads the environment after start-up.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["gemini", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .methodics/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// LLM provider ("gemini" or "ollama")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Explicit API key (wins over `llm.api_key_env`)
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Log record format ("text" or "json")
    pub log_format: String,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM request settings
    pub llm: LlmSettings,

    /// SQLite database file
    pub database_path: PathBuf,

    /// HTTP bind address
    pub bind: String,
}

/// Settings for the summarization call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Full endpoint URL; providers derive one from the model when absent
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    pub temperature: f32,

    pub max_tokens: u32,

    pub top_p: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 30,
            temperature: 0.2,
            max_tokens: 800,
            top_p: 0.8,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    storage: Option<StorageSection>,
    server: Option<ServerSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    api_key_env: Option<String>,
    timeout_secs: Option<u64>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    top_p: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StorageSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerSection {
    bind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
    format: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            log_level: None,
            log_format: "text".to_string(),
            verbose: false,
            no_color: false,
            llm: LlmSettings::default(),
            database_path: PathBuf::from("data/methodics.db"),
            bind: "0.0.0.0:8000".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file and environment variables.
    ///
    /// Environment variables:
    /// - `METHODICS_WORKSPACE`: Override workspace path
    /// - `METHODICS_CONFIG`: Path to config file
    /// - `METHODICS_PROVIDER`: LLM provider
    /// - `METHODICS_MODEL`: Model identifier
    /// - `METHODICS_API_KEY`: API key (otherwise read from `llm.apiKeyEnv`)
    /// - `GEMINI_API_URL`: LLM endpoint
    /// - `DATABASE_URL`: SQLite location (`sqlite:///./data/methodics.db` or a plain path)
    /// - `METHODICS_BIND`: HTTP bind address
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Like [`load`](Self::load), with the workspace and config file chosen
    /// by the caller (CLI flags). Explicit values win over
    /// `METHODICS_WORKSPACE` and `METHODICS_CONFIG`.
    ///
    /// A config file named explicitly must exist; the workspace default
    /// `.methodics/config.yaml` is optional.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace
            .or_else(|| std::env::var("METHODICS_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("METHODICS_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        match config.config_file.clone() {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                config = config.merge_yaml(&path)?;
            }
            None => {
                let default_path = config.methodics_dir().join("config.yaml");
                if default_path.exists() {
                    config = config.merge_yaml(&default_path)?;
                }
            }
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("METHODICS_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("METHODICS_MODEL") {
            config.model = model;
        }

        if let Ok(endpoint) = std::env::var("GEMINI_API_URL") {
            config.llm.endpoint = Some(endpoint);
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_path = parse_database_url(&url);
        }

        if let Ok(bind) = std::env::var("METHODICS_BIND") {
            config.bind = bind;
        }

        if let Ok(key) = std::env::var("METHODICS_API_KEY") {
            config.api_key = Some(key);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        tracing::debug!("Merging config file {:?}", path);
        Ok(self.merge_file(config_file))
    }

    fn merge_file(&self, file: ConfigFile) -> Self {
        let mut result = self.clone();

        if let Some(llm) = file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if llm.endpoint.is_some() {
                result.llm.endpoint = llm.endpoint;
            }
            if let Some(env) = llm.api_key_env {
                result.llm.api_key_env = env;
            }
            if let Some(timeout) = llm.timeout_secs {
                result.llm.timeout_secs = timeout;
            }
            if let Some(temperature) = llm.temperature {
                result.llm.temperature = temperature;
            }
            if let Some(max_tokens) = llm.max_tokens {
                result.llm.max_tokens = max_tokens;
            }
            if let Some(top_p) = llm.top_p {
                result.llm.top_p = top_p;
            }
        }

        if let Some(path) = file.storage.and_then(|s| s.path) {
            result.database_path = parse_database_url(&path);
        }

        if let Some(bind) = file.server.and_then(|s| s.bind) {
            result.bind = bind;
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(format) = logging.format {
                result.log_format = format;
            }
        }

        result
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .methodics directory.
    pub fn methodics_dir(&self) -> PathBuf {
        self.workspace.join(".methodics")
    }

    /// Database file, resolved against the workspace when relative.
    pub fn database_file(&self) -> PathBuf {
        if self.database_path.is_absolute() {
            self.database_path.clone()
        } else {
            self.workspace.join(&self.database_path)
        }
    }

    /// Resolve the API key: explicit key first, then the configured env var.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }

    /// Validate the resolved configuration.
    ///
    /// A missing API key is not an error here: the service still answers
    /// through the deterministic fallback when the LLM cannot be built.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(AppError::Config("llm.timeoutSecs must be > 0".to_string()));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(AppError::Config(
                "llm.temperature must be in [0.0, 2.0]".to_string(),
            ));
        }

        if self.bind.trim().is_empty() {
            return Err(AppError::Config("server.bind must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Turn a `DATABASE_URL` style value into a file path.
///
/// Accepts `sqlite:///relative/or/absolute`, `sqlite://path`, `sqlite:path`
/// and plain paths.
pub fn parse_database_url(url: &str) -> PathBuf {
    let url = url.trim();
    let path = url
        .strip_prefix("sqlite:///")
        .or_else(|| url.strip_prefix("sqlite://"))
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    PathBuf::from(path)
}
