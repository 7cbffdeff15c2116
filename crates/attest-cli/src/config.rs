//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use attest_engine::EngineConfig;
use attest_llm::ollama::{DEFAULT_ENDPOINT, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS};
use attest_store::embedding::DEFAULT_DIMENSION;
use attest_store::vector_index::DEFAULT_EF_SEARCH;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Decision engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Ollama connection settings
    #[serde(default)]
    pub ollama: OllamaSettings,

    /// Corpus settings
    #[serde(default)]
    pub corpus: CorpusSettings,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Ollama connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaSettings {
    /// API endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// HTTP timeout per request (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Transport attempts per model call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,
}

/// Corpus settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusSettings {
    /// Path to a JSON array of corpus chunks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Embedding dimension
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// HNSW search breadth
    #[serde(default = "default_ef_search")]
    pub ef_search: usize,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// REPL history size
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

impl AppConfig {
    /// Attest's home directory (`~/.attest`).
    pub fn home_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".attest"))
    }

    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("config.toml"))
    }

    /// Load configuration from `path`, or defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            Self::from_toml(&contents)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        self.engine
            .validate()
            .map_err(|e| CliError::Config(format!("[engine] {}", e)))?;
        if self.ollama.model.trim().is_empty() {
            return Err(CliError::Config("[ollama] model must not be empty".into()));
        }
        if self.ollama.timeout_secs == 0 {
            return Err(CliError::Config("[ollama] timeout_secs must be greater than 0".into()));
        }
        if !(0.0..=2.0).contains(&self.ollama.temperature) {
            return Err(CliError::Config("[ollama] temperature must be between 0.0 and 2.0".into()));
        }
        if self.corpus.ef_search == 0 {
            return Err(CliError::Config("[corpus] ef_search must be greater than 0".into()));
        }
        if self.corpus.dimension == 0 {
            return Err(CliError::Config("[corpus] dimension must be greater than 0".into()));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            ollama: OllamaSettings::default(),
            corpus: CorpusSettings::default(),
            settings: Settings::default(),
        }
    }
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            temperature: 0.0,
        }
    }
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            path: None,
            dimension: default_dimension(),
            ef_search: default_ef_search(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            history_size: 1000,
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    "llama3.1".to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_dimension() -> usize {
    DEFAULT_DIMENSION
}

fn default_ef_search() -> usize {
    DEFAULT_EF_SEARCH
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_history_size() -> usize {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ollama.endpoint, "http://localhost:11434");
        assert_eq!(config.engine.top_k, 8);
        assert!(config.corpus.path.is_none());
        assert!(config.settings.color);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [ollama]
            model = "mistral"

            [corpus]
            path = "/data/policies.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.ollama.model, "mistral");
        assert_eq!(config.ollama.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.corpus.path, Some(PathBuf::from("/data/policies.json")));
        assert_eq!(config.corpus.dimension, DEFAULT_DIMENSION);
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn test_partial_engine_section() {
        let config = AppConfig::from_toml("[engine]\ntop_k = 4\n").unwrap();

        assert_eq!(config.engine.top_k, 4);
        assert_eq!(config.engine.memory_window, EngineConfig::default().memory_window);
        assert_eq!(config.engine.clause_pattern, EngineConfig::default().clause_pattern);
        assert_eq!(config.ollama, OllamaSettings::default());
    }

    #[test]
    fn test_invalid_engine_section() {
        let mut config = AppConfig::default();
        config.engine.top_k = 0;
        let toml_str = config.to_toml().unwrap();

        assert!(matches!(AppConfig::from_toml(&toml_str), Err(CliError::Config(_))));
    }

    #[test]
    fn test_invalid_model_settings() {
        let result = AppConfig::from_toml("[ollama]\ntemperature = 5.0\n");
        assert!(matches!(result, Err(CliError::Config(_))));

        let result = AppConfig::from_toml("[corpus]\nef_search = 0\n");
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.ollama.model = "mistral".to_string();
        config.corpus.path = Some(PathBuf::from("corpus.json"));
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = AppConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, AppConfig::default());
    }

    #[test]
    fn test_malformed_file() {
        assert!(matches!(AppConfig::from_toml("[engine"), Err(CliError::Toml(_))));
    }
}
