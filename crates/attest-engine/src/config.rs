//! Configuration for the decision engine

use crate::citation::{ClausePattern, DEFAULT_CLAUSE_PATTERN};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on `max_repair_attempts`
pub const MAX_REPAIR_ATTEMPTS: usize = 16;

/// Configuration for the decision engine
///
/// Every field is optional in TOML and falls back to its default. An empty
/// `clause_pattern` disables clause extraction, so every fragment is cited by
/// its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of fragments retrieved per question
    pub top_k: usize,

    /// Number of prior turns shown to the model
    pub memory_window: usize,

    /// Extra model invocations allowed after the first reply is rejected
    pub max_repair_attempts: usize,

    /// Deadline for one retrieval call (milliseconds)
    pub retrieval_timeout_ms: u64,

    /// Deadline for one model invocation (milliseconds)
    pub model_timeout_ms: u64,

    /// Regular expression matching clause codes in fragment text (empty disables)
    pub clause_pattern: String,

    /// Reject verdicts that cite nothing
    pub require_citations: bool,
}

impl EngineConfig {
    /// Total model invocations allowed per question
    pub fn max_attempts(&self) -> usize {
        self.max_repair_attempts.saturating_add(1)
    }

    /// Get the retrieval timeout as a Duration
    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_millis(self.retrieval_timeout_ms)
    }

    /// Get the model timeout as a Duration
    pub fn model_timeout(&self) -> Duration {
        Duration::from_millis(self.model_timeout_ms)
    }

    /// Compile the configured clause pattern
    pub fn clause_matcher(&self) -> Result<ClausePattern, String> {
        if self.clause_pattern.trim().is_empty() {
            return Ok(ClausePattern::disabled());
        }
        ClausePattern::new(&self.clause_pattern)
            .map_err(|e| format!("clause_pattern is not a valid regex: {}", e))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.top_k == 0 {
            return Err("top_k must be greater than 0".to_string());
        }
        if self.retrieval_timeout_ms == 0 {
            return Err("retrieval_timeout_ms must be greater than 0".to_string());
        }
        if self.model_timeout_ms == 0 {
            return Err("model_timeout_ms must be greater than 0".to_string());
        }
        if self.max_repair_attempts > MAX_REPAIR_ATTEMPTS {
            return Err(format!(
                "max_repair_attempts must be at most {}",
                MAX_REPAIR_ATTEMPTS
            ));
        }
        self.clause_matcher().map(|_| ())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k: 8,
            memory_window: 3,
            max_repair_attempts: 2,
            retrieval_timeout_ms: 10_000,
            model_timeout_ms: 60_000,
            clause_pattern: DEFAULT_CLAUSE_PATTERN.to_string(),
            require_citations: true,
        }
    }
}

impl EngineConfig {
    /// Strict preset: one repair, short deadlines, less context
    pub fn strict() -> Self {
        Self {
            top_k: 5,
            memory_window: 1,
            max_repair_attempts: 1,
            retrieval_timeout_ms: 5_000,
            model_timeout_ms: 30_000,
            clause_pattern: DEFAULT_CLAUSE_PATTERN.to_string(),
            require_citations: true,
        }
    }

    /// Lenient preset: more evidence, more repairs, longer deadlines
    pub fn lenient() -> Self {
        Self {
            top_k: 12,
            memory_window: 5,
            max_repair_attempts: 4,
            retrieval_timeout_ms: 30_000,
            model_timeout_ms: 180_000,
            clause_pattern: DEFAULT_CLAUSE_PATTERN.to_string(),
            require_citations: false,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
