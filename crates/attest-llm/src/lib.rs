//! Attest LLM Provider Layer
//!
//! Pluggable LLM provider implementations.
//!
//! # Architecture
//!
//! This crate provides implementations of the `LlmProvider` trait from `attest-domain`.
//! The decision engine treats every provider as an opaque, possibly unreliable
//! `prompt -> text` call.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic, scriptable mock for testing
//! - `OllamaProvider`: Local Ollama API integration
//!
//! # Examples
//!
//! ```
//! use attest_llm::MockProvider;
//! use attest_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::scripted(["not json", r#"{"verdict":"NO"}"#]);
//! assert_eq!(provider.generate("p").unwrap(), "not json");
//! assert_eq!(provider.generate("p").unwrap(), r#"{"verdict":"NO"}"#);
//! assert_eq!(provider.call_count(), 2);
//! ```

#![warn(missing_docs)]

pub mod ollama;

use attest_domain::traits::LlmProvider as LlmProviderTrait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

pub use ollama::OllamaProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// A queued mock reply
#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Delayed(String, Duration),
    Error,
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<Reply>,
    responses: HashMap<String, Reply>,
    prompts: Vec<String>,
}

/// Mock LLM provider for deterministic testing
///
/// Replies are chosen in this order: the next scripted reply, then a reply
/// registered for the exact prompt, then the default response. Every prompt
/// is recorded so tests can inspect what the engine sent.
///
/// # Examples
///
/// ```
/// use attest_llm::MockProvider;
/// use attest_domain::traits::LlmProvider;
///
/// // Simple fixed response
/// let provider = MockProvider::new("Fixed response");
/// assert_eq!(provider.generate("any prompt").unwrap(), "Fixed response");
///
/// // Per-prompt responses
/// let mut provider = MockProvider::default();
/// provider.add_response("prompt1", "response1");
/// assert_eq!(provider.generate("prompt1").unwrap(), "response1");
/// assert_eq!(provider.prompts(), vec!["prompt1".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    delay: Option<Duration>,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            delay: None,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Create a MockProvider that replies with `responses` in order
    ///
    /// Once the script runs out, the default response is used.
    pub fn scripted<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::default();
        {
            let mut state = provider.lock();
            state.script = responses.into_iter().map(|r| Reply::Text(r.into())).collect();
        }
        provider
    }

    /// Sleep for `delay` before every reply
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Append a reply to the script
    pub fn push_response(&self, response: impl Into<String>) {
        self.lock().script.push_back(Reply::Text(response.into()));
    }

    /// Append a reply that arrives only after `delay`
    pub fn push_delayed_response(&self, response: impl Into<String>, delay: Duration) {
        self.lock()
            .script
            .push_back(Reply::Delayed(response.into(), delay));
    }

    /// Append a failing call to the script
    pub fn push_error(&self) {
        self.lock().script.push_back(Reply::Error);
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.lock()
            .responses
            .insert(prompt.into(), Reply::Text(response.into()));
    }

    /// Configure to return an error for a specific prompt
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        self.lock().responses.insert(prompt.into(), Reply::Error);
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.lock().prompts.len()
    }

    /// Every prompt received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.lock().prompts.clone()
    }

    /// Reset the call count and recorded prompts
    pub fn reset_call_count(&self) {
        self.lock().prompts.clear();
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not wedge the other clones
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        let reply = {
            let mut state = self.lock();
            state.prompts.push(prompt.to_string());
            state
                .script
                .pop_front()
                .or_else(|| state.responses.get(prompt).cloned())
        };

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Delayed(text, delay)) => {
                std::thread::sleep(delay);
                Ok(text)
            }
            Some(Reply::Error) => Err(LlmError::Other("Mock error".to_string())),
            None => Ok(self.default_response.clone()),
        }
    }

    fn generate_structured(&self, prompt: &str, _schema: &str) -> Result<String, Self::Error> {
        self.generate(prompt)
    }
}
