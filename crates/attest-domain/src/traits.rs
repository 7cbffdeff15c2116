//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::Fragment;

/// Trait for retrieving ranked evidence for a query
///
/// Implemented by the infrastructure layer (attest-store)
pub trait FragmentStore {
    /// Error type for retrieval operations
    type Error;

    /// Retrieve at most `k` fragments for `query`, ranked by descending similarity
    ///
    /// Implementations fail on an empty query or an unavailable backend.
    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Fragment>, Self::Error>;
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (attest-llm)
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Generate text completion
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Generate with structured output (if supported)
    ///
    /// `schema` is a JSON Schema document. Providers without native support
    /// fall back to [`LlmProvider::generate`].
    fn generate_structured(&self, prompt: &str, schema: &str) -> Result<String, Self::Error>;
}
