//! Embedding Model for Text Vectorization
//!
//! This module provides text-to-vector conversion for fragment retrieval.
//!
//! # Architecture
//!
//! - **EmbeddingModel**: Trait for any text encoder (local ONNX, remote API, ...)
//! - **HashingEmbedder**: Deterministic feature-hashing bag-of-words encoder
//!
//! The hashing embedder needs no model files. Texts that share vocabulary land
//! close together, which is enough to rank policy chunks against a question.
//!
//! # Examples
//!
//! ```rust
//! use attest_store::embedding::{EmbeddingModel, HashingEmbedder};
//!
//! let model = HashingEmbedder::new(256);
//! let embedding = model.embed("Contractors may be granted VPN access").unwrap();
//! assert_eq!(embedding.len(), 256);
//!
//! // Same text always produces same embedding
//! let embedding2 = model.embed("Contractors may be granted VPN access").unwrap();
//! assert_eq!(embedding, embedding2);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Default embedding dimension
pub const DEFAULT_DIMENSION: usize = 384;

/// Words that carry no retrieval signal
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "for", "from", "get", "has", "have",
    "i", "in", "is", "it", "of", "on", "or", "the", "to", "was", "with",
];

/// Errors that can occur during embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Invalid input text
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Trait for embedding models
pub trait EmbeddingModel {
    /// Generate an embedding vector for the given text
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Get the dimension of embeddings produced by this model
    fn dimension(&self) -> usize;
}

/// Feature-hashing bag-of-words embedder
///
/// Text is lowercased and split into alphanumeric tokens; stopwords are
/// dropped. Each remaining token adds its count to the bucket its hash maps to,
/// and the result is normalized to unit length. All components are
/// non-negative, so cosine similarity stays within [0, 1].
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create a new hashing embedder
    ///
    /// A dimension of zero is raised to one.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn bucket(&self, token: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        (hasher.finish() % self.dimension as u64) as usize
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

/// Split text into lowercase retrieval tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .collect()
}

impl EmbeddingModel for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Text has no indexable tokens".to_string(),
            ));
        }

        let mut embedding = vec![0.0f32; self.dimension];
        for token in &tokens {
            embedding[self.bucket(token)] += 1.0;
        }

        // Normalize to unit length for cosine similarity
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
