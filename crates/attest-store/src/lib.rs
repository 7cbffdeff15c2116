//! Attest Fragment Store
//!
//! Implements the `FragmentStore` trait over an in-memory corpus with an HNSW
//! vector index.
//!
//! # Architecture
//!
//! - Corpus chunks arrive pre-split from an external ingestion step
//! - Each chunk is embedded once at construction
//! - Queries are embedded with the same model and searched by cosine similarity
//!
//! # Examples
//!
//! ```no_run
//! use attest_domain::traits::FragmentStore;
//! use attest_store::{CorpusChunk, InMemoryFragmentStore};
//!
//! let store = InMemoryFragmentStore::from_chunks(vec![CorpusChunk {
//!     source_name: "access_control_sop.pdf".to_string(),
//!     page: Some(4),
//!     chunk_index: 0,
//!     text: "AC-5.1 Contractors may be granted VPN access for up to 90 days.".to_string(),
//! }])
//! .unwrap();
//!
//! let fragments = store.retrieve("contractor VPN access", 8).unwrap();
//! assert_eq!(fragments[0].id(), "access_control_sop.pdf#0");
//! ```

#![warn(missing_docs)]

pub mod embedding;
pub mod vector_index;

use attest_domain::traits::FragmentStore;
use attest_domain::{Fragment, Provenance};
use embedding::{EmbeddingError, EmbeddingModel, HashingEmbedder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;
use vector_index::{VectorIndex, VectorIndexError, DEFAULT_EF_SEARCH};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Query was empty or whitespace
    #[error("Query is empty")]
    EmptyQuery,

    /// Store holds no chunks
    #[error("Corpus is empty")]
    EmptyCorpus,

    /// Vector index failure
    #[error("Index error: {0}")]
    Index(#[from] VectorIndexError),

    /// Corpus file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Corpus content is unusable
    #[error("Invalid corpus: {0}")]
    InvalidCorpus(String),
}

/// One pre-chunked piece of a source document
///
/// This is the record an ingestion pipeline hands over; a corpus file is a
/// JSON array of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusChunk {
    /// Name of the source document
    pub source_name: String,

    /// Page label, if known
    #[serde(default)]
    pub page: Option<u32>,

    /// Position of the chunk within its source
    pub chunk_index: usize,

    /// Chunk text
    pub text: String,
}

impl CorpusChunk {
    /// Stable fragment id for this chunk
    pub fn fragment_id(&self) -> String {
        format!("{}#{}", self.source_name, self.chunk_index)
    }
}

/// In-memory `FragmentStore` backed by an HNSW index
pub struct InMemoryFragmentStore<E = HashingEmbedder> {
    chunks: Vec<CorpusChunk>,
    index: VectorIndex,
    embedder: E,
    ef_search: usize,
}

impl InMemoryFragmentStore<HashingEmbedder> {
    /// Build a store from chunks with the default hashing embedder
    pub fn from_chunks(chunks: Vec<CorpusChunk>) -> Result<Self, StoreError> {
        Self::with_embedder(chunks, HashingEmbedder::default())
    }

    /// Load a JSON array of [`CorpusChunk`] records from disk
    pub fn from_json_file<P: AsRef<Path>>(path: P, dimension: usize) -> Result<Self, StoreError> {
        let contents = fs::read_to_string(path)?;
        let chunks: Vec<CorpusChunk> = serde_json::from_str(&contents)
            .map_err(|e| StoreError::InvalidCorpus(format!("Failed to parse corpus: {}", e)))?;
        Self::with_embedder(chunks, HashingEmbedder::new(dimension))
    }
}

impl<E: EmbeddingModel> InMemoryFragmentStore<E> {
    /// Build a store from chunks with a custom embedding model
    ///
    /// Fails if two chunks share a fragment id. Chunks with no indexable text
    /// (blank pages, punctuation, stopwords only) are skipped with a warning.
    pub fn with_embedder(chunks: Vec<CorpusChunk>, embedder: E) -> Result<Self, StoreError> {
        let mut seen = HashSet::new();
        let mut index = VectorIndex::new(embedder.dimension());
        let mut indexed = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            let id = chunk.fragment_id();
            if !seen.insert(id.clone()) {
                return Err(StoreError::InvalidCorpus(format!("Duplicate chunk id: {}", id)));
            }
            let embedding = match embedder.embed(&chunk.text) {
                Ok(embedding) => embedding,
                Err(EmbeddingError::InvalidInput(reason)) => {
                    warn!("Skipping chunk {}: {}", id, reason);
                    continue;
                }
            };
            index.add(&embedding)?;
            indexed.push(chunk);
        }

        Ok(Self {
            chunks: indexed,
            index,
            embedder,
            ef_search: DEFAULT_EF_SEARCH,
        })
    }

    /// Set the HNSW search quality parameter
    pub fn with_ef_search(mut self, ef_search: usize) -> Self {
        self.ef_search = ef_search.max(1);
        self
    }

    /// Number of chunks in the corpus
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the corpus is empty
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn to_fragment(&self, position: usize, similarity: f32) -> Option<Fragment> {
        self.chunks.get(position).map(|chunk| {
            Fragment::new(
                chunk.fragment_id(),
                chunk.text.clone(),
                Provenance::new(chunk.source_name.clone(), chunk.page, chunk.chunk_index),
            )
            .with_similarity(f64::from(similarity))
        })
    }
}

impl<E: EmbeddingModel> FragmentStore for InMemoryFragmentStore<E> {
    type Error = StoreError;

    fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Fragment>, Self::Error> {
        let query = query.trim();
        if query.is_empty() {
            return Err(StoreError::EmptyQuery);
        }
        if self.chunks.is_empty() {
            return Err(StoreError::EmptyCorpus);
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let embedding = match self.embedder.embed(query) {
            Ok(embedding) => embedding,
            // Only stopwords or punctuation: nothing can match
            Err(EmbeddingError::InvalidInput(_)) => return Ok(Vec::new()),
        };
        let results = self.index.search(&embedding, k, self.ef_search)?;

        Ok(results
            .into_iter()
            .filter_map(|(position, similarity)| self.to_fragment(position, similarity))
            .collect())
    }
}
