//! HNSW Vector Index for Fragment Retrieval
//!
//! This module wraps the HNSW algorithm for nearest-neighbor search over
//! chunk embeddings.
//!
//! # HNSW Parameters
//!
//! - **M**: Number of bi-directional links per node (default: 16)
//! - **efConstruction**: Size of dynamic candidate list during construction (default: 200)
//! - **efSearch**: Size of dynamic candidate list during search (default: 64)

use hnsw_rs::prelude::*;
use thiserror::Error;

const DEFAULT_M: usize = 16;
const DEFAULT_EF_CONSTRUCTION: usize = 200;
const DEFAULT_MAX_ELEMENTS: usize = 100_000;

/// Default search quality parameter
pub const DEFAULT_EF_SEARCH: usize = 64;

/// Errors that can occur during vector index operations
#[derive(Error, Debug)]
pub enum VectorIndexError {
    /// Invalid embedding dimension
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        actual: usize,
    },
}

/// A wrapper around HNSW for cosine similarity search
///
/// Entries are addressed by the position they were inserted at, so the store
/// can map results straight back to its chunk list.
///
/// # Examples
///
/// ```no_run
/// use attest_store::vector_index::VectorIndex;
///
/// let mut index = VectorIndex::new(3);
/// index.add(&[1.0, 0.0, 0.0]).unwrap();
/// let results = index.search(&[1.0, 0.0, 0.0], 1, 64).unwrap();
/// assert_eq!(results[0].0, 0);
/// ```
pub struct VectorIndex {
    dimension: usize,
    hnsw: Hnsw<'static, f32, DistCosine>,
    len: usize,
}

impl VectorIndex {
    /// Create a new vector index with the specified dimension
    pub fn new(dimension: usize) -> Self {
        let nb_layer = 16.min((DEFAULT_MAX_ELEMENTS as f32).ln().trunc() as usize);

        let hnsw = Hnsw::<'static, f32, DistCosine>::new(
            DEFAULT_M,
            DEFAULT_MAX_ELEMENTS,
            nb_layer,
            DEFAULT_EF_CONSTRUCTION,
            DistCosine {},
        );

        Self {
            dimension,
            hnsw,
            len: 0,
        }
    }

    /// Add an embedding and return its position
    pub fn add(&mut self, embedding: &[f32]) -> Result<usize, VectorIndexError> {
        self.check_dimension(embedding)?;

        let position = self.len;
        self.hnsw.insert_slice((embedding, position));
        self.len += 1;

        Ok(position)
    }

    /// Search for the k nearest neighbors to the given embedding
    ///
    /// Returns `(position, similarity)` pairs sorted by similarity (descending).
    /// Similarity is `1 - cosine distance`, clamped to [0, 1].
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        ef_search: usize,
    ) -> Result<Vec<(usize, f32)>, VectorIndexError> {
        self.check_dimension(query)?;
        if k == 0 || self.len == 0 {
            return Ok(Vec::new());
        }

        let mut results: Vec<(usize, f32)> = self
            .hnsw
            .search(query, k, ef_search.max(k))
            .into_iter()
            .map(|neighbour| {
                let similarity = (1.0 - neighbour.distance).clamp(0.0, 1.0);
                (neighbour.d_id, similarity)
            })
            .collect();

        // Ties break on insertion order so rankings are repeatable
        results.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        results.truncate(k);

        Ok(results)
    }

    /// Get the number of vectors in the index
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Embedding dimension this index accepts
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<(), VectorIndexError> {
        if embedding.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(())
    }
}
