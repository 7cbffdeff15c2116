//! Fragment module - a unit of retrieved evidence

use std::fmt;

/// Where a fragment came from inside the corpus
///
/// Provenance is fixed when the fragment is retrieved and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Provenance {
    source_name: String,
    page: Option<u32>,
    chunk_index: usize,
}

impl Provenance {
    /// Create a new provenance record
    pub fn new(source_name: impl Into<String>, page: Option<u32>, chunk_index: usize) -> Self {
        Self {
            source_name: source_name.into(),
            page,
            chunk_index,
        }
    }

    /// Name of the source document (e.g., "access_control_sop.pdf")
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Page label, if the source is paginated
    pub fn page(&self) -> Option<u32> {
        self.page
    }

    /// Position of the chunk within its source document
    pub fn chunk_index(&self) -> usize {
        self.chunk_index
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page {
            Some(page) => write!(f, "{} p.{} #{}", self.source_name, page, self.chunk_index),
            None => write!(f, "{} #{}", self.source_name, self.chunk_index),
        }
    }
}

/// A retrieved unit of source-document evidence
///
/// Fragments are created fresh for every query by a
/// [`FragmentStore`](crate::traits::FragmentStore) and are read-only afterwards:
/// every field is private and exposed through accessors.
///
/// # Examples
///
/// ```
/// use attest_domain::{Fragment, Provenance};
///
/// let fragment = Fragment::new(
///     "sop.pdf#3",
///     "AC-5.1 Contractors may be granted VPN access for up to 90 days.",
///     Provenance::new("sop.pdf", Some(4), 3),
/// )
/// .with_similarity(0.82);
///
/// assert_eq!(fragment.id(), "sop.pdf#3");
/// assert_eq!(fragment.provenance().page(), Some(4));
/// assert!((fragment.similarity() - 0.82).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    id: String,
    text: String,
    provenance: Provenance,
    similarity: f64,
}

impl Fragment {
    /// Create a fragment with zero similarity
    pub fn new(id: impl Into<String>, text: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            provenance,
            similarity: 0.0,
        }
    }

    /// Set the similarity score, clamped to [0.0, 1.0]
    ///
    /// NaN scores are treated as 0.0.
    pub fn with_similarity(mut self, similarity: f64) -> Self {
        self.similarity = if similarity.is_nan() {
            0.0
        } else {
            similarity.clamp(0.0, 1.0)
        };
        self
    }

    /// Stable identifier, unique within a retrieval result set
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Fragment content used for grounding
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Source, page and chunk of this fragment
    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// Retrieval similarity in [0.0, 1.0]
    pub fn similarity(&self) -> f64 {
        self.similarity
    }
}
