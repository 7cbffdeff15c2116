//! Citation index: which keys a verdict may cite for the current evidence

use attest_domain::{CitationKey, Fragment};
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Default clause code pattern: a short upper-case prefix, a hyphen and dotted
/// numbers (`AC-5.1`, `PS-1`, `ISMS-12.3.4`)
pub const DEFAULT_CLAUSE_PATTERN: &str = r"\b[A-Z]{2,5}-\d+(?:\.\d+)*\b";

/// A citation that does not trace to any retrieved fragment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown citation: {0}")]
pub struct UnknownCitation(pub String);

/// Compiled clause code matcher
///
/// # Examples
///
/// ```
/// use attest_engine::ClausePattern;
///
/// let pattern = ClausePattern::default();
/// assert_eq!(pattern.extract("See AC-5.1 and AC-2."), vec!["AC-5.1", "AC-2"]);
/// assert!(ClausePattern::disabled().extract("AC-5.1").is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ClausePattern {
    regex: Option<Regex>,
}

impl ClausePattern {
    /// Compile a clause pattern
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Some(Regex::new(pattern)?),
        })
    }

    /// A pattern that never matches; fragments are cited by id only
    pub fn disabled() -> Self {
        Self { regex: None }
    }

    /// Distinct clause codes in `text`, in order of first appearance
    pub fn extract(&self, text: &str) -> Vec<String> {
        let Some(regex) = &self.regex else {
            return Vec::new();
        };

        let mut codes: Vec<String> = Vec::new();
        for m in regex.find_iter(text) {
            if !codes.iter().any(|c| c == m.as_str()) {
                codes.push(m.as_str().to_string());
            }
        }
        codes
    }
}

impl Default for ClausePattern {
    fn default() -> Self {
        Self {
            regex: Regex::new(DEFAULT_CLAUSE_PATTERN).ok(),
        }
    }
}

/// Maps citation keys to the fragments retrieved for one question
///
/// Built fresh per question. Each fragment is citable by its own id and by any
/// clause code found in its text. When two fragments mention the same clause
/// code, the higher-ranked one owns it. A fragment with no clause code of its
/// own is listed under its id.
///
/// # Examples
///
/// ```
/// use attest_domain::{Fragment, Provenance};
/// use attest_engine::{CitationIndex, ClausePattern};
///
/// let fragment = Fragment::new(
///     "sop.pdf#1",
///     "AC-5.1 Contractors may be granted VPN access.",
///     Provenance::new("sop.pdf", Some(5), 1),
/// );
/// let index = CitationIndex::build(vec![fragment], &ClausePattern::default());
///
/// assert_eq!(index.resolve("AC-5.1").unwrap().id(), "sop.pdf#1");
/// assert_eq!(index.resolve(" sop.pdf#1 ").unwrap().id(), "sop.pdf#1");
/// assert!(index.resolve("ZZ-9.9").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct CitationIndex {
    fragments: Vec<Fragment>,
    keys: Vec<Vec<CitationKey>>,
    lookup: HashMap<CitationKey, usize>,
}

impl CitationIndex {
    /// Build the index from fragments in retrieval order
    pub fn build(fragments: Vec<Fragment>, pattern: &ClausePattern) -> Self {
        let mut lookup = HashMap::new();

        for (position, fragment) in fragments.iter().enumerate() {
            lookup
                .entry(CitationKey::new(fragment.id()))
                .or_insert(position);
        }

        let mut keys = Vec::with_capacity(fragments.len());
        for (position, fragment) in fragments.iter().enumerate() {
            let mut owned = Vec::new();
            for code in pattern.extract(fragment.text()) {
                let key = CitationKey::new(code);
                if !lookup.contains_key(&key) {
                    lookup.insert(key.clone(), position);
                    owned.push(key);
                }
            }
            if owned.is_empty() {
                owned.push(CitationKey::new(fragment.id()));
            }
            keys.push(owned);
        }

        Self {
            fragments,
            keys,
            lookup,
        }
    }

    /// Every key a verdict may cite
    pub fn valid_citations(&self) -> BTreeSet<CitationKey> {
        self.lookup.keys().cloned().collect()
    }

    /// Find the fragment a citation refers to
    pub fn resolve(&self, citation: &str) -> Result<&Fragment, UnknownCitation> {
        let citation = citation.trim();
        self.lookup
            .get(&CitationKey::new(citation))
            .and_then(|&position| self.fragments.get(position))
            .ok_or_else(|| UnknownCitation(citation.to_string()))
    }

    /// Keys listed for a fragment, in first-seen order
    pub fn keys_for(&self, fragment_id: &str) -> &[CitationKey] {
        self.fragments
            .iter()
            .position(|f| f.id() == fragment_id)
            .and_then(|position| self.keys.get(position))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Fragments paired with their listed keys, in retrieval order
    pub fn entries(&self) -> impl Iterator<Item = (&Fragment, &[CitationKey])> {
        self.fragments
            .iter()
            .zip(self.keys.iter().map(Vec::as_slice))
    }

    /// Fragments in retrieval order
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Take back the fragments
    pub fn into_fragments(self) -> Vec<Fragment> {
        self.fragments
    }

    /// Number of fragments
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Whether the index holds no fragments
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}
