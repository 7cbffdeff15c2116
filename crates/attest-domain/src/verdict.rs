//! Verdict module - the structured decision returned for a question

use crate::CitationKey;
use std::fmt;

/// The closed set of decisions a verdict can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerdictKind {
    /// The policy permits the request
    Yes,

    /// The policy forbids the request
    No,

    /// Permitted only under stated conditions, or the evidence is insufficient
    Conditional,
}

impl VerdictKind {
    /// All verdict kinds, in schema order
    pub const ALL: [VerdictKind; 3] = [VerdictKind::Yes, VerdictKind::No, VerdictKind::Conditional];

    /// The wire literal for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictKind::Yes => "YES",
            VerdictKind::No => "NO",
            VerdictKind::Conditional => "CONDITIONAL",
        }
    }

    /// Parse a wire literal
    ///
    /// Matching is exact: `"yes"` or `" YES"` are not verdicts.
    ///
    /// # Examples
    ///
    /// ```
    /// use attest_domain::VerdictKind;
    ///
    /// assert_eq!(VerdictKind::parse("CONDITIONAL"), Some(VerdictKind::Conditional));
    /// assert_eq!(VerdictKind::parse("Maybe"), None);
    /// assert_eq!(VerdictKind::parse("yes"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "YES" => Some(VerdictKind::Yes),
            "NO" => Some(VerdictKind::No),
            "CONDITIONAL" => Some(VerdictKind::Conditional),
            _ => None,
        }
    }
}

impl fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A citation-backed decision
///
/// A `Verdict` is immutable once built. Whether its citations are grounded is
/// decided by the engine before a verdict is ever handed to a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    kind: VerdictKind,
    rationale: String,
    citations: Vec<CitationKey>,
}

impl Verdict {
    /// Create a verdict
    ///
    /// Fails if the rationale is empty or only whitespace.
    pub fn new(
        kind: VerdictKind,
        rationale: impl Into<String>,
        citations: Vec<CitationKey>,
    ) -> Result<Self, String> {
        let rationale = rationale.into();
        if rationale.trim().is_empty() {
            return Err("rationale is empty".to_string());
        }
        Ok(Self {
            kind,
            rationale,
            citations,
        })
    }

    /// The decision
    pub fn kind(&self) -> VerdictKind {
        self.kind
    }

    /// Short explanation grounded in the cited text
    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    /// Cited keys, in the order the model gave them
    pub fn citations(&self) -> &[CitationKey] {
        &self.citations
    }
}
