//! Citation keys

use std::fmt;

/// An identifier a verdict may reference
///
/// A key is either a fragment id or a clause code found in fragment text
/// (e.g., `AC-5.1`). Keys are compared exactly; callers trim input first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CitationKey(String);

impl CitationKey {
    /// Create a new citation key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CitationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CitationKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CitationKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for CitationKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
