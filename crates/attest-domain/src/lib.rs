//! Attest Domain Layer
//!
//! This crate contains the core domain model for grounded compliance decisions.
//! It has ZERO external dependencies and defines the value objects and trait
//! interfaces that the store, provider and engine layers depend upon.
//!
//! ## Key Concepts
//!
//! - **Fragment**: A unit of retrieved evidence with provenance
//! - **CitationKey**: An identifier a verdict may cite, traceable to one fragment
//! - **Verdict**: The structured decision (YES / NO / CONDITIONAL + rationale + citations)
//! - **ConversationMemory**: The ordered turns of one session
//!
//! ## Architecture
//!
//! - No external crate dependencies
//! - Pure domain logic only
//! - Retrieval backends and language models live behind the traits in [`traits`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod citation;
pub mod fragment;
pub mod memory;
pub mod traits;
pub mod verdict;

// Re-exports for convenience
pub use citation::CitationKey;
pub use fragment::{Fragment, Provenance};
pub use memory::{ConversationMemory, Turn};
pub use verdict::{Verdict, VerdictKind};
