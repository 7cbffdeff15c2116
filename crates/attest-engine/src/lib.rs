//! Attest Decision Engine
//!
//! Answers compliance questions with a verdict grounded in retrieved evidence.
//!
//! # Overview
//!
//! Every answer is a closed verdict (`YES`, `NO` or `CONDITIONAL`), a short
//! rationale and a list of citations. A verdict is only returned once every
//! citation has been checked against the evidence retrieved for that question.
//!
//! # Architecture
//!
//! ```text
//! Question → FragmentStore → Fragments → CitationIndex
//!          → PromptAssembler → LLM → Parser/Retry loop → Verdict → Memory
//! ```
//!
//! # Key Features
//!
//! - **Grounded Citations**: Clause codes (e.g. `AC-5.1`) and fragment ids are
//!   the only keys a verdict may cite
//! - **Bounded Repair**: Malformed or ungrounded output is sent back to the
//!   model with the rejection reason, up to a fixed attempt budget
//! - **Session Memory**: Accepted turns feed follow-up prompts
//! - **Timeouts**: Retrieval and each model call run under a deadline
//!
//! # Example Usage
//!
//! ```no_run
//! use attest_engine::{DecisionEngine, EngineConfig};
//! use attest_llm::MockProvider;
//! use attest_store::{CorpusChunk, InMemoryFragmentStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryFragmentStore::from_chunks(vec![CorpusChunk {
//!     source_name: "access_control_sop.pdf".to_string(),
//!     page: Some(5),
//!     chunk_index: 1,
//!     text: "AC-5.1 Contractors may be granted VPN access for up to 90 days.".to_string(),
//! }])?;
//! let llm = MockProvider::new(
//!     r#"{"verdict":"YES","rationale":"AC-5.1 allows it.","citations":["AC-5.1"]}"#,
//! );
//!
//! let engine = DecisionEngine::new(store, llm, EngineConfig::default())?;
//! let verdict = engine.ask("Can a contractor get VPN access for 90 days?").await?;
//!
//! println!("{}: {}", verdict.kind(), verdict.rationale());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod citation;
mod config;
mod decision;
mod engine;
mod error;
mod parser;
mod prompt;

#[cfg(test)]
mod tests;

pub use citation::{CitationIndex, ClausePattern, UnknownCitation, DEFAULT_CLAUSE_PATTERN};
pub use config::{EngineConfig, MAX_REPAIR_ATTEMPTS};
pub use decision::{DecisionLoop, DecisionOutcome};
pub use engine::DecisionEngine;
pub use error::{DecisionParseError, EngineError, Rejection, RetrievalError};
pub use parser::{parse_decision, validate_candidate, VerdictCandidate};
pub use prompt::{PromptAssembler, VERDICT_SCHEMA};
