//! Error types for the decision engine

use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`crate::DecisionEngine`]
#[derive(Error, Debug)]
pub enum EngineError {
    /// Evidence could not be retrieved
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    /// The model never produced an acceptable verdict
    #[error("Decision error: {0}")]
    DecisionParse(#[from] DecisionParseError),

    /// Another question is already in flight on this session
    #[error("Session busy: a question is already being answered")]
    SessionBusy,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failures of the retrieval step
///
/// All of these are fatal for the current question. No verdict is produced
/// without evidence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    /// Question was empty or whitespace
    #[error("Question is empty")]
    EmptyQuery,

    /// The fragment store failed
    #[error("Backend error: {0}")]
    Backend(String),

    /// The fragment store did not answer in time
    #[error("Retrieval timed out after {0:?}")]
    Timeout(Duration),

    /// The fragment store returned nothing
    #[error("No evidence found for the question")]
    NoEvidence,
}

/// Why a model reply was rejected
///
/// The `Display` text is terse on purpose: it is fed back to the model in the
/// repair prompt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The reply contained no JSON object
    #[error("reply contained no JSON object")]
    NoJson,

    /// JSON was present but could not be parsed
    #[error("malformed JSON: {0}")]
    Malformed(String),

    /// A required field was absent
    #[error("missing required field \"{0}\"")]
    MissingField(&'static str),

    /// A field had the wrong JSON type
    #[error("field \"{field}\" must be {expected}")]
    WrongType {
        /// Offending field
        field: &'static str,
        /// Expected shape
        expected: &'static str,
    },

    /// The verdict literal was not one of the allowed values
    #[error("verdict \"{0}\" is not one of YES, NO, CONDITIONAL")]
    InvalidVerdict(String),

    /// The rationale was empty
    #[error("rationale is empty")]
    EmptyRationale,

    /// No citation was given
    #[error("no citations given; cite at least one listed key")]
    NoCitations,

    /// A citation did not match any retrieved evidence
    #[error("citation \"{0}\" is not one of the listed keys")]
    UnknownCitation(String),

    /// The model call itself failed
    #[error("model call failed: {0}")]
    ModelFailure(String),

    /// The model call did not finish in time
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),
}

impl Rejection {
    /// Whether the reply reached the grounding check before failing
    pub fn is_grounding(&self) -> bool {
        matches!(self, Rejection::NoCitations | Rejection::UnknownCitation(_))
    }
}

/// The attempt budget ran out without an acceptable verdict
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No valid decision after {attempts} attempt(s): {reason}")]
pub struct DecisionParseError {
    /// Model invocations made
    pub attempts: usize,

    /// Raw text of the last reply (empty if the last call failed or timed out)
    pub last_output: String,

    /// Why the last reply was rejected
    pub reason: Rejection,
}
