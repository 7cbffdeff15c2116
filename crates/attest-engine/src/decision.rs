//! Retry loop that turns raw model output into an accepted verdict
//!
//! ```text
//! INVOKE → PARSE → VALIDATE → ACCEPTED
//!    ↑        │         │
//!    └── REPAIR ←───────┘ → FAILED (budget spent)
//! ```
//!
//! Structural and grounding failures share one attempt budget. A model call
//! that fails or times out also spends an attempt.

use crate::citation::CitationIndex;
use crate::error::{DecisionParseError, Rejection};
use crate::parser::{parse_decision, validate_candidate, VerdictCandidate};
use crate::prompt::{PromptAssembler, VERDICT_SCHEMA};
use attest_domain::traits::LlmProvider;
use attest_domain::Verdict;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Result of running the retry loop
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionOutcome {
    /// A verdict passed every check
    Accepted {
        /// The accepted verdict
        verdict: Verdict,
        /// Model invocations it took
        attempts: usize,
    },

    /// The attempt budget ran out
    Failed(DecisionParseError),
}

enum State {
    Invoke(String),
    Parse(String),
    Validate {
        raw: String,
        candidate: VerdictCandidate,
    },
    Repair {
        raw: String,
        rejection: Rejection,
    },
}

/// Drives one question's model invocations until a verdict is accepted or the
/// budget is spent
pub struct DecisionLoop<'a, L> {
    llm: Arc<L>,
    index: &'a CitationIndex,
    assembler: &'a PromptAssembler,
    max_attempts: usize,
    model_timeout: Duration,
    require_citations: bool,
    label: String,
}

impl<'a, L> DecisionLoop<'a, L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
{
    /// Create a loop over the evidence in `index`
    ///
    /// `max_attempts` is the total number of model invocations (at least 1).
    pub fn new(
        llm: Arc<L>,
        index: &'a CitationIndex,
        assembler: &'a PromptAssembler,
        max_attempts: usize,
        model_timeout: Duration,
    ) -> Self {
        Self {
            llm,
            index,
            assembler,
            max_attempts: max_attempts.max(1),
            model_timeout,
            require_citations: true,
            label: "decision".to_string(),
        }
    }

    /// Accept verdicts with an empty citation list
    pub fn with_require_citations(mut self, require_citations: bool) -> Self {
        self.require_citations = require_citations;
        self
    }

    /// Prefix for log lines (e.g. the session id)
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Run the loop starting from the grounding prompt
    pub async fn run(&self, prompt: &str) -> DecisionOutcome {
        let mut attempts = 0;
        let mut state = State::Invoke(prompt.to_string());

        loop {
            state = match state {
                State::Invoke(current) => {
                    attempts += 1;
                    debug!(
                        "[{}] Attempt {}/{}: prompt length {} chars",
                        self.label,
                        attempts,
                        self.max_attempts,
                        current.len()
                    );
                    match self.invoke(&current).await {
                        Ok(raw) => State::Parse(raw),
                        Err(rejection) => State::Repair {
                            raw: String::new(),
                            rejection,
                        },
                    }
                }
                State::Parse(raw) => match parse_decision(&raw) {
                    Ok(candidate) => State::Validate { raw, candidate },
                    Err(rejection) => State::Repair { raw, rejection },
                },
                State::Validate { raw, candidate } => {
                    match validate_candidate(candidate, self.index, self.require_citations) {
                        Ok(verdict) => {
                            info!(
                                "[{}] Verdict {} accepted after {} attempt(s)",
                                self.label,
                                verdict.kind(),
                                attempts
                            );
                            return DecisionOutcome::Accepted { verdict, attempts };
                        }
                        Err(rejection) => State::Repair { raw, rejection },
                    }
                }
                State::Repair { raw, rejection } => {
                    let stage = if rejection.is_grounding() {
                        "grounding"
                    } else {
                        "structural"
                    };
                    warn!(
                        "[{}] Attempt {} rejected ({}): {}",
                        self.label, attempts, stage, rejection
                    );

                    if attempts >= self.max_attempts {
                        warn!("[{}] Attempt budget of {} spent", self.label, self.max_attempts);
                        return DecisionOutcome::Failed(DecisionParseError {
                            attempts,
                            last_output: raw,
                            reason: rejection,
                        });
                    }
                    State::Invoke(self.assembler.build_repair(prompt, &raw, &rejection))
                }
            };
        }
    }

    async fn invoke(&self, prompt: &str) -> Result<String, Rejection> {
        let llm = Arc::clone(&self.llm);
        let prompt = prompt.to_string();

        // Call in a blocking context since LlmProvider is not async
        let call = tokio::task::spawn_blocking(move || {
            llm.generate_structured(&prompt, VERDICT_SCHEMA)
                .map_err(|e| e.to_string())
        });

        match timeout(self.model_timeout, call).await {
            Err(_) => Err(Rejection::Timeout(self.model_timeout)),
            Ok(Err(e)) => Err(Rejection::ModelFailure(format!("Task join error: {}", e))),
            Ok(Ok(Err(e))) => Err(Rejection::ModelFailure(e)),
            Ok(Ok(Ok(raw))) => {
                debug!("[{}] Model reply length: {} chars", self.label, raw.len());
                Ok(raw)
            }
        }
    }
}
