//! Ask command implementation.

use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::session::CliEngine;
use attest_engine::EngineError;

/// Execute the ask command.
pub async fn execute_ask(
    question: &str,
    show_evidence: bool,
    engine: &CliEngine,
    formatter: &Formatter,
) -> Result<()> {
    let question = validate_question(question)?;

    let turn = match engine.ask_turn(question).await {
        Ok(turn) => turn,
        Err(EngineError::DecisionParse(err)) => {
            println!("{}", formatter.format_parse_failure(&err)?);
            return Err(EngineError::DecisionParse(err).into());
        }
        Err(e) => return Err(e.into()),
    };
    println!("{}", formatter.format_turn(&turn, show_evidence)?);

    Ok(())
}

/// Reject blank questions before any work is done.
pub fn validate_question(question: &str) -> Result<&str> {
    let question = question.trim();
    if question.is_empty() {
        return Err(CliError::InvalidInput("Question must not be empty".to_string()));
    }
    Ok(question)
}
