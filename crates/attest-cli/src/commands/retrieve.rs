//! Retrieve command implementation.

use crate::commands::ask::validate_question;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::session::CliEngine;

/// Execute the retrieve command.
///
/// Shows the evidence without calling the model. `top_k` overrides the
/// configured fragment count for this query only.
pub async fn execute_retrieve(
    question: &str,
    top_k: Option<usize>,
    engine: &CliEngine,
    formatter: &Formatter,
) -> Result<()> {
    let question = validate_question(question)?;
    let top_k = top_k.unwrap_or(engine.config().top_k);
    if top_k == 0 {
        return Err(CliError::InvalidInput("--top-k must be at least 1".to_string()));
    }

    let fragments = engine.retrieve_only_with(question, top_k).await?;
    println!("{}", formatter.format_fragments(&fragments)?);

    Ok(())
}
