//! Session history commands.

use crate::error::Result;
use crate::output::Formatter;
use crate::session::CliEngine;

/// Print every answered question in this session.
pub async fn execute_history(engine: &CliEngine, formatter: &Formatter) -> Result<()> {
    let turns = engine.history().await;
    println!("{}", formatter.format_history(&turns)?);
    Ok(())
}

/// Forget the session's conversation.
pub async fn execute_reset(engine: &CliEngine, formatter: &Formatter) -> Result<()> {
    engine.reset().await?;
    println!("{}", formatter.success("Conversation cleared"));
    Ok(())
}
