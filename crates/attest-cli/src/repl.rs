//! Interactive REPL (Read-Eval-Print Loop) mode.
//!
//! One REPL is one session: follow-up questions see earlier answers until
//! `reset`.

use crate::commands;
use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::session::CliEngine;
use rustyline::error::ReadlineError;
use rustyline::{Config as EditorConfig, DefaultEditor};
use std::path::PathBuf;

/// Run the interactive REPL.
pub async fn run_repl(engine: &CliEngine, config: &AppConfig, formatter: &Formatter) -> Result<()> {
    println!(
        "{}",
        formatter.info("Attest REPL - Type a question, 'help' for commands, 'exit' to quit")
    );
    println!();

    // Initialize readline editor
    let editor_config = EditorConfig::builder()
        .max_history_size(config.settings.history_size)
        .map_err(|e| CliError::Config(format!("Invalid history size: {}", e)))?
        .build();
    let mut editor = DefaultEditor::with_config(editor_config)
        .map_err(|e| CliError::Io(std::io::Error::other(format!("Failed to initialize editor: {}", e))))?;

    // Load history
    let history_path = get_history_path()?;
    let _ = editor.load_history(&history_path);

    loop {
        match editor.readline("attest> ") {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                editor.add_history_entry(line).ok();

                match parse_repl_command(line) {
                    Ok(ReplCommand::Exit) => {
                        println!("{}", formatter.info("Goodbye!"));
                        break;
                    }
                    Ok(ReplCommand::Help) => {
                        print_help(formatter);
                    }
                    Ok(cmd) => {
                        if let Err(e) = execute_repl_command(cmd, engine, formatter).await {
                            eprintln!("{}", formatter.error(&e.to_string()));
                        }
                    }
                    Err(e) => {
                        eprintln!("{}", formatter.error(&e.to_string()));
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", formatter.info("Use 'exit' to quit"));
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("{}", formatter.error(&format!("Error: {}", err)));
                break;
            }
        }
    }

    // Save history
    editor.save_history(&history_path).ok();

    Ok(())
}

/// REPL command type.
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Exit,
    Help,
    Ask { question: String, evidence: bool },
    Retrieve(String),
    History,
    Reset,
}

/// Parse a REPL command line.
///
/// Anything that is not a known command is asked as a question.
fn parse_repl_command(line: &str) -> Result<ReplCommand> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head {
        "" => Err(CliError::InvalidInput("Empty command".to_string())),
        "exit" | "quit" | "q" => Ok(ReplCommand::Exit),
        "help" | "?" => Ok(ReplCommand::Help),
        "history" => Ok(ReplCommand::History),
        "reset" => Ok(ReplCommand::Reset),
        "ask" | "why" => {
            if rest.is_empty() {
                return Err(CliError::InvalidInput(format!("Usage: {} <question>", head)));
            }
            Ok(ReplCommand::Ask {
                question: rest.to_string(),
                evidence: head == "why",
            })
        }
        "retrieve" | "sources" => {
            if rest.is_empty() {
                return Err(CliError::InvalidInput(format!("Usage: {} <question>", head)));
            }
            Ok(ReplCommand::Retrieve(rest.to_string()))
        }
        _ => Ok(ReplCommand::Ask {
            question: line.to_string(),
            evidence: false,
        }),
    }
}

/// Execute a REPL command.
async fn execute_repl_command(cmd: ReplCommand, engine: &CliEngine, formatter: &Formatter) -> Result<()> {
    match cmd {
        ReplCommand::Ask { question, evidence } => {
            commands::execute_ask(&question, evidence, engine, formatter).await
        }
        ReplCommand::Retrieve(question) => {
            commands::execute_retrieve(&question, None, engine, formatter).await
        }
        ReplCommand::History => commands::execute_history(engine, formatter).await,
        ReplCommand::Reset => commands::execute_reset(engine, formatter).await,
        ReplCommand::Exit | ReplCommand::Help => Ok(()),
    }
}

fn get_history_path() -> Result<PathBuf> {
    let attest_dir = AppConfig::home_dir()?;
    std::fs::create_dir_all(&attest_dir)?;
    Ok(attest_dir.join("history.txt"))
}

fn print_help(formatter: &Formatter) {
    println!("{}", formatter.info("Available commands:"));
    println!();
    println!("  <question>                     - Ask a question (same as 'ask')");
    println!("  ask <question>                 - Ask a question");
    println!("  why <question>                 - Ask and show the evidence used");
    println!("  retrieve <question>            - Show evidence without asking the model");
    println!("  history                        - List answered questions");
    println!("  reset                          - Forget the conversation");
    println!("  help, ?                        - Show this help");
    println!("  exit, quit, q                  - Exit REPL");
    println!();
}
