//! Attest CLI library.
//!
//! This library provides the presentation layer for the Attest decision engine:
//! configuration loading, engine wiring, command execution and output formatting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod repl;
pub mod session;

pub use cli::{Cli, Command};
pub use config::AppConfig;
pub use error::{CliError, Result};
pub use output::Formatter;
pub use session::{build_engine, load_store, CliEngine};
