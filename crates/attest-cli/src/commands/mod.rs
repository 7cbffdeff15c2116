//! Command implementations.

pub mod ask;
pub mod config;
pub mod history;
pub mod retrieve;

pub use self::ask::execute_ask;
pub use self::config::execute_config;
pub use self::history::{execute_history, execute_reset};
pub use self::retrieve::execute_retrieve;
