//! Execution modes
//!
//! The binary runs the HTTP server by default; the other subcommands are
//! one-shot maintenance tasks handled in `cli`.

pub mod cli;
pub mod server;

pub use cli::run_cli;
pub use server::run_server;
