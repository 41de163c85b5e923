//! Library surface for the `gutensync` CLI binary: parsing, bootstrap, and
//! command handlers, kept separate from `main.rs` so the dispatch logic is
//! testable without spawning a process.

pub mod bootstrap;
pub mod commands;
pub mod handlers;
pub mod presentation;

pub use bootstrap::{bootstrap, CliContext};
pub use commands::{CatalogCommand, Cli, Commands, ConfigCommand};
