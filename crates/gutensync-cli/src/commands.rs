//! Top-level CLI parser and subcommand definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Mirror and catalog the Project Gutenberg archive.
#[derive(Parser)]
#[command(name = "gutensync", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Mirror metadata and/or content from the Gutenberg archive.
    Sync {
        /// Local directory the mirror is written under.
        #[arg(long)]
        target_dir: Option<PathBuf>,
        /// Content selection: `text-only`, `text-epub`, `all-text`, `full`.
        #[arg(long, default_value = "text-only")]
        preset: String,
        /// Skip the content phase; sync and parse RDF metadata only.
        #[arg(long)]
        metadata_only: bool,
        /// Enumerate without transferring anything.
        #[arg(long)]
        dry_run: bool,
        /// Verify checksums of local files after a successful sync.
        #[arg(long)]
        verify: bool,
        /// Retry automatically on a non-cancelled failure.
        #[arg(long)]
        auto_retry: bool,
        /// Maximum number of automatic retries.
        #[arg(long, default_value = "3")]
        max_retries: u32,
        /// Delay between automatic retries, in seconds.
        #[arg(long, default_value = "30")]
        retry_delay: u64,
        /// Wall-clock limit for the content phase, in seconds. `0` disables it.
        #[arg(long, default_value = "0")]
        timeout: u64,
        /// Transfer rate cap, in kilobits per second.
        #[arg(long)]
        bandwidth_limit_kbps: Option<u64>,
        /// Explicit catalog database path, overriding the default resolution.
        #[arg(long)]
        db_path: Option<PathBuf>,
    },

    /// Inspect the local catalog.
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },

    /// Manage the user-level configuration file.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Check that the transfer tool, catalog database, and target directory are usable.
    Health {
        /// Local directory to check for writability.
        #[arg(long)]
        target_dir: Option<PathBuf>,
        /// Explicit catalog database path, overriding the default resolution.
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}

/// Catalog inspection subcommands.
#[derive(Subcommand)]
pub enum CatalogCommand {
    /// Search the catalog.
    Search {
        /// Free-text match against title.
        #[arg(long)]
        text: Option<String>,
        /// Substring match against author name.
        #[arg(long)]
        author: Option<String>,
        /// Language short code or display name.
        #[arg(long)]
        language: Option<String>,
        /// Subject substring match.
        #[arg(long)]
        subject: Option<String>,
        /// Maximum rows to return.
        #[arg(long, default_value = "50")]
        limit: u32,
        /// Rows to skip before collecting `limit`.
        #[arg(long, default_value = "0")]
        offset: u32,
        /// Export matching rows to a file instead of printing a table.
        #[arg(long)]
        export: Option<PathBuf>,
        /// Export format: `csv` or `json`.
        #[arg(long, default_value = "csv")]
        export_format: String,
        /// Explicit catalog database path, overriding the default resolution.
        #[arg(long)]
        db_path: Option<PathBuf>,
        /// Local directory the database defaults relative to.
        #[arg(long)]
        target_dir: Option<PathBuf>,
    },

    /// Print aggregate catalog statistics.
    Stats {
        /// Explicit catalog database path, overriding the default resolution.
        #[arg(long)]
        db_path: Option<PathBuf>,
        /// Local directory the database defaults relative to.
        #[arg(long)]
        target_dir: Option<PathBuf>,
    },
}

/// Configuration-file subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Write a commented configuration file with documented defaults.
    Init {
        /// Overwrite the file if one already exists.
        #[arg(long)]
        force: bool,
    },

    /// Load the configuration file and report effective values (or a parse error).
    Validate,
}
