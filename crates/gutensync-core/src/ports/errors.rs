//! Port-level error types.
//!
//! Kept as tagged enums rather than a single opaque error so callers can
//! branch on cause (missing tool vs. cancelled vs. malformed input) without
//! downcasting, per the typed-outcome style used throughout this crate.

use thiserror::Error;

/// Errors a [`super::TransferDriver`] can return.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The external transfer tool is not installed or not on `PATH`.
    #[error("transfer tool not found: {0}")]
    ToolMissing(String),
    /// The subprocess could not be spawned (permissions, bad argv, etc.).
    #[error("failed to start transfer subprocess: {0}")]
    SpawnFailed(String),
    /// The subprocess exited with a non-zero status outside of cancellation.
    #[error("transfer subprocess exited with status {0}")]
    NonZeroExit(i32),
    /// Listing the remote endpoint failed.
    #[error("failed to list remote endpoint: {0}")]
    ListFailed(String),
    /// An I/O error not covered by the above.
    #[error("transfer I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors a [`super::RdfParser`] can return for the batch-level operations.
/// Per-file failures are reported as [`super::ParseOutcome::Skipped`]
/// entries, not as this error: a malformed RDF file must never abort a
/// whole metadata pass.
#[derive(Debug, Error)]
pub enum RdfError {
    /// The configured RDF directory does not exist or is not a directory.
    #[error("RDF directory not found: {0}")]
    DirectoryMissing(String),
    /// An I/O error while walking the directory tree.
    #[error("directory walk I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors a [`super::CatalogStore`] can return.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The backing database could not be opened or migrated.
    #[error("catalog database error: {0}")]
    Database(String),
    /// A query was rejected (e.g. empty search with no filters).
    #[error("invalid catalog query: {0}")]
    InvalidQuery(String),
    /// Export to the requested format or path failed.
    #[error("catalog export failed: {0}")]
    ExportFailed(String),
}
