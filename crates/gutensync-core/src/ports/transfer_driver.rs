//! The Transfer Driver port: a subprocess-backed endpoint mirror.
//!
//! Modeled on the download-manager port in the corpus this crate learned
//! its process-handling idiom from: a single `async_trait`, cooperative
//! cancellation via [`CancellationToken`], and a non-blocking progress
//! sink rather than an observer object.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::errors::TransferError;
use crate::progress::TransferProgressSink;

/// Options for one `sync` call. Constructed once by the composition root
/// from [`crate::settings::SyncConfig`] and CLI flags, then passed down
/// immutably; the Driver never mutates or re-reads configuration mid-run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransferOptions {
    /// Glob patterns to include; empty means "everything".
    pub include: Vec<String>,
    /// Glob patterns to exclude, applied after `include`.
    pub exclude: Vec<String>,
    /// Skip files larger than this, in megabytes.
    pub max_file_size_mb: Option<u64>,
    /// Cap transfer rate, in kilobits per second.
    pub bandwidth_limit_kbps: Option<u64>,
    /// Remove local files no longer present on the remote.
    pub delete_removed: bool,
    /// Report what would change without transferring anything.
    pub dry_run: bool,
    /// Ask the underlying tool to emit progress lines at all.
    pub show_progress: bool,
    /// Hard wall-clock limit for this call, in seconds. `0` means no limit.
    pub timeout_seconds: u64,
}

/// How a `sync` call ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferOutcome {
    /// The subprocess exited zero.
    Success,
    /// The caller's cancellation token fired before completion.
    Cancelled,
    /// The per-call timeout elapsed before completion.
    TimedOut,
    /// The subprocess exited non-zero for a reason other than cancellation.
    Failed,
}

/// The result of one `sync` call.
///
/// A tagged outcome rather than `Result<(), Error>` plus exceptions for
/// cancellation and timeout: callers branch on `outcome` and treat
/// cancellation/timeout as ordinary, expected results, not error paths.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferResult {
    /// How the call ended.
    pub outcome: TransferOutcome,
    /// Process exit code, when the process actually exited.
    pub exit_code: Option<i32>,
    /// Files fully transferred before the call ended.
    pub files_transferred: u64,
    /// Bytes transferred before the call ended.
    pub bytes_transferred: u64,
    /// Human-readable detail, populated for `Failed`.
    pub error_message: Option<String>,
}

impl TransferResult {
    /// Build a `Success` result.
    #[must_use]
    pub fn success(exit_code: i32, files_transferred: u64, bytes_transferred: u64) -> Self {
        Self {
            outcome: TransferOutcome::Success,
            exit_code: Some(exit_code),
            files_transferred,
            bytes_transferred,
            error_message: None,
        }
    }

    /// Build a `Cancelled` result, carrying whatever progress was made.
    #[must_use]
    pub const fn cancelled(files_transferred: u64, bytes_transferred: u64) -> Self {
        Self {
            outcome: TransferOutcome::Cancelled,
            exit_code: None,
            files_transferred,
            bytes_transferred,
            error_message: None,
        }
    }

    /// Build a `TimedOut` result, carrying whatever progress was made.
    #[must_use]
    pub const fn timed_out(files_transferred: u64, bytes_transferred: u64) -> Self {
        Self {
            outcome: TransferOutcome::TimedOut,
            exit_code: None,
            files_transferred,
            bytes_transferred,
            error_message: None,
        }
    }

    /// Build a `Failed` result.
    #[must_use]
    pub fn failed(exit_code: Option<i32>, message: impl Into<String>) -> Self {
        Self {
            outcome: TransferOutcome::Failed,
            exit_code,
            files_transferred: 0,
            bytes_transferred: 0,
            error_message: Some(message.into()),
        }
    }

    /// True when the call completed normally.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, TransferOutcome::Success)
    }

    /// True when the call ended because of caller cancellation, as distinct
    /// from a timeout (see module docs on the two cancellation sources).
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.outcome, TransferOutcome::Cancelled)
    }
}

/// One entry from a remote listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileInfo {
    /// Path relative to the endpoint root.
    pub path: String,
    /// Size in bytes, when the listing tool reports it.
    pub size: Option<u64>,
    /// Whether this entry is a directory.
    pub is_directory: bool,
}

/// A subprocess-backed mirror of a remote archive endpoint.
///
/// Implementations own the external tool's argv construction and output
/// parsing; the orchestrator only ever sees [`TransferResult`] and
/// [`crate::progress::TransferProgress`] values.
#[async_trait]
pub trait TransferDriver: Send + Sync {
    /// Mirror `endpoint` into `local_directory`.
    ///
    /// `cancel` is expected to be a child of two independent sources (a
    /// caller-cancel token and a timeout token) so the result can report
    /// which one fired; see [`TransferOutcome`].
    async fn sync(
        &self,
        endpoint: &str,
        local_directory: &Path,
        options: &TransferOptions,
        progress: &dyn TransferProgressSink,
        cancel: CancellationToken,
    ) -> Result<TransferResult, TransferError>;

    /// List entries under `endpoint`, optionally filtered by `pattern`,
    /// without transferring anything.
    async fn list_remote(
        &self,
        endpoint: &str,
        pattern: Option<&str>,
        cancel: CancellationToken,
    ) -> Result<Vec<RemoteFileInfo>, TransferError>;

    /// Whether the underlying external tool is installed and runnable.
    async fn is_available(&self) -> bool;

    /// The underlying tool's reported version string, if available.
    async fn tool_version(&self) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_result_reports_success() {
        let result = TransferResult::success(0, 12, 4096);
        assert!(result.is_success());
        assert!(!result.is_cancelled());
    }

    #[test]
    fn cancelled_result_is_distinct_from_timed_out() {
        let cancelled = TransferResult::cancelled(1, 10);
        let timed_out = TransferResult::timed_out(1, 10);
        assert!(cancelled.is_cancelled());
        assert_ne!(cancelled.outcome, timed_out.outcome);
    }
}
