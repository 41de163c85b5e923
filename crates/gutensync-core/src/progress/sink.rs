//! The progress sink abstraction and the Transfer Driver's progress record.

use serde::{Deserialize, Serialize};

use super::OrchestrationProgress;

/// Per-file progress as parsed from the Transfer Driver's subprocess output.
///
/// Percent is derived (`bytes_transferred / total_bytes`) when totals are
/// known; fields are optional because the underlying tool's output is
/// parsed incrementally and not every line carries every field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferProgress {
    /// The file currently being transferred, if known.
    pub current_file: Option<String>,
    /// Count of files fully transferred so far.
    pub files_transferred: u64,
    /// Bytes transferred so far (aggregate, not just the current file).
    pub bytes_transferred: u64,
    /// Total bytes to transfer, once known from a "total size is N" line.
    pub total_bytes: Option<u64>,
    /// Total files to consider, once known from a scan-phase line.
    pub total_files: Option<u64>,
    /// Transfer speed in bytes/second, if the tool reported a rate.
    pub speed_bytes_per_sec: Option<f64>,
    /// Estimated time remaining, in seconds, if the tool reported one.
    pub eta_seconds: Option<f64>,
}

impl TransferProgress {
    /// Derive a percent complete from `bytes_transferred`/`total_bytes`,
    /// when the total is known and non-zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> Option<f64> {
        self.total_bytes.filter(|&t| t > 0).map(|total| {
            (self.bytes_transferred as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
        })
    }
}

/// Non-blocking, lossy sink for progress updates.
///
/// Implementations must not block: the Driver's stdout reader and the
/// orchestrator's parse loop both call `emit` inline, so a slow receiver
/// must drop updates rather than apply backpressure. "Latest wins" on
/// percent; current-file and messages may be dropped under load.
pub trait ProgressSink: Send + Sync {
    /// Emit one progress update. Must not block.
    fn emit(&self, progress: OrchestrationProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(OrchestrationProgress) + Send + Sync,
{
    fn emit(&self, progress: OrchestrationProgress) {
        self(progress);
    }
}

/// A sink that discards every update; useful for tests and headless runs
/// that don't need a progress stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
    fn emit(&self, _progress: OrchestrationProgress) {}
}

/// Non-blocking sink for the Transfer Driver's lower-level per-file
/// progress, kept distinct from [`ProgressSink`] so the Driver never needs
/// to know about orchestration phases. The orchestrator bridges the two by
/// wrapping a `ProgressSink` in a closure that scales percent into the
/// right phase band and forwards the translated record.
pub trait TransferProgressSink: Send + Sync {
    /// Emit one transfer progress update. Must not block.
    fn emit(&self, progress: TransferProgress);
}

impl<F> TransferProgressSink for F
where
    F: Fn(TransferProgress) + Send + Sync,
{
    fn emit(&self, progress: TransferProgress) {
        self(progress);
    }
}

/// A transfer progress sink that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransferProgressSink;

impl TransferProgressSink for NoopTransferProgressSink {
    fn emit(&self, _progress: TransferProgress) {}
}
