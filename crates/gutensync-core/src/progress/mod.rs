//! Progress and cancellation plumbing shared by every component.
//!
//! Re-models the observer-pattern progress reporting and exception-based
//! cancellation of the original design as typed records plus
//! [`tokio_util::sync::CancellationToken`]. The sink contract is
//! non-blocking and lossy under backpressure: senders must never block on a
//! slow receiver, so `emit` takes `&self` and swallows a full channel rather
//! than awaiting capacity.

mod sink;

pub use sink::{
    NoopProgressSink, NoopTransferProgressSink, ProgressSink, TransferProgress,
    TransferProgressSink,
};

use serde::{Deserialize, Serialize};

/// The phase of a sync run. Ordered: `Metadata` always precedes `Content`
/// within one run, and the phase tag in a progress stream never regresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Downloading and parsing RDF metadata.
    Metadata,
    /// Downloading book content files.
    Content,
}

impl Phase {
    /// Short label for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Metadata => "Metadata",
            Self::Content => "Content",
        }
    }
}

/// A single progress update from the orchestrator, unifying Transfer Driver
/// progress and catalog-parse progress under one phase-tagged record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationProgress {
    /// Which phase this update belongs to.
    pub phase: Phase,
    /// Human-readable status line.
    pub message: String,
    /// Percent complete within the phase, when known. `None` during
    /// indeterminate sub-phases (file-list building, directory scanning).
    pub progress_percent: Option<f64>,
    /// The file currently being transferred or parsed, if applicable.
    pub current_file: Option<String>,
}

impl OrchestrationProgress {
    /// Build a progress record with no percent/file information.
    #[must_use]
    pub fn message(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            phase,
            message: message.into(),
            progress_percent: None,
            current_file: None,
        }
    }

    /// Build a progress record with a known percent.
    #[must_use]
    pub fn with_percent(phase: Phase, message: impl Into<String>, percent: f64) -> Self {
        Self {
            phase,
            message: message.into(),
            progress_percent: Some(percent),
            current_file: None,
        }
    }
}
