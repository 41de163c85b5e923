//! Services compose port traits into the actual workflow logic.

mod sync_orchestrator;

pub use sync_orchestrator::{MetadataResult, OrchestrationResult, SyncOrchestrator};
