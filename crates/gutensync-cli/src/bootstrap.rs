//! CLI bootstrap — the composition root.
//!
//! This is the only place concrete adapters are instantiated and wired
//! into trait objects. Command handlers receive a [`CliContext`] and
//! never construct a [`RsyncDriver`], [`GutenbergRdfParser`], or
//! [`SqliteCatalogStore`] themselves.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use gutensync_core::{database_path, CatalogStore, RdfParser, SyncConfig, SyncOrchestrator, TransferDriver};
use gutensync_db::SqliteCatalogStore;
use gutensync_rdf::GutenbergRdfParser;
use gutensync_transfer::RsyncDriver;

/// Fully composed application context for CLI command handlers.
pub struct CliContext {
    /// The sync orchestrator, already wired to the concrete adapters below.
    pub orchestrator: SyncOrchestrator,
    /// The catalog store, exposed directly for handlers that don't need
    /// the full orchestrator (`catalog search/stats`).
    pub catalog: Arc<dyn CatalogStore>,
    /// The transfer driver, exposed directly for `health`.
    pub transfer: Arc<dyn TransferDriver>,
}

/// Resolve the catalog database path, every caller's way: an explicit path
/// wins, then `GUTENBERG_CATALOG_DATABASE_PATH` (applied the same way
/// `sync` applies it, via [`SyncConfig::with_env_overlay`]), then the
/// `target_directory`-relative default.
#[must_use]
pub fn resolve_db_path(explicit_db_path: Option<&Path>, target_directory: &Path) -> PathBuf {
    let config = SyncConfig::with_defaults(target_directory.to_path_buf()).with_env_overlay();
    let explicit = explicit_db_path.or(config.database_path.as_deref());
    database_path(explicit, target_directory)
}

/// Resolve the catalog database path and open the store, creating the
/// schema if the file doesn't exist yet.
pub async fn open_catalog(
    explicit_db_path: Option<&Path>,
    target_directory: &Path,
) -> Result<Arc<dyn CatalogStore>> {
    let db_path = resolve_db_path(explicit_db_path, target_directory);
    let store = SqliteCatalogStore::connect(&db_path).await?;
    Ok(Arc::new(store))
}

/// Bootstrap the CLI context for a `sync` invocation.
pub async fn bootstrap(explicit_db_path: Option<&Path>, target_directory: &Path) -> Result<CliContext> {
    let transfer: Arc<dyn TransferDriver> = Arc::new(RsyncDriver::new());
    let rdf: Arc<dyn RdfParser> = Arc::new(GutenbergRdfParser::new());
    let catalog = open_catalog(explicit_db_path, target_directory).await?;

    let orchestrator = SyncOrchestrator::new(transfer.clone(), rdf, catalog.clone());

    Ok(CliContext {
        orchestrator,
        catalog,
        transfer,
    })
}

/// Default target directory used when the user supplies none on the CLI
/// and `GUTENBERG_SYNC_TARGET_DIRECTORY` is unset.
#[must_use]
pub fn default_target_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("gutensync")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_target_directory_ends_with_gutensync() {
        assert_eq!(
            default_target_directory().file_name().unwrap(),
            "gutensync"
        );
    }
}
