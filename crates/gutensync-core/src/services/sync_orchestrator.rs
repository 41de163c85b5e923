//! The Sync Orchestrator: composes the Transfer Driver, RDF Parser and
//! Catalog Store into the two-phase mirror workflow.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::EbookRecord;
use crate::ports::{CatalogStore, ParseOutcome, RdfParser, TransferDriver, TransferOptions};
use crate::progress::{OrchestrationProgress, Phase, ProgressSink, TransferProgress, TransferProgressSink};
use crate::settings::{
    SyncConfig, GENERATED_FORMATS_ENDPOINT, MAIN_CONTENT_ENDPOINT, METADATA_PROGRESS_BATCH,
    SECONDARY_MIRRORS,
};

/// Result of [`SyncOrchestrator::sync_metadata`] (Phase 1 alone).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetadataResult {
    /// Whether the phase completed without error.
    pub success: bool,
    /// Whether it ended because the caller cancelled, as opposed to an
    /// error or timeout. Never auto-retried when `true`.
    pub cancelled: bool,
    /// RDF files transferred from the remote.
    pub files_transferred: u64,
    /// Bytes transferred from the remote.
    pub bytes_transferred: u64,
    /// Records successfully parsed and upserted.
    pub records_parsed: u64,
    /// Records skipped due to per-file parse failures.
    pub records_skipped: u64,
    /// Human-readable error detail, set only on failure.
    pub error_message: Option<String>,
}

/// Result of [`SyncOrchestrator::sync`] (both phases).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrchestrationResult {
    /// The metadata phase's own result.
    pub metadata: MetadataResult,
    /// Overall success across both phases (or just Phase 1 when
    /// `metadata_only` was set).
    pub success: bool,
    /// Whether the run ended on caller cancellation.
    pub cancelled: bool,
    /// Content files transferred, aggregated across both content endpoints.
    pub files_synced: u64,
    /// Content bytes transferred, aggregated across both content endpoints.
    pub bytes_transferred: u64,
    /// Human-readable error detail, set only on failure.
    pub error_message: Option<String>,
}

impl OrchestrationResult {
    fn metadata_only(metadata: MetadataResult) -> Self {
        Self {
            success: metadata.success,
            cancelled: metadata.cancelled,
            error_message: metadata.error_message.clone(),
            metadata,
            files_synced: 0,
            bytes_transferred: 0,
        }
    }

    fn metadata_failed(metadata: MetadataResult) -> Self {
        Self::metadata_only(metadata)
    }
}

/// Bridges the Transfer Driver's low-level [`TransferProgress`] into a
/// phase-tagged [`OrchestrationProgress`], scaling percent into `[lo, hi]`
/// so a download pass and the subsequent parse pass together cover one
/// monotonically increasing 0-100 bar.
struct ScaledProgressBridge<'a> {
    sink: &'a dyn ProgressSink,
    phase: Phase,
    lo: f64,
    hi: f64,
}

impl TransferProgressSink for ScaledProgressBridge<'_> {
    fn emit(&self, progress: TransferProgress) {
        let scaled = progress
            .percent()
            .map(|percent| self.lo + percent / 100.0 * (self.hi - self.lo));
        let message = progress
            .current_file
            .clone()
            .unwrap_or_else(|| "syncing".to_string());
        self.sink.emit(OrchestrationProgress {
            phase: self.phase,
            message,
            progress_percent: scaled,
            current_file: progress.current_file,
        });
    }
}

/// Count `.rdf` files under `dir`, recursing into subdirectories.
///
/// Used as the denominator for metadata-phase progress percentages; walked
/// directly with `std::fs::read_dir` rather than through the RDF Parser
/// port, since this only needs file names, not parsed content. Directories
/// that can't be read (not yet transferred, permission denied) contribute
/// zero rather than failing the count.
fn count_rdf_files(dir: &Path) -> u64 {
    let mut count = 0u64;
    let mut stack = vec![dir.to_path_buf()];

    while let Some(current) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&current) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("rdf"))
            {
                count += 1;
            }
        }
    }

    count
}

/// Composes the three ports into the documented two-phase sync.
pub struct SyncOrchestrator {
    transfer: Arc<dyn TransferDriver>,
    rdf: Arc<dyn RdfParser>,
    catalog: Arc<dyn CatalogStore>,
}

impl SyncOrchestrator {
    /// Build an orchestrator over the given adapters.
    #[must_use]
    pub fn new(
        transfer: Arc<dyn TransferDriver>,
        rdf: Arc<dyn RdfParser>,
        catalog: Arc<dyn CatalogStore>,
    ) -> Self {
        Self {
            transfer,
            rdf,
            catalog,
        }
    }

    /// Run the full workflow: metadata phase, then (unless
    /// `config.metadata_only`) the content phase.
    pub async fn sync(
        &self,
        config: &SyncConfig,
        progress: &dyn ProgressSink,
        cancel: CancellationToken,
    ) -> OrchestrationResult {
        let metadata = self.sync_metadata(config, progress, cancel.clone()).await;

        if !metadata.success {
            return OrchestrationResult::metadata_failed(metadata);
        }

        if config.metadata_only {
            return OrchestrationResult::metadata_only(metadata);
        }

        self.sync_content(config, metadata, progress, cancel).await
    }

    /// Run only the metadata phase.
    pub async fn sync_metadata(
        &self,
        config: &SyncConfig,
        progress: &dyn ProgressSink,
        cancel: CancellationToken,
    ) -> MetadataResult {
        progress.emit(OrchestrationProgress::message(
            Phase::Metadata,
            "syncing RDF files",
        ));

        let metadata_dir = config.target_directory.join("gutenberg-epub");
        let options = TransferOptions {
            include: vec!["*/".to_string(), "*.rdf".to_string()],
            timeout_seconds: config.metadata_timeout_seconds,
            dry_run: config.dry_run,
            show_progress: true,
            bandwidth_limit_kbps: config.bandwidth_limit_kbps,
            ..TransferOptions::default()
        };

        let bridge = ScaledProgressBridge {
            sink: progress,
            phase: Phase::Metadata,
            lo: 0.0,
            hi: 50.0,
        };

        let transfer_result = self
            .transfer
            .sync(GENERATED_FORMATS_ENDPOINT, &metadata_dir, &options, &bridge, cancel.clone())
            .await;

        let transfer_result = match transfer_result {
            Ok(result) => result,
            Err(err) => {
                return MetadataResult {
                    success: false,
                    cancelled: false,
                    error_message: Some(err.to_string()),
                    ..MetadataResult::default()
                };
            }
        };

        if transfer_result.is_cancelled() {
            return MetadataResult {
                success: false,
                cancelled: true,
                files_transferred: transfer_result.files_transferred,
                bytes_transferred: transfer_result.bytes_transferred,
                error_message: Some(
                    "Sync was cancelled. Run the same command again to resume.".to_string(),
                ),
                ..MetadataResult::default()
            };
        }

        if !transfer_result.is_success() {
            return MetadataResult {
                success: false,
                cancelled: false,
                files_transferred: transfer_result.files_transferred,
                bytes_transferred: transfer_result.bytes_transferred,
                error_message: transfer_result.error_message,
                ..MetadataResult::default()
            };
        }

        if config.dry_run {
            return MetadataResult {
                success: true,
                files_transferred: transfer_result.files_transferred,
                bytes_transferred: transfer_result.bytes_transferred,
                ..MetadataResult::default()
            };
        }

        let total_rdf_files = count_rdf_files(&metadata_dir);
        self.parse_and_upsert(&metadata_dir, total_rdf_files, progress, &cancel, transfer_result)
            .await
    }

    async fn parse_and_upsert(
        &self,
        metadata_dir: &Path,
        total_rdf_files: u64,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
        transfer_result: crate::ports::TransferResult,
    ) -> MetadataResult {
        let mut entries = match self.rdf.parse_directory(metadata_dir) {
            Ok(entries) => entries,
            Err(err) => {
                return MetadataResult {
                    success: false,
                    cancelled: false,
                    files_transferred: transfer_result.files_transferred,
                    bytes_transferred: transfer_result.bytes_transferred,
                    error_message: Some(err.to_string()),
                    ..MetadataResult::default()
                };
            }
        };

        let mut batch: Vec<EbookRecord> = Vec::with_capacity(METADATA_PROGRESS_BATCH as usize);
        let mut parsed: u64 = 0;
        let mut skipped: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                let _ = self.flush_batch(&mut batch).await;
                return MetadataResult {
                    success: false,
                    cancelled: true,
                    files_transferred: transfer_result.files_transferred,
                    bytes_transferred: transfer_result.bytes_transferred,
                    records_parsed: parsed,
                    records_skipped: skipped,
                    error_message: Some(
                        "Sync was cancelled. Run the same command again to resume.".to_string(),
                    ),
                };
            }

            let Some(outcome) = entries.next() else {
                break;
            };

            match outcome {
                ParseOutcome::Parsed(record) => {
                    parsed += 1;
                    batch.push(record);
                    if batch.len() as u64 >= METADATA_PROGRESS_BATCH {
                        if let Err(err) = self.flush_batch(&mut batch).await {
                            return MetadataResult {
                                success: false,
                                cancelled: false,
                                files_transferred: transfer_result.files_transferred,
                                bytes_transferred: transfer_result.bytes_transferred,
                                records_parsed: parsed,
                                records_skipped: skipped,
                                error_message: Some(err.to_string()),
                            };
                        }
                        let percent =
                            50.0 + ((parsed + skipped) as f64 / total_rdf_files.max(1) as f64) * 50.0;
                        progress.emit(OrchestrationProgress::with_percent(
                            Phase::Metadata,
                            format!("parsed {parsed} ebooks"),
                            percent.min(100.0),
                        ));
                    }
                }
                ParseOutcome::Skipped { path, reason } => {
                    skipped += 1;
                    warn!(path = %path, reason = %reason, "skipped RDF file");
                }
            }
        }

        if let Err(err) = self.flush_batch(&mut batch).await {
            return MetadataResult {
                success: false,
                cancelled: false,
                files_transferred: transfer_result.files_transferred,
                bytes_transferred: transfer_result.bytes_transferred,
                records_parsed: parsed,
                records_skipped: skipped,
                error_message: Some(err.to_string()),
            };
        }

        if parsed == 0 {
            warn!("metadata phase completed with zero parsed records");
        }

        progress.emit(OrchestrationProgress::with_percent(
            Phase::Metadata,
            format!("parsed {parsed} ebooks ({skipped} skipped)"),
            100.0,
        ));

        MetadataResult {
            success: true,
            cancelled: false,
            files_transferred: transfer_result.files_transferred,
            bytes_transferred: transfer_result.bytes_transferred,
            records_parsed: parsed,
            records_skipped: skipped,
            error_message: None,
        }
    }

    async fn flush_batch(&self, batch: &mut Vec<EbookRecord>) -> Result<(), crate::ports::CatalogError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.catalog.upsert_batch(batch).await?;
        batch.clear();
        Ok(())
    }

    async fn sync_content(
        &self,
        config: &SyncConfig,
        metadata: MetadataResult,
        progress: &dyn ProgressSink,
        cancel: CancellationToken,
    ) -> OrchestrationResult {
        progress.emit(OrchestrationProgress::message(Phase::Content, "syncing content files"));

        match self.catalog.stats().await {
            Ok(stats) => info!(total_ebooks = stats.total_ebooks, "catalog checklist loaded"),
            Err(err) => warn!(error = %err, "failed to load catalog stats for checklist"),
        }

        let preset = config.preset;
        let needs_second_pass = preset.needs_generated_formats_pass();
        let first_band_hi = if needs_second_pass { 50.0 } else { 100.0 };

        let content_dir = config.target_directory.join("gutenberg");
        let options = TransferOptions {
            include: preset.include_patterns(),
            timeout_seconds: config.content_timeout_seconds,
            dry_run: config.dry_run,
            show_progress: true,
            bandwidth_limit_kbps: config.bandwidth_limit_kbps,
            ..TransferOptions::default()
        };

        let bridge = ScaledProgressBridge {
            sink: progress,
            phase: Phase::Content,
            lo: 0.0,
            hi: first_band_hi,
        };

        let first_pass = self
            .transfer
            .sync(MAIN_CONTENT_ENDPOINT, &content_dir, &options, &bridge, cancel.clone())
            .await;

        let first_pass = match first_pass {
            Ok(result) => result,
            Err(err) => {
                return Self::content_error(metadata, 0, 0, err.to_string());
            }
        };

        if first_pass.is_cancelled() {
            return Self::content_cancelled(metadata, first_pass.files_transferred, first_pass.bytes_transferred);
        }
        if !first_pass.is_success() {
            return Self::content_error(
                metadata,
                first_pass.files_transferred,
                first_pass.bytes_transferred,
                first_pass.error_message.unwrap_or_default(),
            );
        }

        let mut files_synced = first_pass.files_transferred;
        let mut bytes_transferred = first_pass.bytes_transferred;

        if needs_second_pass {
            let generated_dir = config.target_directory.join("gutenberg-epub");
            let bridge = ScaledProgressBridge {
                sink: progress,
                phase: Phase::Content,
                lo: 50.0,
                hi: 100.0,
            };
            let second_pass = self
                .transfer
                .sync(
                    GENERATED_FORMATS_ENDPOINT,
                    &generated_dir,
                    &options,
                    &bridge,
                    cancel.clone(),
                )
                .await;

            match second_pass {
                Ok(result) if result.is_cancelled() => {
                    return Self::content_cancelled(
                        metadata,
                        files_synced + result.files_transferred,
                        bytes_transferred + result.bytes_transferred,
                    );
                }
                Ok(result) if !result.is_success() => {
                    return Self::content_error(
                        metadata,
                        files_synced + result.files_transferred,
                        bytes_transferred + result.bytes_transferred,
                        result.error_message.unwrap_or_default(),
                    );
                }
                Ok(result) => {
                    files_synced += result.files_transferred;
                    bytes_transferred += result.bytes_transferred;
                }
                Err(err) => {
                    return Self::content_error(metadata, files_synced, bytes_transferred, err.to_string());
                }
            }
        }

        progress.emit(OrchestrationProgress::with_percent(
            Phase::Content,
            "content sync complete",
            100.0,
        ));

        OrchestrationResult {
            metadata,
            success: true,
            cancelled: false,
            files_synced,
            bytes_transferred,
            error_message: None,
        }
    }

    fn content_cancelled(metadata: MetadataResult, files_synced: u64, bytes_transferred: u64) -> OrchestrationResult {
        OrchestrationResult {
            metadata,
            success: false,
            cancelled: true,
            files_synced,
            bytes_transferred,
            error_message: Some("Sync was cancelled. Run the same command again to resume.".to_string()),
        }
    }

    fn content_error(
        metadata: MetadataResult,
        files_synced: u64,
        bytes_transferred: u64,
        message: String,
    ) -> OrchestrationResult {
        OrchestrationResult {
            metadata,
            success: false,
            cancelled: false,
            files_synced,
            bytes_transferred,
            error_message: Some(message),
        }
    }
}

/// Secondary mirrors are not yet wired into automatic failover; this
/// constant list exists so a future CLI flag can select one explicitly.
/// TODO: surface `--mirror` on the CLI to pick from `SECONDARY_MIRRORS`.
#[allow(dead_code)]
const fn _secondary_mirrors_are_data_only() -> &'static [&'static str] {
    SECONDARY_MIRRORS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EbookRecord;
    use crate::ports::{
        CatalogError, CatalogStats, RdfError, RemoteFileInfo, SearchQuery, TransferError,
        TransferResult,
    };
    use crate::progress::NoopProgressSink;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubTransfer {
        result: TransferResult,
    }

    #[async_trait]
    impl TransferDriver for StubTransfer {
        async fn sync(
            &self,
            _endpoint: &str,
            _local_directory: &Path,
            _options: &TransferOptions,
            _progress: &dyn TransferProgressSink,
            _cancel: CancellationToken,
        ) -> Result<TransferResult, TransferError> {
            Ok(self.result.clone())
        }

        async fn list_remote(
            &self,
            _endpoint: &str,
            _pattern: Option<&str>,
            _cancel: CancellationToken,
        ) -> Result<Vec<RemoteFileInfo>, TransferError> {
            Ok(Vec::new())
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn tool_version(&self) -> Option<String> {
            None
        }
    }

    struct StubRdf {
        records: Vec<ParseOutcome>,
    }

    impl RdfParser for StubRdf {
        fn parse_directory(
            &self,
            _directory: &Path,
        ) -> Result<Box<dyn Iterator<Item = ParseOutcome> + Send>, RdfError> {
            Ok(Box::new(self.records.clone().into_iter()))
        }

        fn parse_file(&self, _path: &Path) -> ParseOutcome {
            ParseOutcome::Skipped {
                path: String::new(),
                reason: "not implemented in stub".to_string(),
            }
        }
    }

    #[derive(Default)]
    struct StubCatalog {
        upserted: Mutex<Vec<EbookRecord>>,
    }

    #[async_trait]
    impl CatalogStore for StubCatalog {
        async fn upsert(&self, record: &EbookRecord) -> Result<(), CatalogError> {
            self.upserted.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn upsert_batch(&self, records: &[EbookRecord]) -> Result<u64, CatalogError> {
            self.upserted.lock().unwrap().extend_from_slice(records);
            Ok(records.len() as u64)
        }

        async fn get(&self, _book_id: u32) -> Result<Option<crate::domain::Ebook>, CatalogError> {
            Ok(None)
        }

        async fn search(&self, _query: &SearchQuery) -> Result<Vec<crate::domain::Ebook>, CatalogError> {
            Ok(Vec::new())
        }

        async fn stats(&self) -> Result<CatalogStats, CatalogError> {
            Ok(CatalogStats::default())
        }

        async fn export(
            &self,
            _path: &Path,
            _format: &str,
            _query: &SearchQuery,
        ) -> Result<u64, CatalogError> {
            Ok(0)
        }

        async fn mark_verified(
            &self,
            _book_id: u32,
            _checksum: &str,
            _local_file_size_bytes: u64,
        ) -> Result<(), CatalogError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn metadata_only_sync_skips_content_phase() {
        let transfer = Arc::new(StubTransfer {
            result: TransferResult::success(0, 2, 2048),
        });
        let rdf = Arc::new(StubRdf {
            records: vec![ParseOutcome::Parsed(EbookRecord::new(1))],
        });
        let catalog = Arc::new(StubCatalog::default());
        let orchestrator = SyncOrchestrator::new(transfer, rdf, catalog.clone());

        let mut config = SyncConfig::with_defaults("/tmp/gutensync-test");
        config.metadata_only = true;

        let result = orchestrator
            .sync(&config, &NoopProgressSink, CancellationToken::new())
            .await;

        assert!(result.success);
        assert!(result.metadata.success);
        assert_eq!(result.metadata.records_parsed, 1);
        assert_eq!(catalog.upserted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_metadata_transfer_reports_cancelled_not_failed() {
        let transfer = Arc::new(StubTransfer {
            result: TransferResult::cancelled(0, 0),
        });
        let rdf = Arc::new(StubRdf { records: vec![] });
        let catalog = Arc::new(StubCatalog::default());
        let orchestrator = SyncOrchestrator::new(transfer, rdf, catalog);

        let config = SyncConfig::with_defaults("/tmp/gutensync-test");
        let result = orchestrator
            .sync(&config, &NoopProgressSink, CancellationToken::new())
            .await;

        assert!(!result.success);
        assert!(result.cancelled);
    }

    #[tokio::test]
    async fn skipped_rdf_files_do_not_abort_the_metadata_phase() {
        let transfer = Arc::new(StubTransfer {
            result: TransferResult::success(0, 1, 100),
        });
        let rdf = Arc::new(StubRdf {
            records: vec![
                ParseOutcome::Parsed(EbookRecord::new(1)),
                ParseOutcome::Skipped {
                    path: "bad.rdf".to_string(),
                    reason: "missing book id".to_string(),
                },
                ParseOutcome::Parsed(EbookRecord::new(2)),
            ],
        });
        let catalog = Arc::new(StubCatalog::default());
        let orchestrator = SyncOrchestrator::new(transfer, rdf, catalog.clone());

        let mut config = SyncConfig::with_defaults("/tmp/gutensync-test");
        config.metadata_only = true;

        let result = orchestrator
            .sync(&config, &NoopProgressSink, CancellationToken::new())
            .await;

        assert!(result.success);
        assert_eq!(result.metadata.records_parsed, 2);
        assert_eq!(result.metadata.records_skipped, 1);
        assert_eq!(catalog.upserted.lock().unwrap().len(), 2);
    }
}
