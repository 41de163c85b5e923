//! Domain types, port traits, and the Sync Orchestrator service shared by
//! every `gutensync` adapter crate.

pub mod domain;
pub mod paths;
pub mod ports;
pub mod progress;
pub mod services;
pub mod settings;

pub use domain::{
    Author, AuthorRecord, Ebook, EbookAssociations, EbookRecord, LanguageMapper, RangeBound,
    RangeQuery, LANGUAGE_TABLE,
};
pub use paths::{config_dir, config_file_path, database_path, PathError};
pub use ports::{
    CatalogError, CatalogStats, CatalogStore, ParseOutcome, RdfError, RdfParser, RemoteFileInfo,
    SearchQuery, TransferDriver, TransferError, TransferOptions, TransferOutcome, TransferResult,
};
pub use progress::{
    NoopProgressSink, NoopTransferProgressSink, OrchestrationProgress, Phase, ProgressSink,
    TransferProgress, TransferProgressSink,
};
pub use services::{MetadataResult, OrchestrationResult, SyncOrchestrator};
pub use settings::{
    validate, ContentPreset, SettingsError, SyncConfig, GENERATED_FORMATS_ENDPOINT,
    MAIN_CONTENT_ENDPOINT, SECONDARY_MIRRORS,
};

#[cfg(test)]
use tempfile as _;
