//! Port traits: the seams the rest of the crate programs against.
//!
//! Every adapter crate (`gutensync-transfer`, `gutensync-rdf`, `gutensync-db`)
//! implements one of these traits; the orchestrator and CLI depend only on
//! the trait objects, never on a concrete adapter type.

mod catalog_store;
mod errors;
mod rdf_parser;
mod transfer_driver;

pub use catalog_store::{CatalogStats, CatalogStore, SearchQuery};
pub use errors::{CatalogError, RdfError, TransferError};
pub use rdf_parser::{ParseOutcome, RdfParser};
pub use transfer_driver::{
    RemoteFileInfo, TransferDriver, TransferOptions, TransferOutcome, TransferResult,
};
