//! rsync-backed [`gutensync_core::TransferDriver`] implementation.

mod discovery;
mod progress_parser;
mod rsync_driver;

pub use discovery::{ToolDiscovery, ToolLocation, ToolSource};
pub use rsync_driver::RsyncDriver;

#[cfg(test)]
use tempfile as _;
