//! `health` command handler.
//!
//! Checks, in order: transfer tool availability, catalog database
//! openability, and target directory writability. Exits 0 only if all
//! three pass.

use std::path::{Path, PathBuf};

use anyhow::Result;
use gutensync_core::TransferDriver;
use gutensync_db::SqliteCatalogStore;
use gutensync_transfer::RsyncDriver;

use crate::bootstrap::{default_target_directory, resolve_db_path};

fn check_writable(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }
    let probe = dir.join(".gutensync-health-check");
    let writable = std::fs::write(&probe, b"ok").is_ok();
    let _ = std::fs::remove_file(&probe);
    writable
}

/// Run `health`, returning the process exit code.
pub async fn execute(target_dir: Option<PathBuf>, db_path: Option<PathBuf>) -> Result<i32> {
    let target_directory = target_dir.unwrap_or_else(default_target_directory);
    let mut all_ok = true;

    let transfer = RsyncDriver::new();
    if transfer.is_available().await {
        println!("[ok]   transfer tool (rsync) is available");
    } else {
        println!("[fail] transfer tool (rsync) not found on PATH");
        all_ok = false;
    }

    let resolved_db_path = resolve_db_path(db_path.as_deref(), &target_directory);
    match SqliteCatalogStore::connect(&resolved_db_path).await {
        Ok(_) => println!("[ok]   catalog database opens at {}", resolved_db_path.display()),
        Err(err) => {
            println!("[fail] catalog database at {} failed to open: {err}", resolved_db_path.display());
            all_ok = false;
        }
    }

    if check_writable(&target_directory) {
        println!("[ok]   target directory {} is writable", target_directory.display());
    } else {
        println!("[fail] target directory {} is not writable", target_directory.display());
        all_ok = false;
    }

    Ok(if all_ok { 0 } else { 1 })
}
