//! `sync` command handler: drives one [`SyncOrchestrator::sync`] call, plus
//! the auto-retry loop and optional post-sync verification.
//!
//! The retry loop lives here, outside the orchestrator, per the
//! cancel-vs-timeout split the orchestrator documents: a cancelled run is
//! never retried, only a plain failure is.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use gutensync_core::{ContentPreset, OrchestrationResult, SyncConfig};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::bootstrap::{bootstrap, default_target_directory};

/// Flags collected from the `sync` subcommand.
pub struct SyncArgs {
    pub target_dir: Option<PathBuf>,
    pub preset: String,
    pub metadata_only: bool,
    pub dry_run: bool,
    pub verify: bool,
    pub auto_retry: bool,
    pub max_retries: u32,
    pub retry_delay: u64,
    pub timeout: u64,
    pub bandwidth_limit_kbps: Option<u64>,
    pub db_path: Option<PathBuf>,
}

fn print_progress(progress: gutensync_core::OrchestrationProgress) {
    match progress.progress_percent {
        Some(percent) => println!(
            "[{}] {:>5.1}%  {}",
            progress.phase.label(),
            percent,
            progress.message
        ),
        None => println!("[{}] {}", progress.phase.label(), progress.message),
    }
}

/// Run `sync`, returning the process exit code (0 success, 1 error, 130
/// user-initiated cancel).
pub async fn execute(args: SyncArgs) -> Result<i32> {
    let target_directory = args
        .target_dir
        .clone()
        .unwrap_or_else(default_target_directory);

    let mut config = SyncConfig::with_defaults(target_directory.clone()).with_env_overlay();
    config.preset = ContentPreset::parse_or_default(&args.preset);
    config.metadata_only = args.metadata_only;
    config.dry_run = args.dry_run;
    config.verify_after_sync = args.verify;
    config.content_timeout_seconds = args.timeout;
    if args.bandwidth_limit_kbps.is_some() {
        config.bandwidth_limit_kbps = args.bandwidth_limit_kbps;
    }
    if args.db_path.is_some() {
        config.database_path = args.db_path.clone();
    }

    gutensync_core::validate(&config)?;

    let ctx = bootstrap(config.database_path.as_deref(), &config.target_directory).await?;

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("cancellation requested");
            ctrl_c_cancel.cancel();
        }
    });

    let mut attempt: u32 = 0;
    let result: OrchestrationResult = loop {
        attempt += 1;
        info!(attempt, "starting sync run");

        let outcome = ctx
            .orchestrator
            .sync(&config, &print_progress, cancel.clone())
            .await;

        if outcome.success || outcome.cancelled || !args.auto_retry || attempt > args.max_retries {
            break outcome;
        }

        warn!(
            attempt,
            error = outcome.error_message.as_deref().unwrap_or("unknown"),
            "sync attempt failed, retrying"
        );
        tokio::time::sleep(Duration::from_secs(args.retry_delay)).await;
    };

    if result.cancelled {
        println!("Sync was cancelled. Run the same command again to resume.");
        return Ok(130);
    }

    if !result.success {
        eprintln!(
            "Sync failed: {}",
            result.error_message.as_deref().unwrap_or("unknown error")
        );
        return Ok(1);
    }

    println!(
        "Sync complete. {} metadata files, {} content files transferred.",
        result.metadata.files_transferred, result.files_synced
    );

    Ok(0)
}
