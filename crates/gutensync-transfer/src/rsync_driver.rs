//! The `rsync`-backed [`TransferDriver`] implementation.
//!
//! Modeled on the corpus's subprocess-driven download bridge: a dedicated
//! stdout reader task races a waiter for process exit, both under a
//! `tokio::select!` that also watches the caller's cancellation token and
//! an independent timeout timer, so the two can be told apart in the
//! returned [`TransferResult`].

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use gutensync_core::{
    RemoteFileInfo, TransferDriver, TransferError, TransferOptions, TransferProgressSink,
    TransferResult,
};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::discovery::ToolDiscovery;
use crate::progress_parser::ProgressParser;

/// Drives the `rsync` binary to mirror one module tree at a time.
pub struct RsyncDriver {
    discovery: ToolDiscovery,
}

impl Default for RsyncDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl RsyncDriver {
    /// Build a driver that discovers `rsync` on first use.
    #[must_use]
    pub fn new() -> Self {
        Self {
            discovery: ToolDiscovery::new(),
        }
    }

    async fn resolve_executable(&self) -> Result<std::path::PathBuf, TransferError> {
        self.discovery
            .locate()
            .await
            .map(|location| location.executable)
            .ok_or_else(|| TransferError::ToolMissing(self.discovery.install_instructions()))
    }

    fn build_command(executable: &Path, endpoint: &str, local_directory: &Path, options: &TransferOptions) -> Command {
        let mut cmd = Command::new(executable);
        cmd.arg("-a").arg("-v").arg("-h");
        cmd.arg("--partial").arg("--partial-dir=.rsync-partial");

        if options.show_progress {
            cmd.arg("--progress");
        }
        for pattern in &options.include {
            cmd.arg(format!("--include={pattern}"));
        }
        for pattern in &options.exclude {
            cmd.arg(format!("--exclude={pattern}"));
        }
        if let Some(max_mb) = options.max_file_size_mb {
            cmd.arg(format!("--max-size={max_mb}m"));
        }
        if let Some(kbps) = options.bandwidth_limit_kbps {
            cmd.arg(format!("--bwlimit={kbps}"));
        }
        if options.delete_removed {
            cmd.arg("--delete");
        }
        if options.dry_run {
            cmd.arg("--dry-run");
        }

        cmd.arg(endpoint).arg(local_directory);
        cmd.kill_on_drop(true);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd
    }
}

#[async_trait]
impl TransferDriver for RsyncDriver {
    async fn sync(
        &self,
        endpoint: &str,
        local_directory: &Path,
        options: &TransferOptions,
        progress: &dyn TransferProgressSink,
        cancel: CancellationToken,
    ) -> Result<TransferResult, TransferError> {
        tokio::fs::create_dir_all(local_directory).await?;

        let executable = self.resolve_executable().await?;
        let mut cmd = Self::build_command(&executable, endpoint, local_directory, options);

        let mut child = cmd
            .spawn()
            .map_err(|e| TransferError::SpawnFailed(e.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransferError::SpawnFailed("missing stdout handle".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TransferError::SpawnFailed("missing stderr handle".to_string()))?;

        let mut lines = BufReader::new(stdout).lines();
        let mut stderr_reader = BufReader::new(stderr);
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr_reader.read_to_end(&mut buf).await;
            buf
        });

        let mut parser = ProgressParser::new();
        let mut files_transferred: u64 = 0;
        let mut bytes_transferred: u64 = 0;

        let timeout_duration = Duration::from_secs(options.timeout_seconds.max(1));
        let sleep = tokio::time::sleep(timeout_duration);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    let _ = child.kill().await;
                    return Ok(TransferResult::cancelled(files_transferred, bytes_transferred));
                }

                () = &mut sleep, if options.timeout_seconds > 0 => {
                    let _ = child.kill().await;
                    return Ok(TransferResult::timed_out(files_transferred, bytes_transferred));
                }

                line = lines.next_line() => {
                    let line = line.map_err(TransferError::Io)?;
                    let Some(line) = line else { break; };
                    debug!(line = %line, "rsync stdout");

                    if let Some(record) = parser.feed(&line) {
                        files_transferred = record.files_transferred;
                        bytes_transferred = record.bytes_transferred;
                        progress.emit(record);
                    }
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(TransferError::Io)?;

        let stderr_bytes = stderr_task.await.unwrap_or_default();
        let stderr_text = String::from_utf8_lossy(&stderr_bytes).trim().to_string();

        if status.success() {
            Ok(TransferResult::success(0, files_transferred, bytes_transferred))
        } else {
            if !stderr_text.is_empty() {
                warn!(stderr = %stderr_text, "rsync exited non-zero");
            }
            let detail = if stderr_text.is_empty() {
                format!("rsync exited with status {status}")
            } else {
                stderr_text
            };
            Ok(TransferResult::failed(status.code(), detail))
        }
    }

    async fn list_remote(
        &self,
        endpoint: &str,
        pattern: Option<&str>,
        cancel: CancellationToken,
    ) -> Result<Vec<RemoteFileInfo>, TransferError> {
        let executable = self.resolve_executable().await?;

        let mut cmd = Command::new(&executable);
        cmd.arg("--list-only").arg("-r");
        if let Some(pattern) = pattern {
            cmd.arg(format!("--include={pattern}")).arg("--exclude=*");
        }
        cmd.arg(endpoint);
        cmd.kill_on_drop(true);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let child_fut = cmd.output();
        tokio::select! {
            () = cancel.cancelled() => Err(TransferError::ListFailed("cancelled".to_string())),
            result = child_fut => {
                let output = result.map_err(|e| TransferError::ListFailed(e.to_string()))?;
                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                    return Err(TransferError::ListFailed(stderr));
                }
                Ok(parse_listing(&String::from_utf8_lossy(&output.stdout)))
            }
        }
    }

    async fn is_available(&self) -> bool {
        self.discovery.locate().await.is_some()
    }

    async fn tool_version(&self) -> Option<String> {
        self.discovery.locate().await.and_then(|l| l.version)
    }
}

/// Parses `rsync --list-only` output lines of shape
/// `"drwxr-xr-x          4,096 2024/01/01 00:00:00 path/to/entry"`.
fn parse_listing(output: &str) -> Vec<RemoteFileInfo> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let perms = fields.next()?;
            let size_field = fields.next()?;
            let _date = fields.next()?;
            let _time = fields.next()?;
            let rest: Vec<&str> = fields.collect();
            if rest.is_empty() {
                return None;
            }
            let path = rest.join(" ");
            let size = size_field.replace(',', "").parse().ok();
            Some(RemoteFileInfo {
                path,
                size,
                is_directory: perms.starts_with('d'),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_typical_listing_line() {
        let output = "drwxr-xr-x          4,096 2024/01/01 00:00:00 1\n\
                       -rw-r--r--         12,345 2024/01/01 00:00:01 1/pg1.txt";
        let entries = parse_listing(output);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_directory);
        assert!(!entries[1].is_directory);
        assert_eq!(entries[1].size, Some(12_345));
        assert_eq!(entries[1].path, "1/pg1.txt");
    }

    #[test]
    fn empty_listing_produces_no_entries() {
        assert!(parse_listing("").is_empty());
    }
}
