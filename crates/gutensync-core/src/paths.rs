//! Path resolution for the catalog database and configuration file.
//!
//! The original design forced the database path through a build-time
//! marker file, overriding whatever the caller asked for. That's dropped
//! here in favor of an explicit, documented precedence: an explicit path
//! wins outright, else a directory-relative default — never a path the
//! caller didn't ask for and can't predict. The one environment override
//! (`GUTENBERG_CATALOG_DATABASE_PATH`) is applied earlier, onto
//! [`crate::settings::SyncConfig::database_path`] by `with_env_overlay`,
//! so every caller resolves it the same way instead of each handler
//! reading its own environment variable.

use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from path resolution and directory setup.
#[derive(Debug, Error)]
pub enum PathError {
    /// Could not determine the user's home or config directory.
    #[error("cannot determine user config directory")]
    NoConfigDir,
    /// Failed to create a directory that resolution requires to exist.
    #[error("failed to create directory {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },
}

/// Resolve the catalog database path.
///
/// Precedence, highest first:
/// 1. `explicit`, when the caller names one (a CLI flag, or
///    [`crate::settings::SyncConfig::database_path`] after its own
///    environment overlay has already been applied).
/// 2. `{target_directory}/gutenberg.db`.
#[must_use]
pub fn database_path(explicit: Option<&Path>, target_directory: &Path) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    target_directory.join("gutenberg.db")
}

/// Resolve the directory holding the user-level configuration file
/// (`config.toml`), creating it if absent.
///
/// Resolution order: `GUTENSYNC_CONFIG_DIR` environment variable, else the
/// platform config directory (`~/.config/gutensync` on Linux, the
/// platform equivalent elsewhere) via [`dirs::config_dir`].
pub fn config_dir() -> Result<PathBuf, PathError> {
    let dir = if let Ok(path) = env::var("GUTENSYNC_CONFIG_DIR") {
        PathBuf::from(path)
    } else {
        dirs::config_dir()
            .ok_or(PathError::NoConfigDir)?
            .join("gutensync")
    };

    std::fs::create_dir_all(&dir).map_err(|e| PathError::CreateFailed {
        path: dir.clone(),
        reason: e.to_string(),
    })?;

    Ok(dir)
}

/// Path to the user-level configuration file within [`config_dir`].
pub fn config_file_path() -> Result<PathBuf, PathError> {
    Ok(config_dir()?.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins_over_everything() {
        let explicit = PathBuf::from("/custom/books.db");
        let target = PathBuf::from("/mirror");
        assert_eq!(database_path(Some(&explicit), &target), explicit);
    }

    #[test]
    fn default_is_target_directory_relative() {
        let target = PathBuf::from("/mirror/gutenberg");
        assert_eq!(
            database_path(None, &target),
            PathBuf::from("/mirror/gutenberg/gutenberg.db")
        );
    }

}
