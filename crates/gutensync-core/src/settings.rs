//! Sync configuration: an explicit, immutable value assembled once by the
//! composition root.
//!
//! The original design kept this in a mutable global/DI-container; here it
//! is a plain value, built by [`SyncConfig::with_defaults`] and optionally
//! overlaid with environment variables via [`SyncConfig::with_env_overlay`],
//! then passed down by value to the orchestrator and never mutated again.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Primary content mirror module (hierarchical layout).
pub const MAIN_CONTENT_ENDPOINT: &str = "aleph.gutenberg.org::gutenberg";
/// Generated-formats and per-book RDF mirror module (flat layout).
pub const GENERATED_FORMATS_ENDPOINT: &str = "aleph.gutenberg.org::gutenberg-epub";
/// Secondary failover mirrors, in preference order.
pub const SECONDARY_MIRRORS: &[&str] = &[
    "ftp.ibiblio.org::gutenberg",
    "rsync.mirrorservice.org::gutenberg.org",
];

/// Default wall-clock limit for the metadata phase, in seconds.
pub const DEFAULT_METADATA_TIMEOUT_SECONDS: u64 = 3600;
/// Upsert progress is reported every this many parsed RDF files.
pub const METADATA_PROGRESS_BATCH: u64 = 100;

/// A closed set of content selections, resolved to include-glob lists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentPreset {
    /// `*.txt`, `*.zip`.
    #[default]
    TextOnly,
    /// Adds `*.epub`, `*.epub.noimages`.
    TextEpub,
    /// `*.txt`, `*.zip`, `*.html`, `*.htm`.
    AllText,
    /// No include filter at all.
    Full,
}

impl ContentPreset {
    /// Resolve to the include-glob list the Transfer Driver should apply.
    #[must_use]
    pub fn include_patterns(self) -> Vec<String> {
        match self {
            Self::TextOnly => vec!["*.txt".to_string(), "*.zip".to_string()],
            Self::TextEpub => vec![
                "*.txt".to_string(),
                "*.zip".to_string(),
                "*.epub".to_string(),
                "*.epub.noimages".to_string(),
            ],
            Self::AllText => vec![
                "*.txt".to_string(),
                "*.zip".to_string(),
                "*.html".to_string(),
                "*.htm".to_string(),
            ],
            Self::Full => Vec::new(),
        }
    }

    /// Whether this preset also needs a pass against the generated-formats
    /// (secondary) endpoint, per §4.5 Phase 2 step 3.
    #[must_use]
    pub const fn needs_generated_formats_pass(self) -> bool {
        !matches!(self, Self::TextOnly | Self::AllText)
    }

    /// Parse a preset name as accepted on the CLI (`text-only`, `text-epub`,
    /// `all-text`, `full`). Unknown input falls back to [`ContentPreset::TextOnly`],
    /// matching the documented default/fallback rule.
    #[must_use]
    pub fn parse_or_default(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "text-epub" => Self::TextEpub,
            "all-text" => Self::AllText,
            "full" => Self::Full,
            _ => Self::TextOnly,
        }
    }
}

/// Immutable configuration for one sync invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base local directory the mirror is written under.
    pub target_directory: PathBuf,
    /// Content selection.
    pub preset: ContentPreset,
    /// Skip the content phase entirely.
    pub metadata_only: bool,
    /// Run verification after a successful sync.
    pub verify_after_sync: bool,
    /// Enumerate without transferring.
    pub dry_run: bool,
    /// Wall-clock limit for the content phase; `0` means no limit.
    pub content_timeout_seconds: u64,
    /// Wall-clock limit for the metadata phase; `0` means no limit.
    pub metadata_timeout_seconds: u64,
    /// Transfer rate cap, in kilobits per second.
    pub bandwidth_limit_kbps: Option<u64>,
    /// Explicit catalog database path, overriding the default resolution.
    pub database_path: Option<PathBuf>,
    /// Tracing filter directive (`"info"`, `"debug"`, `"gutensync=trace"`, …).
    pub logging_level: String,
    /// When set, logs are additionally written to this file.
    pub logging_file_path: Option<PathBuf>,
}

impl SyncConfig {
    /// Build a config with documented defaults for `target_directory`.
    #[must_use]
    pub fn with_defaults(target_directory: impl Into<PathBuf>) -> Self {
        Self {
            target_directory: target_directory.into(),
            preset: ContentPreset::default(),
            metadata_only: false,
            verify_after_sync: false,
            dry_run: false,
            content_timeout_seconds: 0,
            metadata_timeout_seconds: DEFAULT_METADATA_TIMEOUT_SECONDS,
            bandwidth_limit_kbps: None,
            database_path: None,
            logging_level: "info".to_string(),
            logging_file_path: None,
        }
    }

    /// Overlay the documented `GUTENBERG_*` environment variables on top of
    /// this config, returning a new value. Unset or unparsable variables are
    /// left at whatever this instance already held.
    #[must_use]
    pub fn with_env_overlay(mut self) -> Self {
        if let Ok(dir) = env::var("GUTENBERG_SYNC_TARGET_DIRECTORY") {
            if !dir.trim().is_empty() {
                self.target_directory = PathBuf::from(dir);
            }
        }

        if let Ok(limit) = env::var("GUTENBERG_SYNC_BANDWIDTH_LIMIT_KBPS") {
            if let Ok(parsed) = limit.trim().parse::<u64>() {
                self.bandwidth_limit_kbps = Some(parsed);
            }
        }

        if let Ok(path) = env::var("GUTENBERG_CATALOG_DATABASE_PATH") {
            if !path.trim().is_empty() {
                self.database_path = Some(PathBuf::from(path));
            }
        }

        if let Ok(level) = env::var("GUTENBERG_LOGGING_LEVEL") {
            if !level.trim().is_empty() {
                self.logging_level = level;
            }
        }

        if let Ok(path) = env::var("GUTENBERG_LOGGING_FILE_PATH") {
            if !path.trim().is_empty() {
                self.logging_file_path = Some(PathBuf::from(path));
            }
        }

        self
    }
}

/// Validation error for a [`SyncConfig`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    /// `target_directory` was empty.
    #[error("target directory cannot be empty")]
    EmptyTargetDirectory,
    /// A timeout value could not apply (reserved for future bounds checks;
    /// any `u64` is currently accepted, including 0 for "no timeout").
    #[error("invalid timeout value: {0}")]
    InvalidTimeout(u64),
}

/// Validate a [`SyncConfig`] before it is handed to the orchestrator.
pub fn validate(config: &SyncConfig) -> Result<(), SettingsError> {
    if config.target_directory.as_os_str().is_empty() {
        return Err(SettingsError::EmptyTargetDirectory);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_text_only_preset_and_no_timeout() {
        let config = SyncConfig::with_defaults("/mirror");
        assert_eq!(config.preset, ContentPreset::TextOnly);
        assert_eq!(config.content_timeout_seconds, 0);
        assert_eq!(
            config.metadata_timeout_seconds,
            DEFAULT_METADATA_TIMEOUT_SECONDS
        );
    }

    #[test]
    fn text_only_preset_resolves_expected_globs() {
        assert_eq!(
            ContentPreset::TextOnly.include_patterns(),
            vec!["*.txt".to_string(), "*.zip".to_string()]
        );
    }

    #[test]
    fn full_preset_has_no_include_filter() {
        assert!(ContentPreset::Full.include_patterns().is_empty());
    }

    #[test]
    fn unknown_preset_name_falls_back_to_text_only() {
        assert_eq!(
            ContentPreset::parse_or_default("bogus"),
            ContentPreset::TextOnly
        );
    }

    #[test]
    fn text_only_and_all_text_skip_generated_formats_pass() {
        assert!(!ContentPreset::TextOnly.needs_generated_formats_pass());
        assert!(!ContentPreset::AllText.needs_generated_formats_pass());
        assert!(ContentPreset::TextEpub.needs_generated_formats_pass());
        assert!(ContentPreset::Full.needs_generated_formats_pass());
    }

    #[test]
    fn env_overlay_overrides_target_directory_and_bandwidth() {
        env::set_var("GUTENBERG_SYNC_TARGET_DIRECTORY", "/from/env");
        env::set_var("GUTENBERG_SYNC_BANDWIDTH_LIMIT_KBPS", "512");

        let config = SyncConfig::with_defaults("/default").with_env_overlay();
        assert_eq!(config.target_directory, PathBuf::from("/from/env"));
        assert_eq!(config.bandwidth_limit_kbps, Some(512));

        env::remove_var("GUTENBERG_SYNC_TARGET_DIRECTORY");
        env::remove_var("GUTENBERG_SYNC_BANDWIDTH_LIMIT_KBPS");
    }

    #[test]
    fn empty_target_directory_fails_validation() {
        let config = SyncConfig::with_defaults("");
        assert!(matches!(
            validate(&config),
            Err(SettingsError::EmptyTargetDirectory)
        ));
    }
}
