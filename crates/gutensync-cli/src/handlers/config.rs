//! `config init`/`config validate` command handlers.

use anyhow::{Context, Result};
use gutensync_core::{config_file_path, SyncConfig};

const TEMPLATE: &str = r#"# gutensync configuration.
#
# Every field mirrors a GUTENBERG_* environment variable, which takes
# precedence over the value written here. Delete a line to fall back to
# the built-in default.

# Local directory the mirror is written under.
target_directory = "{target_directory}"

# Content selection: "text-only", "text-epub", "all-text", "full".
preset = "text-only"

# Skip the content phase entirely.
metadata_only = false

# Run verification after a successful sync.
verify_after_sync = false

# Enumerate without transferring.
dry_run = false

# Wall-clock limit for the content phase, in seconds. 0 means no limit.
content_timeout_seconds = 0

# Wall-clock limit for the metadata phase, in seconds.
metadata_timeout_seconds = {metadata_timeout_seconds}

# Tracing filter directive ("info", "debug", "gutensync=trace", ...).
logging_level = "info"
"#;

/// Write a commented configuration file with documented defaults.
pub async fn init(force: bool) -> Result<()> {
    let path = config_file_path()?;

    if path.exists() && !force {
        println!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            path.display()
        );
        return Ok(());
    }

    let defaults = SyncConfig::with_defaults(crate::bootstrap::default_target_directory());
    let contents = TEMPLATE
        .replace(
            "{target_directory}",
            &defaults.target_directory.display().to_string(),
        )
        .replace(
            "{metadata_timeout_seconds}",
            &defaults.metadata_timeout_seconds.to_string(),
        );

    tokio::fs::write(&path, contents)
        .await
        .with_context(|| format!("failed to write configuration file at {}", path.display()))?;

    println!("Wrote configuration file to {}", path.display());
    Ok(())
}

/// Minimal on-disk shape accepted by `config.toml`. Only fields the CLI
/// currently understands; unknown keys are ignored by `toml`'s default
/// deserialization behavior for structs without `deny_unknown_fields`.
#[derive(serde::Deserialize, Default)]
struct ConfigFile {
    target_directory: Option<String>,
    preset: Option<String>,
    metadata_only: Option<bool>,
    verify_after_sync: Option<bool>,
    dry_run: Option<bool>,
    content_timeout_seconds: Option<u64>,
    metadata_timeout_seconds: Option<u64>,
    logging_level: Option<String>,
}

/// Load the configuration file (if present), overlay environment
/// variables, and print the resulting effective values.
pub async fn validate() -> Result<()> {
    let path = config_file_path()?;

    let mut config = SyncConfig::with_defaults(crate::bootstrap::default_target_directory());

    if path.exists() {
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let parsed: ConfigFile = toml::from_str(&raw)
            .with_context(|| format!("failed to parse {} as TOML", path.display()))?;

        if let Some(dir) = parsed.target_directory {
            config.target_directory = dir.into();
        }
        if let Some(preset) = parsed.preset {
            config.preset = gutensync_core::ContentPreset::parse_or_default(&preset);
        }
        if let Some(v) = parsed.metadata_only {
            config.metadata_only = v;
        }
        if let Some(v) = parsed.verify_after_sync {
            config.verify_after_sync = v;
        }
        if let Some(v) = parsed.dry_run {
            config.dry_run = v;
        }
        if let Some(v) = parsed.content_timeout_seconds {
            config.content_timeout_seconds = v;
        }
        if let Some(v) = parsed.metadata_timeout_seconds {
            config.metadata_timeout_seconds = v;
        }
        if let Some(level) = parsed.logging_level {
            config.logging_level = level;
        }

        println!("Loaded configuration from {}", path.display());
    } else {
        println!(
            "No configuration file at {} (using built-in defaults).",
            path.display()
        );
    }

    config = config.with_env_overlay();
    gutensync_core::validate(&config)?;

    println!("Effective configuration:");
    println!("  target_directory:         {}", config.target_directory.display());
    println!("  preset:                   {:?}", config.preset);
    println!("  metadata_only:            {}", config.metadata_only);
    println!("  verify_after_sync:        {}", config.verify_after_sync);
    println!("  dry_run:                  {}", config.dry_run);
    println!("  content_timeout_seconds:  {}", config.content_timeout_seconds);
    println!("  metadata_timeout_seconds: {}", config.metadata_timeout_seconds);
    println!("  logging_level:            {}", config.logging_level);

    Ok(())
}
