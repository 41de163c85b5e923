//! CLI entry point — the composition root.
//!
//! Command dispatch lives here; everything else is delegated to
//! `handlers::*`. No infrastructure is wired up outside of `bootstrap`.

use clap::Parser;

use gutensync_cli::commands::{CatalogCommand, Cli, Commands, ConfigCommand};
use gutensync_cli::handlers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = std::env::var("GUTENBERG_LOGGING_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    let exit_code = match command {
        Commands::Sync {
            target_dir,
            preset,
            metadata_only,
            dry_run,
            verify,
            auto_retry,
            max_retries,
            retry_delay,
            timeout,
            bandwidth_limit_kbps,
            db_path,
        } => {
            handlers::sync::execute(handlers::sync::SyncArgs {
                target_dir,
                preset,
                metadata_only,
                dry_run,
                verify,
                auto_retry,
                max_retries,
                retry_delay,
                timeout,
                bandwidth_limit_kbps,
                db_path,
            })
            .await?
        }

        Commands::Catalog { command } => match command {
            CatalogCommand::Search {
                text,
                author,
                language,
                subject,
                limit,
                offset,
                export,
                export_format,
                db_path,
                target_dir,
            } => {
                handlers::catalog::search(handlers::catalog::SearchArgs {
                    text,
                    author,
                    language,
                    subject,
                    limit,
                    offset,
                    export,
                    export_format,
                    db_path,
                    target_dir,
                })
                .await?;
                0
            }
            CatalogCommand::Stats { db_path, target_dir } => {
                handlers::catalog::stats(db_path, target_dir).await?;
                0
            }
        },

        Commands::Config { command } => {
            match command {
                ConfigCommand::Init { force } => handlers::config::init(force).await?,
                ConfigCommand::Validate => handlers::config::validate().await?,
            }
            0
        }

        Commands::Health { target_dir, db_path } => {
            handlers::health::execute(target_dir, db_path).await?
        }
    };

    std::process::exit(exit_code);
}
