//! `catalog search`/`catalog stats` command handlers.

use std::path::PathBuf;

use anyhow::Result;
use gutensync_core::{CatalogStore, RangeBound, SearchQuery};

use crate::bootstrap::{default_target_directory, open_catalog};
use crate::presentation::{format_optional, print_separator, truncate_string};

/// Flags collected from `catalog search`.
pub struct SearchArgs {
    pub text: Option<String>,
    pub author: Option<String>,
    pub language: Option<String>,
    pub subject: Option<String>,
    pub limit: u32,
    pub offset: u32,
    pub export: Option<PathBuf>,
    pub export_format: String,
    pub db_path: Option<PathBuf>,
    pub target_dir: Option<PathBuf>,
}

fn build_query(args: &SearchArgs) -> SearchQuery {
    SearchQuery {
        text: args.text.clone(),
        author: args.author.clone(),
        language: args.language.clone(),
        subject: args.subject.clone(),
        publication_date_range: None::<RangeBound<chrono::NaiveDate>>,
        book_id_range: None,
        limit: Some(args.limit),
        offset: args.offset,
    }
}

/// Run `catalog search`.
pub async fn search(args: SearchArgs) -> Result<()> {
    let target_directory = args
        .target_dir
        .clone()
        .unwrap_or_else(default_target_directory);
    let catalog = open_catalog(args.db_path.as_deref(), &target_directory).await?;

    let query = build_query(&args);

    if let Some(export_path) = &args.export {
        let count = catalog
            .export(export_path, &args.export_format, &query)
            .await?;
        println!("Exported {count} row(s) to {}", export_path.display());
        return Ok(());
    }

    let results = catalog.search(&query).await?;

    if results.is_empty() {
        println!("No matching ebooks found.");
        return Ok(());
    }

    println!("Found {} ebook(s):\n", results.len());
    println!(
        "{:<8} {:<40} {:<20} {:<8} Authors",
        "ID", "Title", "Language", "Year"
    );
    print_separator(100);

    for ebook in results {
        let authors = ebook
            .associations
            .authors
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        let year = ebook
            .publication_date
            .map(|d| d.format("%Y").to_string())
            .unwrap_or_else(|| "--".to_string());

        println!(
            "{:<8} {:<40} {:<20} {:<8} {}",
            ebook.book_id,
            truncate_string(&ebook.title, 39),
            truncate_string(&format_optional(&ebook.language, "--"), 19),
            year,
            truncate_string(&authors, 40)
        );
    }

    Ok(())
}

/// Run `catalog stats`.
pub async fn stats(db_path: Option<PathBuf>, target_dir: Option<PathBuf>) -> Result<()> {
    let target_directory = target_dir.unwrap_or_else(default_target_directory);
    let catalog = open_catalog(db_path.as_deref(), &target_directory).await?;

    let stats = catalog.stats().await?;

    println!("Catalog statistics");
    print_separator(30);
    println!("Ebooks:      {}", stats.total_ebooks);
    println!("Authors:     {}", stats.total_authors);
    println!("Languages:   {}", stats.total_languages);
    println!("Verified:    {}", stats.verified_count);
    println!(
        "Local bytes: {:.2} MB",
        stats.total_local_bytes as f64 / (1024.0 * 1024.0)
    );

    Ok(())
}
