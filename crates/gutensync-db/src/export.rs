//! Catalog export to CSV or JSON.
//!
//! No `csv` crate appears anywhere in the wider dependency set this crate
//! draws from, so the writer is hand-rolled: a handful of fields, quoted
//! only when they contain a comma, quote, or newline, per RFC 4180.

use std::path::Path;

use gutensync_core::domain::Ebook;
use gutensync_core::ports::CatalogError;
use tokio::io::AsyncWriteExt;

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn ebook_to_csv_row(ebook: &Ebook) -> String {
    let authors = ebook
        .associations
        .authors
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    let subjects = ebook.associations.subjects.join("; ");
    let bookshelves = ebook.associations.bookshelves.join("; ");

    [
        ebook.book_id.to_string(),
        csv_field(&ebook.title),
        csv_field(&authors),
        csv_field(ebook.language.as_deref().unwrap_or_default()),
        ebook
            .publication_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        ebook.download_count.map(|c| c.to_string()).unwrap_or_default(),
        csv_field(&subjects),
        csv_field(&bookshelves),
    ]
    .join(",")
}

/// Write `ebooks` to `path` in `"csv"` or `"json"` format. Returns the
/// number of rows written, or [`CatalogError::ExportFailed`] for an
/// unrecognized format or I/O failure.
pub async fn write_export(
    ebooks: &[Ebook],
    path: &Path,
    format: &str,
) -> Result<u64, CatalogError> {
    match format {
        "csv" => write_csv(ebooks, path).await,
        "json" => write_json(ebooks, path).await,
        other => Err(CatalogError::ExportFailed(format!(
            "unsupported export format: {other}"
        ))),
    }
}

async fn write_csv(ebooks: &[Ebook], path: &Path) -> Result<u64, CatalogError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| CatalogError::ExportFailed(e.to_string()))?;

    file.write_all(
        b"book_id,title,authors,language,publication_date,download_count,subjects,bookshelves\n",
    )
    .await
    .map_err(|e| CatalogError::ExportFailed(e.to_string()))?;

    for ebook in ebooks {
        let line = format!("{}\n", ebook_to_csv_row(ebook));
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| CatalogError::ExportFailed(e.to_string()))?;
    }

    Ok(ebooks.len() as u64)
}

async fn write_json(ebooks: &[Ebook], path: &Path) -> Result<u64, CatalogError> {
    let json = serde_json::to_vec_pretty(ebooks)
        .map_err(|e| CatalogError::ExportFailed(e.to_string()))?;

    tokio::fs::write(path, json)
        .await
        .map_err(|e| CatalogError::ExportFailed(e.to_string()))?;

    Ok(ebooks.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gutensync_core::domain::{Author, EbookAssociations};

    fn sample_ebook() -> Ebook {
        Ebook {
            book_id: 12345,
            title: "Pride, and Prejudice".to_string(),
            language: Some("English".to_string()),
            language_short_code: Some("en".to_string()),
            publication_date: None,
            rights: None,
            download_count: Some(42),
            rdf_path: None,
            source_url: None,
            verified_utc: None,
            checksum: None,
            local_file_size_bytes: None,
            created_utc: Utc::now(),
            updated_utc: Utc::now(),
            associations: EbookAssociations {
                authors: vec![Author {
                    id: 1,
                    name: "Austen, Jane".to_string(),
                    birth_year: None,
                    death_year: None,
                    webpage: None,
                }],
                subjects: vec!["Courtship -- Fiction".to_string()],
                bookshelves: vec!["Best Books Ever Listings".to_string()],
            },
        }
    }

    #[test]
    fn csv_field_quotes_commas() {
        assert_eq!(csv_field("Pride, and Prejudice"), "\"Pride, and Prejudice\"");
        assert_eq!(csv_field("Emma"), "Emma");
    }

    #[tokio::test]
    async fn write_export_rejects_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xml");
        let err = write_export(&[sample_ebook()], &path, "xml").await.unwrap_err();
        assert!(matches!(err, CatalogError::ExportFailed(_)));
    }

    #[tokio::test]
    async fn write_csv_produces_header_and_one_row_per_ebook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let count = write_export(&[sample_ebook()], &path, "csv").await.unwrap();
        assert_eq!(count, 1);

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("\"Pride, and Prejudice\""));
        assert!(contents
            .lines()
            .next()
            .unwrap()
            .ends_with("subjects,bookshelves"));
        assert!(contents.contains("Courtship -- Fiction"));
        assert!(contents.contains("Best Books Ever Listings"));
    }

    #[tokio::test]
    async fn write_json_round_trips_book_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_export(&[sample_ebook()], &path, "json").await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(contents.contains("12345"));
    }
}
