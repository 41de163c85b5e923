//! Row mapping helpers for the `ebooks`/`authors` tables.

use chrono::{DateTime, NaiveDate, Utc};
use gutensync_core::domain::{Author, Ebook, EbookAssociations};
use gutensync_core::ports::CatalogError;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Shared SELECT column list for `ebooks` queries, kept in one place so
/// every query that fetches a row stays in sync with [`row_to_ebook`].
pub const EBOOK_SELECT_COLUMNS: &str = "book_id, title, language, language_short_code, \
    publication_date, rights, download_count, rdf_path, source_url, verified_utc, \
    checksum, local_file_size_bytes, created_utc, updated_utc";

fn storage_err(e: sqlx::Error) -> CatalogError {
    CatalogError::Database(e.to_string())
}

/// Parse an RFC 3339 timestamp column, mapping a parse failure to `None`
/// rather than failing the whole row — a malformed timestamp should not
/// make an otherwise-valid catalog row unreadable.
fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value.and_then(|s| DateTime::parse_from_rfc3339(&s).ok().map(|dt| dt.with_timezone(&Utc)))
}

fn parse_date(value: Option<String>) -> Option<NaiveDate> {
    value.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

/// Map one `ebooks` row to an [`Ebook`], with empty associations — callers
/// fill those in via [`load_associations`] since they live in separate
/// tables and a single flat query would duplicate the parent row per
/// association.
pub fn row_to_ebook(row: &SqliteRow) -> Result<Ebook, CatalogError> {
    let created_utc: String = row.try_get("created_utc").map_err(storage_err)?;
    let updated_utc: String = row.try_get("updated_utc").map_err(storage_err)?;

    Ok(Ebook {
        book_id: row.try_get::<i64, _>("book_id").map_err(storage_err)? as u32,
        title: row.try_get("title").map_err(storage_err)?,
        language: row.try_get("language").map_err(storage_err)?,
        language_short_code: row.try_get("language_short_code").map_err(storage_err)?,
        publication_date: parse_date(row.try_get("publication_date").map_err(storage_err)?),
        rights: row.try_get("rights").map_err(storage_err)?,
        download_count: row
            .try_get::<Option<i64>, _>("download_count")
            .map_err(storage_err)?
            .map(|v| v as u64),
        rdf_path: row.try_get("rdf_path").map_err(storage_err)?,
        source_url: row.try_get("source_url").map_err(storage_err)?,
        verified_utc: parse_timestamp(row.try_get("verified_utc").map_err(storage_err)?),
        checksum: row.try_get("checksum").map_err(storage_err)?,
        local_file_size_bytes: row
            .try_get::<Option<i64>, _>("local_file_size_bytes")
            .map_err(storage_err)?
            .map(|v| v as u64),
        created_utc: parse_timestamp(Some(created_utc)).unwrap_or_else(Utc::now),
        updated_utc: parse_timestamp(Some(updated_utc)).unwrap_or_else(Utc::now),
        associations: EbookAssociations::default(),
    })
}

fn row_to_author(row: &SqliteRow) -> Result<Author, CatalogError> {
    Ok(Author {
        id: row.try_get("id").map_err(storage_err)?,
        name: row.try_get("name").map_err(storage_err)?,
        birth_year: row.try_get("birth_year").map_err(storage_err)?,
        death_year: row.try_get("death_year").map_err(storage_err)?,
        webpage: row.try_get("webpage").map_err(storage_err)?,
    })
}

/// Load the authors, subjects, and bookshelves associated with one ebook.
pub async fn load_associations(
    pool: &SqlitePool,
    book_id: u32,
) -> Result<EbookAssociations, CatalogError> {
    let author_rows = sqlx::query(
        "SELECT a.id, a.name, a.birth_year, a.death_year, a.webpage \
         FROM authors a JOIN ebook_authors ea ON ea.author_id = a.id \
         WHERE ea.ebook_id = ? ORDER BY a.name",
    )
    .bind(book_id)
    .fetch_all(pool)
    .await
    .map_err(storage_err)?;

    let authors = author_rows
        .iter()
        .map(row_to_author)
        .collect::<Result<Vec<_>, _>>()?;

    let subject_rows = sqlx::query(
        "SELECT subject FROM ebook_subjects WHERE ebook_id = ? ORDER BY subject",
    )
    .bind(book_id)
    .fetch_all(pool)
    .await
    .map_err(storage_err)?;

    let subjects = subject_rows
        .iter()
        .map(|row| row.try_get::<String, _>("subject").map_err(storage_err))
        .collect::<Result<Vec<_>, _>>()?;

    let bookshelf_rows = sqlx::query(
        "SELECT bookshelf FROM ebook_bookshelves WHERE ebook_id = ? ORDER BY bookshelf",
    )
    .bind(book_id)
    .fetch_all(pool)
    .await
    .map_err(storage_err)?;

    let bookshelves = bookshelf_rows
        .iter()
        .map(|row| row.try_get::<String, _>("bookshelf").map_err(storage_err))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EbookAssociations {
        authors,
        subjects,
        bookshelves,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_associations_returns_empty_sets_for_unknown_book() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::schema::create_schema(&pool).await.unwrap();

        let associations = load_associations(&pool, 999).await.unwrap();
        assert!(associations.authors.is_empty());
        assert!(associations.subjects.is_empty());
        assert!(associations.bookshelves.is_empty());
    }
}
