//! SQLite-backed [`CatalogStore`] for the Gutenberg ebook catalog.
//!
//! Mirrors the teacher's `gglib-db` crate: a thin repository struct wrapping
//! a `sqlx::SqlitePool`, schema creation done with raw `CREATE TABLE IF NOT
//! EXISTS` statements rather than `sqlx::migrate!`, and queries issued with
//! `sqlx::query`/`query_as` rather than the compile-time-checked `query!`
//! macro (which would require a live database connection to even compile).

pub mod export;
pub mod row_mappers;
pub mod schema;

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use gutensync_core::domain::{Ebook, EbookRecord, RangeBound};
use gutensync_core::ports::{CatalogError, CatalogStats, CatalogStore, SearchQuery};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, warn};

use row_mappers::{load_associations, row_to_ebook, EBOOK_SELECT_COLUMNS};

fn storage_err(e: sqlx::Error) -> CatalogError {
    CatalogError::Database(e.to_string())
}

/// SQLite implementation of [`CatalogStore`].
pub struct SqliteCatalogStore {
    pool: SqlitePool,
}

impl SqliteCatalogStore {
    /// Open (creating if missing) the database file at `db_path`, running
    /// schema setup before returning.
    pub async fn connect(db_path: &Path) -> Result<Self, CatalogError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CatalogError::Database(e.to_string()))?;
        }

        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(db_path)
                .create_if_missing(true)
                .pragma("foreign_keys", "ON"),
        )
        .await
        .map_err(storage_err)?;

        schema::create_schema(&pool).await.map_err(storage_err)?;
        debug!(path = %db_path.display(), "catalog database ready");

        Ok(Self { pool })
    }

    /// Open an in-memory database with the full schema, for tests.
    #[cfg(any(test, feature = "test-utils"))]
    pub async fn connect_in_memory() -> Result<Self, CatalogError> {
        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(":memory:")
                .pragma("foreign_keys", "ON"),
        )
        .await
        .map_err(storage_err)?;
        schema::create_schema(&pool).await.map_err(storage_err)?;
        Ok(Self { pool })
    }

    /// Borrow the underlying pool, for adapter-level tooling (`health`).
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn upsert_one(
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        record: &EbookRecord,
    ) -> Result<(), CatalogError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO ebooks (
                book_id, title, language, language_short_code, publication_date,
                rights, download_count, rdf_path, source_url, created_utc, updated_utc
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(book_id) DO UPDATE SET
                title = excluded.title,
                language = excluded.language,
                language_short_code = excluded.language_short_code,
                publication_date = excluded.publication_date,
                rights = excluded.rights,
                download_count = excluded.download_count,
                rdf_path = excluded.rdf_path,
                source_url = excluded.source_url,
                updated_utc = excluded.updated_utc
            "#,
        )
        .bind(record.book_id)
        .bind(&record.title)
        .bind(&record.language)
        .bind(&record.language_short_code)
        .bind(record.publication_date.map(|d| d.to_string()))
        .bind(&record.rights)
        .bind(record.download_count.map(|c| c as i64))
        .bind(&record.rdf_path)
        .bind(&record.source_url)
        .bind(&now)
        .bind(&now)
        .execute(&mut **tx)
        .await
        .map_err(storage_err)?;

        sqlx::query("DELETE FROM ebook_authors WHERE ebook_id = ?")
            .bind(record.book_id)
            .execute(&mut **tx)
            .await
            .map_err(storage_err)?;
        sqlx::query("DELETE FROM ebook_subjects WHERE ebook_id = ?")
            .bind(record.book_id)
            .execute(&mut **tx)
            .await
            .map_err(storage_err)?;
        sqlx::query("DELETE FROM ebook_bookshelves WHERE ebook_id = ?")
            .bind(record.book_id)
            .execute(&mut **tx)
            .await
            .map_err(storage_err)?;

        for author in &record.authors {
            let row: (i64,) = sqlx::query_as(
                r#"
                INSERT INTO authors (name, birth_year, death_year, webpage)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(name) DO UPDATE SET
                    birth_year = COALESCE(excluded.birth_year, authors.birth_year),
                    death_year = COALESCE(excluded.death_year, authors.death_year),
                    webpage = COALESCE(excluded.webpage, authors.webpage)
                RETURNING id
                "#,
            )
            .bind(&author.name)
            .bind(author.birth_year)
            .bind(author.death_year)
            .bind(&author.webpage)
            .fetch_one(&mut **tx)
            .await
            .map_err(storage_err)?;

            sqlx::query(
                "INSERT OR IGNORE INTO ebook_authors (ebook_id, author_id) VALUES (?, ?)",
            )
            .bind(record.book_id)
            .bind(row.0)
            .execute(&mut **tx)
            .await
            .map_err(storage_err)?;
        }

        for subject in &record.subjects {
            sqlx::query(
                "INSERT OR IGNORE INTO ebook_subjects (ebook_id, subject) VALUES (?, ?)",
            )
            .bind(record.book_id)
            .bind(subject)
            .execute(&mut **tx)
            .await
            .map_err(storage_err)?;
        }

        for bookshelf in &record.bookshelves {
            sqlx::query(
                "INSERT OR IGNORE INTO ebook_bookshelves (ebook_id, bookshelf) VALUES (?, ?)",
            )
            .bind(record.book_id)
            .bind(bookshelf)
            .execute(&mut **tx)
            .await
            .map_err(storage_err)?;
        }

        Ok(())
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    async fn upsert(&self, record: &EbookRecord) -> Result<(), CatalogError> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;
        Self::upsert_one(&mut tx, record).await?;
        tx.commit().await.map_err(storage_err)?;
        Ok(())
    }

    async fn upsert_batch(&self, records: &[EbookRecord]) -> Result<u64, CatalogError> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        for record in records {
            Self::upsert_one(&mut tx, record).await?;
        }

        tx.commit().await.map_err(storage_err)?;
        debug!(count = records.len(), "batch upsert committed");
        Ok(records.len() as u64)
    }

    async fn get(&self, book_id: u32) -> Result<Option<Ebook>, CatalogError> {
        let row = sqlx::query(&format!(
            "SELECT {EBOOK_SELECT_COLUMNS} FROM ebooks WHERE book_id = ?"
        ))
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut ebook = row_to_ebook(&row)?;
        ebook.associations = load_associations(&self.pool, book_id).await?;
        Ok(Some(ebook))
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Ebook>, CatalogError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT DISTINCT e.{} FROM ebooks e",
            EBOOK_SELECT_COLUMNS
                .split(", ")
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", e.")
        ));

        if query.author.is_some() {
            builder.push(
                " JOIN ebook_authors ea ON ea.ebook_id = e.book_id \
                   JOIN authors a ON a.id = ea.author_id",
            );
        }
        if query.subject.is_some() {
            builder.push(" JOIN ebook_subjects es ON es.ebook_id = e.book_id");
        }
        builder.push(" WHERE 1 = 1");

        if let Some(text) = &query.text {
            // FTS5 MATCH only expresses prefix/token matches; a true
            // "contains" contract needs a LIKE fallback against the title.
            builder.push(" AND e.title LIKE ");
            builder.push_bind(format!("%{text}%"));
            builder.push(" COLLATE NOCASE");
        }
        if let Some(author) = &query.author {
            builder.push(" AND a.name LIKE ");
            builder.push_bind(format!("%{author}%"));
            builder.push(" COLLATE NOCASE");
        }
        if let Some(language) = &query.language {
            builder.push(" AND (e.language LIKE ");
            builder.push_bind(format!("%{language}%"));
            builder.push(" COLLATE NOCASE OR e.language_short_code = ");
            builder.push_bind(language.clone());
            builder.push(" COLLATE NOCASE)");
        }
        if let Some(subject) = &query.subject {
            builder.push(" AND es.subject LIKE ");
            builder.push_bind(format!("%{subject}%"));
        }
        if let Some(range) = &query.publication_date_range {
            builder.push(" AND e.publication_date >= ");
            builder.push_bind(range.start.to_string());
            builder.push(" AND e.publication_date < ");
            builder.push_bind(range.end.to_string());
        }
        if let Some(range) = &query.book_id_range {
            builder.push(" AND e.book_id >= ");
            builder.push_bind(range.start);
            builder.push(" AND e.book_id < ");
            builder.push_bind(range.end);
        }

        builder.push(" ORDER BY e.book_id");

        // SQLite treats a negative LIMIT as "no limit", which lets an
        // unbounded search still carry an OFFSET.
        match query.limit {
            Some(limit) => {
                builder.push(" LIMIT ");
                builder.push_bind(i64::from(limit));
            }
            None => {
                builder.push(" LIMIT -1");
            }
        }
        builder.push(" OFFSET ");
        builder.push_bind(i64::from(query.offset));

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;

        let mut ebooks = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut ebook = row_to_ebook(row)?;
            ebook.associations = load_associations(&self.pool, ebook.book_id).await?;
            ebooks.push(ebook);
        }

        Ok(ebooks)
    }

    async fn stats(&self) -> Result<CatalogStats, CatalogError> {
        let total_ebooks: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ebooks")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;

        let total_authors: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;

        let total_languages: (i64,) = sqlx::query_as(
            "SELECT COUNT(DISTINCT language) FROM ebooks WHERE language IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err)?;

        let verified_count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM ebooks WHERE verified_utc IS NOT NULL")
                .fetch_one(&self.pool)
                .await
                .map_err(storage_err)?;

        let total_local_bytes: (Option<i64>,) = sqlx::query_as(
            "SELECT SUM(local_file_size_bytes) FROM ebooks WHERE local_file_size_bytes IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err)?;

        let unique_subjects: (i64,) =
            sqlx::query_as("SELECT COUNT(DISTINCT subject) FROM ebook_subjects")
                .fetch_one(&self.pool)
                .await
                .map_err(storage_err)?;

        let publication_date_range: (Option<String>, Option<String>) = sqlx::query_as(
            "SELECT MIN(publication_date), MAX(publication_date) FROM ebooks \
             WHERE publication_date IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err)?;

        let book_id_range: (Option<i64>, Option<i64>) =
            sqlx::query_as("SELECT MIN(book_id), MAX(book_id) FROM ebooks")
                .fetch_one(&self.pool)
                .await
                .map_err(storage_err)?;

        let publication_date_range = match publication_date_range {
            (Some(start), Some(end)) => Some(RangeBound {
                start: start.parse().map_err(|_| {
                    CatalogError::Database("malformed publication_date in stats".to_string())
                })?,
                end: end.parse().map_err(|_| {
                    CatalogError::Database("malformed publication_date in stats".to_string())
                })?,
            }),
            _ => None,
        };

        let book_id_range = match book_id_range {
            (Some(start), Some(end)) => Some(RangeBound {
                start: start as u32,
                end: end as u32,
            }),
            _ => None,
        };

        Ok(CatalogStats {
            total_ebooks: total_ebooks.0 as u64,
            total_authors: total_authors.0 as u64,
            total_languages: total_languages.0 as u64,
            verified_count: verified_count.0 as u64,
            total_local_bytes: total_local_bytes.0.unwrap_or(0) as u64,
            unique_subjects: unique_subjects.0 as u64,
            publication_date_range,
            book_id_range,
        })
    }

    async fn export(
        &self,
        path: &Path,
        format: &str,
        query: &SearchQuery,
    ) -> Result<u64, CatalogError> {
        let ebooks = self.search(query).await?;
        export::write_export(&ebooks, path, format).await
    }

    async fn mark_verified(
        &self,
        book_id: u32,
        checksum: &str,
        local_file_size_bytes: u64,
    ) -> Result<(), CatalogError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "UPDATE ebooks SET checksum = ?, local_file_size_bytes = ?, verified_utc = ? \
             WHERE book_id = ?",
        )
        .bind(checksum)
        .bind(local_file_size_bytes as i64)
        .bind(&now)
        .bind(book_id)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            warn!(book_id, "mark_verified called for unknown book id");
            return Err(CatalogError::InvalidQuery(format!(
                "no ebook with id {book_id}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gutensync_core::domain::AuthorRecord;

    fn sample_record(book_id: u32, title: &str) -> EbookRecord {
        let mut record = EbookRecord::new(book_id);
        record.title = title.to_string();
        record.language = Some("English".to_string());
        record.language_short_code = Some("en".to_string());
        record.authors.push(AuthorRecord::new("Austen, Jane"));
        record.subjects.push("Courtship -- Fiction".to_string());
        record
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let store = SqliteCatalogStore::connect_in_memory().await.unwrap();
        let record = sample_record(12345, "Pride and Prejudice");
        store.upsert(&record).await.unwrap();

        let fetched = store.get(12345).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Pride and Prejudice");
        assert_eq!(fetched.associations.authors.len(), 1);
        assert_eq!(fetched.associations.authors[0].name, "Austen, Jane");
        assert_eq!(fetched.associations.subjects, vec!["Courtship -- Fiction"]);
    }

    #[tokio::test]
    async fn upsert_preserves_created_utc_on_update() {
        let store = SqliteCatalogStore::connect_in_memory().await.unwrap();
        let record = sample_record(1, "First Title");
        store.upsert(&record).await.unwrap();
        let first = store.get(1).await.unwrap().unwrap();

        let mut updated = record.clone();
        updated.title = "Revised Title".to_string();
        store.upsert(&updated).await.unwrap();
        let second = store.get(1).await.unwrap().unwrap();

        assert_eq!(second.title, "Revised Title");
        assert_eq!(first.created_utc, second.created_utc);
    }

    #[tokio::test]
    async fn reupsert_prunes_removed_associations() {
        let store = SqliteCatalogStore::connect_in_memory().await.unwrap();
        let mut record = sample_record(2, "A Title");
        record.subjects.push("Second Subject".to_string());
        store.upsert(&record).await.unwrap();

        let mut pruned = record.clone();
        pruned.subjects = vec!["Courtship -- Fiction".to_string()];
        store.upsert(&pruned).await.unwrap();

        let fetched = store.get(2).await.unwrap().unwrap();
        assert_eq!(fetched.associations.subjects.len(), 1);
    }

    #[tokio::test]
    async fn get_returns_none_for_missing_book() {
        let store = SqliteCatalogStore::connect_in_memory().await.unwrap();
        assert!(store.get(404).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn search_by_author_name_matches() {
        let store = SqliteCatalogStore::connect_in_memory().await.unwrap();
        store.upsert(&sample_record(1, "Emma")).await.unwrap();
        store
            .upsert(&sample_record(2, "Frankenstein"))
            .await
            .unwrap();

        let mut query = SearchQuery::default();
        query.author = Some("Austen, Jane".to_string());
        query.limit = Some(10);

        let results = store.search(&query).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn search_title_matches_substring_anywhere_not_just_prefix() {
        let store = SqliteCatalogStore::connect_in_memory().await.unwrap();
        store
            .upsert(&sample_record(12345, "Pride and Prejudice"))
            .await
            .unwrap();

        let mut query = SearchQuery::default();
        query.text = Some("Prejudice".to_string());
        query.limit = Some(10);

        let results = store.search(&query).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].book_id, 12345);
    }

    #[tokio::test]
    async fn search_title_match_is_case_insensitive() {
        let store = SqliteCatalogStore::connect_in_memory().await.unwrap();
        store
            .upsert(&sample_record(12345, "Pride and Prejudice"))
            .await
            .unwrap();

        let mut query = SearchQuery::default();
        query.text = Some("pride".to_string());
        query.limit = Some(10);

        let results = store.search(&query).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn search_by_author_name_accepts_a_substring() {
        let store = SqliteCatalogStore::connect_in_memory().await.unwrap();
        store.upsert(&sample_record(1, "Emma")).await.unwrap();

        let mut query = SearchQuery::default();
        query.author = Some("austen".to_string());
        query.limit = Some(10);

        let results = store.search(&query).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn search_by_language_matches_name_substring_case_insensitively() {
        let store = SqliteCatalogStore::connect_in_memory().await.unwrap();
        store.upsert(&sample_record(1, "Emma")).await.unwrap();

        let mut query = SearchQuery::default();
        query.language = Some("engl".to_string());
        query.limit = Some(10);

        let results = store.search(&query).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn search_by_language_short_code_is_exact_but_case_insensitive() {
        let store = SqliteCatalogStore::connect_in_memory().await.unwrap();
        store.upsert(&sample_record(1, "Emma")).await.unwrap();

        let mut query = SearchQuery::default();
        query.language = Some("EN".to_string());
        query.limit = Some(10);

        let results = store.search(&query).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn stats_reflect_upserted_rows() {
        let store = SqliteCatalogStore::connect_in_memory().await.unwrap();
        store.upsert(&sample_record(1, "Emma")).await.unwrap();
        store
            .upsert(&sample_record(2, "Frankenstein"))
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_ebooks, 2);
        assert_eq!(stats.total_authors, 1);
        assert_eq!(stats.total_languages, 1);
        assert_eq!(stats.verified_count, 0);
        assert_eq!(stats.unique_subjects, 1);
        assert_eq!(stats.book_id_range, Some(RangeBound { start: 1, end: 2 }));
        assert!(stats.publication_date_range.is_none());
    }

    #[tokio::test]
    async fn mark_verified_sets_checksum_and_size() {
        let store = SqliteCatalogStore::connect_in_memory().await.unwrap();
        store.upsert(&sample_record(1, "Emma")).await.unwrap();
        store.mark_verified(1, "abc123", 4096).await.unwrap();

        let fetched = store.get(1).await.unwrap().unwrap();
        assert_eq!(fetched.checksum, Some("abc123".to_string()));
        assert_eq!(fetched.local_file_size_bytes, Some(4096));
        assert!(fetched.verified_utc.is_some());
    }

    #[tokio::test]
    async fn mark_verified_unknown_book_is_an_error() {
        let store = SqliteCatalogStore::connect_in_memory().await.unwrap();
        let err = store.mark_verified(999, "abc", 1).await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn upsert_batch_commits_all_records_in_one_transaction() {
        let store = SqliteCatalogStore::connect_in_memory().await.unwrap();
        let records = vec![sample_record(1, "Emma"), sample_record(2, "Persuasion")];

        let count = store.upsert_batch(&records).await.unwrap();
        assert_eq!(count, 2);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_ebooks, 2);
    }
}
