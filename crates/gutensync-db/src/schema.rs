//! Schema creation and migration for the catalog database.
//!
//! Mirrors the teacher's `create_schema`/`ALTER TABLE ... ADD COLUMN`
//! pattern: every table statement uses `IF NOT EXISTS` so setup is safe to
//! run against an existing file, and columns added after the first release
//! are migrated in with best-effort `ALTER TABLE` calls whose "duplicate
//! column" errors are discarded.

use sqlx::SqlitePool;

/// Create the five catalog tables, their indexes, and the title FTS index,
/// then migrate in any columns introduced after the initial schema.
///
/// Foreign key enforcement is set per-connection at pool-open time (see
/// [`crate::SqliteCatalogStore::connect`]), not here — a pool-level
/// `PRAGMA` only binds to whichever single connection services that call.
pub async fn create_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ebooks (
            book_id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            language TEXT,
            language_short_code TEXT,
            publication_date TEXT,
            rights TEXT,
            download_count INTEGER,
            rdf_path TEXT,
            source_url TEXT,
            verified_utc TEXT,
            checksum TEXT,
            local_file_size_bytes INTEGER,
            created_utc TEXT NOT NULL,
            updated_utc TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS authors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            birth_year INTEGER,
            death_year INTEGER,
            webpage TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ebook_authors (
            ebook_id INTEGER NOT NULL REFERENCES ebooks(book_id) ON DELETE CASCADE,
            author_id INTEGER NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
            PRIMARY KEY (ebook_id, author_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ebook_subjects (
            ebook_id INTEGER NOT NULL REFERENCES ebooks(book_id) ON DELETE CASCADE,
            subject TEXT NOT NULL,
            PRIMARY KEY (ebook_id, subject)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ebook_bookshelves (
            ebook_id INTEGER NOT NULL REFERENCES ebooks(book_id) ON DELETE CASCADE,
            bookshelf TEXT NOT NULL,
            PRIMARY KEY (ebook_id, bookshelf)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_ebooks_language ON ebooks(language)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_ebooks_language_short_code ON ebooks(language_short_code)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_ebooks_publication_date ON ebooks(publication_date)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_ebook_subjects_subject ON ebook_subjects(subject)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_ebook_bookshelves_bookshelf ON ebook_bookshelves(bookshelf)",
    )
    .execute(pool)
    .await?;

    // Migration: source_url was added after the initial release.
    // Ignore the error if the column already exists.
    let _ = sqlx::query("ALTER TABLE ebooks ADD COLUMN source_url TEXT")
        .execute(pool)
        .await;

    create_fts(pool).await?;

    Ok(())
}

/// Create the title full-text index and the triggers that keep it in sync
/// with `ebooks`, satisfying invariant 6 without the upsert code having to
/// maintain it by hand.
async fn create_fts(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE VIRTUAL TABLE IF NOT EXISTS ebooks_fts USING fts5(title, content='ebooks', content_rowid='book_id')",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS ebooks_fts_ai AFTER INSERT ON ebooks BEGIN
            INSERT INTO ebooks_fts(rowid, title) VALUES (new.book_id, new.title);
        END
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS ebooks_fts_ad AFTER DELETE ON ebooks BEGIN
            INSERT INTO ebooks_fts(ebooks_fts, rowid, title) VALUES ('delete', old.book_id, old.title);
        END
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS ebooks_fts_au AFTER UPDATE ON ebooks BEGIN
            INSERT INTO ebooks_fts(ebooks_fts, rowid, title) VALUES ('delete', old.book_id, old.title);
            INSERT INTO ebooks_fts(rowid, title) VALUES (new.book_id, new.title);
        END
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_pool() -> SqlitePool {
        SqlitePool::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn creates_all_five_tables() {
        let pool = memory_pool().await;
        create_schema(&pool).await.unwrap();

        for table in ["ebooks", "authors", "ebook_authors", "ebook_subjects", "ebook_bookshelves"] {
            let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(&pool)
                .await
                .unwrap();
            assert_eq!(count.0, 0);
        }
    }

    #[tokio::test]
    async fn schema_creation_is_idempotent() {
        let pool = memory_pool().await;
        create_schema(&pool).await.unwrap();
        create_schema(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn fts_trigger_tracks_inserts() {
        let pool = memory_pool().await;
        create_schema(&pool).await.unwrap();

        sqlx::query(
            "INSERT INTO ebooks (book_id, title, created_utc, updated_utc) VALUES (1, 'Pride and Prejudice', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let hits: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM ebooks_fts WHERE ebooks_fts MATCH 'Pride'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(hits.0, 1);
    }
}
