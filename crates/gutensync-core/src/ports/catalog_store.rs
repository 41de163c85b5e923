//! The Catalog Store port: persistence and search over parsed ebooks.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::errors::CatalogError;
use crate::domain::{Ebook, EbookRecord, RangeBound, RangeQuery};

/// Filters for [`CatalogStore::search`]. All fields are optional; a query
/// with every field `None` still runs, bounded by `limit`, rather than
/// being rejected — a full-catalog browse is a valid use case.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text match against title (and, where the store indexes it,
    /// author names), via the store's full-text index.
    pub text: Option<String>,
    /// Substring match (case-insensitive) against any associated author's
    /// name.
    pub author: Option<String>,
    /// Language short code or display name (resolved the same way the
    /// parser resolves it).
    pub language: Option<String>,
    /// Subject substring match.
    pub subject: Option<String>,
    /// Publication date range, start inclusive, end exclusive.
    pub publication_date_range: RangeQuery<NaiveDate>,
    /// Book id range, start inclusive, end exclusive.
    pub book_id_range: RangeQuery<u32>,
    /// Maximum rows to return. `None` means unbounded.
    pub limit: Option<u32>,
    /// Rows to skip before collecting `limit`.
    pub offset: u32,
}

/// Aggregate counts for `catalog stats`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogStats {
    /// Total ebook rows.
    pub total_ebooks: u64,
    /// Distinct authors.
    pub total_authors: u64,
    /// Distinct languages represented.
    pub total_languages: u64,
    /// Ebooks whose local file has been checksum-verified.
    pub verified_count: u64,
    /// Sum of `local_file_size_bytes` across all rows with a known size.
    pub total_local_bytes: u64,
    /// Distinct subjects across all ebooks.
    pub unique_subjects: u64,
    /// Earliest and latest `publication_date` among rows that have one.
    pub publication_date_range: Option<RangeBound<NaiveDate>>,
    /// Lowest and highest `book_id` in the catalog.
    pub book_id_range: Option<RangeBound<u32>>,
}

/// Persists and queries the ebook catalog.
///
/// Implementations own schema creation and migration; callers never issue
/// raw SQL.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert or update one ebook, replacing its association rows (authors,
    /// subjects, bookshelves) to match the record exactly — association
    /// pruning is the store's job, not the caller's.
    async fn upsert(&self, record: &EbookRecord) -> Result<(), CatalogError>;

    /// Upsert a batch in one transaction. Returns the count actually
    /// written; a batch never partially applies.
    async fn upsert_batch(&self, records: &[EbookRecord]) -> Result<u64, CatalogError>;

    /// Fetch one ebook by id, with associations eagerly loaded.
    async fn get(&self, book_id: u32) -> Result<Option<Ebook>, CatalogError>;

    /// Search the catalog.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Ebook>, CatalogError>;

    /// Aggregate catalog statistics.
    async fn stats(&self) -> Result<CatalogStats, CatalogError>;

    /// Export the full catalog (or a filtered subset) to `path` in the
    /// given format (`"csv"` or `"json"`).
    async fn export(
        &self,
        path: &std::path::Path,
        format: &str,
        query: &SearchQuery,
    ) -> Result<u64, CatalogError>;

    /// Record verification results (checksum, local size, timestamp) for
    /// one ebook without touching its metadata fields.
    async fn mark_verified(
        &self,
        book_id: u32,
        checksum: &str,
        local_file_size_bytes: u64,
    ) -> Result<(), CatalogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_search_query_has_no_filters() {
        let query = SearchQuery::default();
        assert!(query.text.is_none());
        assert!(query.author.is_none());
        assert!(query.book_id_range.is_none());
    }
}
