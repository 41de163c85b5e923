//! Core domain types for the ebook catalog.
//!
//! These are pure data types with no I/O dependencies, shared between the
//! RDF parser (which produces [`EbookRecord`] values), the catalog store
//! (which persists them), and the orchestrator (which wires the two
//! together).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single author as extracted from RDF, before a surrogate id is assigned.
///
/// The natural key is `name`; `authors` rows are shared across ebooks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRecord {
    /// Author's name, exactly as it appears in the source (non-empty).
    pub name: String,
    /// First four-digit birth year found in the RDF, if any.
    pub birth_year: Option<i32>,
    /// First four-digit death year found in the RDF, if any.
    pub death_year: Option<i32>,
    /// Web page URL associated with the author, if any.
    pub webpage: Option<String>,
}

impl AuthorRecord {
    /// Create a record with only a name (the minimum the parser ever needs).
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            birth_year: None,
            death_year: None,
            webpage: None,
        }
    }
}

/// A fully parsed ebook, as produced by the RDF parser from one file.
///
/// This is a value: created by the parser, consumed by the orchestrator,
/// written to the catalog store, then dropped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EbookRecord {
    /// Gutenberg book id (positive, globally unique).
    pub book_id: u32,
    /// Title; defaults to `"Unknown"` when the RDF omits it.
    pub title: String,
    /// Canonical display name of the language, if mappable or present.
    pub language: Option<String>,
    /// Canonical 2-3 letter lowercase language short code, if known.
    pub language_short_code: Option<String>,
    /// Publication date, if parseable from the RDF `dcterms:issued` field.
    pub publication_date: Option<NaiveDate>,
    /// Rights string, verbatim.
    pub rights: Option<String>,
    /// Download count reported by Gutenberg, if present.
    pub download_count: Option<u64>,
    /// Path to the RDF file this record was parsed from.
    pub rdf_path: Option<String>,
    /// The `rdf:about`/`resource` URL the book id was extracted from.
    pub source_url: Option<String>,
    /// Authors associated with this ebook, in RDF order.
    pub authors: Vec<AuthorRecord>,
    /// Subjects (non-empty, deduplication is the store's job, not the parser's).
    pub subjects: Vec<String>,
    /// Bookshelves.
    pub bookshelves: Vec<String>,
}

impl EbookRecord {
    /// Start building a minimal record for the given book id.
    ///
    /// Title defaults to `"Unknown"` per the extraction rules; callers fill
    /// in the rest as fields are discovered during parsing.
    #[must_use]
    pub fn new(book_id: u32) -> Self {
        Self {
            book_id,
            title: "Unknown".to_string(),
            language: None,
            language_short_code: None,
            publication_date: None,
            rights: None,
            download_count: None,
            rdf_path: None,
            source_url: None,
            authors: Vec::new(),
            subjects: Vec::new(),
            bookshelves: Vec::new(),
        }
    }
}

/// A stored author row, with its surrogate id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Surrogate id assigned by the store.
    pub id: i64,
    /// Natural key; unique.
    pub name: String,
    /// First four-digit birth year, if known.
    pub birth_year: Option<i32>,
    /// First four-digit death year, if known.
    pub death_year: Option<i32>,
    /// Web page URL, if known.
    pub webpage: Option<String>,
}

/// The association sets for one ebook, eagerly loaded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EbookAssociations {
    /// Authors associated with this ebook.
    pub authors: Vec<Author>,
    /// Subjects associated with this ebook.
    pub subjects: Vec<String>,
    /// Bookshelves associated with this ebook.
    pub bookshelves: Vec<String>,
}

/// A catalog row, as returned by search/get/export, with associations
/// eagerly attached so callers never have to loop back for them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ebook {
    /// Gutenberg book id.
    pub book_id: u32,
    /// Title.
    pub title: String,
    /// Language display name.
    pub language: Option<String>,
    /// Language short code.
    pub language_short_code: Option<String>,
    /// Publication date.
    pub publication_date: Option<NaiveDate>,
    /// Rights string.
    pub rights: Option<String>,
    /// Download count.
    pub download_count: Option<u64>,
    /// RDF source path.
    pub rdf_path: Option<String>,
    /// Source URL the book id was parsed from.
    pub source_url: Option<String>,
    /// Verification timestamp, if the book has been audited.
    pub verified_utc: Option<DateTime<Utc>>,
    /// Checksum of the local file, if verified.
    pub checksum: Option<String>,
    /// Size in bytes of the local file, if known.
    pub local_file_size_bytes: Option<u64>,
    /// Row creation timestamp.
    pub created_utc: DateTime<Utc>,
    /// Row last-update timestamp.
    pub updated_utc: DateTime<Utc>,
    /// Eagerly-loaded association sets.
    pub associations: EbookAssociations,
}

/// A half-open range bound, used for publication-date and book-id filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeBound<T> {
    /// Inclusive lower bound.
    pub start: T,
    /// Exclusive upper bound.
    pub end: T,
}

/// Either a book-id range or a publication-date range for search filters.
pub type RangeQuery<T> = Option<RangeBound<T>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_defaults_title_to_unknown() {
        let record = EbookRecord::new(42);
        assert_eq!(record.title, "Unknown");
        assert!(record.authors.is_empty());
        assert!(record.subjects.is_empty());
    }

    #[test]
    fn author_record_new_has_no_optional_fields() {
        let author = AuthorRecord::new("Austen, Jane");
        assert_eq!(author.name, "Austen, Jane");
        assert!(author.birth_year.is_none());
        assert!(author.webpage.is_none());
    }
}
