//! Pure domain types with no I/O dependencies.

mod ebook;
mod language;

pub use ebook::{
    Author, AuthorRecord, Ebook, EbookAssociations, EbookRecord, RangeBound, RangeQuery,
};
pub use language::{LanguageMapper, LANGUAGE_TABLE};
