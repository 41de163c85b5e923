//! Streaming RDF/XML parser turning Gutenberg metadata directories into
//! [`gutensync_core::EbookRecord`] values.

mod extractor;
mod parser;
mod walker;

pub use parser::GutenbergRdfParser;

#[cfg(test)]
use tempfile as _;
