//! [`GutenbergRdfParser`]: the [`RdfParser`] port implementation tying the
//! directory walk together with per-file extraction.

use std::path::Path;

use gutensync_core::{ParseOutcome, RdfError, RdfParser};

use crate::extractor::parse_rdf_str;
use crate::walker::RdfWalker;

/// Walks a Gutenberg metadata mirror and extracts one [`EbookRecord`] per
/// `.rdf` file, tolerating malformed files by skipping them.
///
/// [`EbookRecord`]: gutensync_core::EbookRecord
#[derive(Debug, Default, Clone, Copy)]
pub struct GutenbergRdfParser;

impl GutenbergRdfParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RdfParser for GutenbergRdfParser {
    fn parse_directory(
        &self,
        directory: &Path,
    ) -> Result<Box<dyn Iterator<Item = ParseOutcome> + Send>, RdfError> {
        if !directory.is_dir() {
            return Err(RdfError::DirectoryMissing(directory.display().to_string()));
        }

        let walker = RdfWalker::new(directory)?;
        Ok(Box::new(walker.map(|path| parse_path(&path))))
    }

    fn parse_file(&self, path: &Path) -> ParseOutcome {
        parse_path(path)
    }

    fn parse_stream(&self, reader: &mut dyn std::io::Read) -> ParseOutcome {
        let mut contents = String::new();
        if let Err(err) = reader.read_to_string(&mut contents) {
            return ParseOutcome::Skipped {
                path: String::new(),
                reason: format!("read error: {err}"),
            };
        }

        match parse_rdf_str(&contents) {
            Ok(record) => ParseOutcome::Parsed(record),
            Err(reason) => ParseOutcome::Skipped {
                path: String::new(),
                reason,
            },
        }
    }
}

fn parse_path(path: &Path) -> ParseOutcome {
    let display_path = path.display().to_string();

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            return ParseOutcome::Skipped {
                path: display_path,
                reason: format!("read error: {err}"),
            }
        }
    };

    match parse_rdf_str(&contents) {
        Ok(mut record) => {
            record.rdf_path = Some(display_path);
            ParseOutcome::Parsed(record)
        }
        Err(reason) => ParseOutcome::Skipped {
            path: display_path,
            reason,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const VALID_RDF: &str = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:dcterms="http://purl.org/dc/terms/"
         xmlns:pgterms="http://www.gutenberg.org/2009/pgterms/">
  <pgterms:ebook rdf:about="ebooks/1">
    <dcterms:title>Sample Book</dcterms:title>
  </pgterms:ebook>
</rdf:RDF>"#;

    #[test]
    fn parse_directory_yields_parsed_and_skipped_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("pg1.rdf"), VALID_RDF).unwrap();
        fs::write(dir.path().join("pg2.rdf"), "not valid xml at all <<<").unwrap();

        let parser = GutenbergRdfParser::new();
        let outcomes: Vec<_> = parser.parse_directory(dir.path()).unwrap().collect();

        assert_eq!(outcomes.len(), 2);
        let parsed = outcomes.iter().filter(|o| o.record().is_some()).count();
        let skipped = outcomes.len() - parsed;
        assert_eq!(parsed, 1);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn parse_directory_errors_for_missing_root() {
        let parser = GutenbergRdfParser::new();
        let missing = Path::new("/nonexistent/path/for/gutensync/tests");
        assert!(parser.parse_directory(missing).is_err());
    }

    #[test]
    fn parse_file_sets_rdf_path_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("pg1.rdf");
        fs::write(&file_path, VALID_RDF).unwrap();

        let parser = GutenbergRdfParser::new();
        let outcome = parser.parse_file(&file_path);
        let record = outcome.record().expect("expected a parsed record");
        assert_eq!(record.book_id, 1);
        assert_eq!(record.rdf_path.as_deref(), Some(file_path.display().to_string().as_str()));
    }

    #[test]
    fn parse_file_reports_reason_for_missing_book_id() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("broken.rdf");
        fs::write(&file_path, "<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\"></rdf:RDF>").unwrap();

        let parser = GutenbergRdfParser::new();
        let outcome = parser.parse_file(&file_path);
        match outcome {
            ParseOutcome::Skipped { reason, .. } => {
                assert!(reason.contains("book id"));
            }
            ParseOutcome::Parsed(_) => panic!("expected a skip"),
        }
    }

    #[test]
    fn parse_stream_parses_a_valid_document_from_a_reader() {
        let parser = GutenbergRdfParser::new();
        let mut reader = std::io::Cursor::new(VALID_RDF.as_bytes());
        let outcome = parser.parse_stream(&mut reader);
        let record = outcome.record().expect("expected a parsed record");
        assert_eq!(record.book_id, 1);
    }

    #[test]
    fn parse_stream_reports_reason_for_missing_book_id() {
        let parser = GutenbergRdfParser::new();
        let mut reader = std::io::Cursor::new(
            b"<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\"></rdf:RDF>"
                as &[u8],
        );
        let outcome = parser.parse_stream(&mut reader);
        match outcome {
            ParseOutcome::Skipped { reason, .. } => {
                assert!(reason.contains("book id"));
            }
            ParseOutcome::Parsed(_) => panic!("expected a skip"),
        }
    }
}
