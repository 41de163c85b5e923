//! Namespace-aware extraction of one [`EbookRecord`] from RDF/XML text.
//!
//! Gutenberg's catalog RDF consistently uses the `rdf:`, `dcterms:` (often
//! written `dc:` in older files) and `pgterms:` prefixes; this extractor
//! matches on local element names (the part after the last `:`) rather
//! than resolving full namespace URIs, since the corpus's own RDF never
//! varies its prefix bindings. This keeps the parser a single forward pass
//! with no namespace-stack bookkeeping.

use chrono::NaiveDate;
use gutensync_core::{AuthorRecord, EbookRecord, LanguageMapper};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// Parse one RDF document's text into an [`EbookRecord`].
///
/// Returns `Err(reason)` only when no book id could be extracted; every
/// other field is best-effort and simply left at its default.
pub fn parse_rdf_str(xml: &str) -> Result<EbookRecord, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut record: Option<EbookRecord> = None;
    let mut current_field: Option<String> = None;
    let mut current_agent: Option<AuthorRecord> = None;
    let mut in_value_container: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let local = local_name(e.name().as_ref());

                if local == "ebook" {
                    let mut resource_value: Option<String> = None;
                    let mut about_value: Option<String> = None;
                    for attr in e.attributes().flatten() {
                        let value = String::from_utf8_lossy(&attr.value).to_string();
                        match local_name(attr.key.as_ref()).as_str() {
                            "resource" => resource_value = Some(value),
                            "about" => about_value = Some(value),
                            _ => {}
                        }
                    }
                    // Prefer the `resource` URL on the ebook reference; fall
                    // back to `about` on the description element only when
                    // no `resource` is present.
                    if let Some(value) = resource_value.or(about_value) {
                        if let Some(book_id) = extract_trailing_number(&value) {
                            record = Some(EbookRecord::new(book_id));
                            if let Some(r) = record.as_mut() {
                                r.source_url = Some(value);
                            }
                        }
                    }
                }

                match local.as_str() {
                    "agent" => current_agent = Some(AuthorRecord::new(String::new())),
                    "subject" => in_value_container = Some("subject".to_string()),
                    "bookshelf" => in_value_container = Some("bookshelf".to_string()),
                    "language" => in_value_container = Some("language".to_string()),
                    _ => {}
                }

                current_field = Some(local);
            }
            Ok(Event::Text(e)) => {
                let Ok(text) = e.unescape() else { continue };
                let text = text.trim().to_string();
                if text.is_empty() {
                    continue;
                }

                if let Some(field) = current_field.clone() {
                    apply_text(
                        &field,
                        &text,
                        &mut record,
                        &mut current_agent,
                        &in_value_container,
                    );
                }
            }
            Ok(Event::End(e)) => {
                let local = local_name(e.name().as_ref());
                match local.as_str() {
                    "agent" => {
                        if let (Some(agent), Some(r)) = (current_agent.take(), record.as_mut()) {
                            if !agent.name.trim().is_empty() {
                                r.authors.push(agent);
                            }
                        }
                    }
                    "subject" | "bookshelf" | "language" => in_value_container = None,
                    _ => {}
                }
                current_field = None;
            }
            Ok(_) => {}
            Err(err) => return Err(format!("XML parse error: {err}")),
        }
        buf.clear();
    }

    let mut record = record.ok_or("no parseable book id found")?;

    if record.authors.is_empty() {
        if let Some(creator) = creator_fallback(xml) {
            record.authors.push(AuthorRecord::new(creator));
        }
    }

    Ok(record)
}

#[allow(clippy::too_many_arguments)]
fn apply_text(
    field: &str,
    text: &str,
    record: &mut Option<EbookRecord>,
    current_agent: &mut Option<AuthorRecord>,
    in_value_container: &Option<String>,
) {
    if let Some(agent) = current_agent.as_mut() {
        match field {
            "name" => agent.name = text.to_string(),
            "webpage" => agent.webpage = Some(text.to_string()),
            "birthdate" => agent.birth_year = extract_leading_year(text),
            "deathdate" => agent.death_year = extract_leading_year(text),
            _ => {}
        }
        return;
    }

    let Some(record) = record.as_mut() else { return };

    if field == "value" {
        match in_value_container.as_deref() {
            Some("subject") => {
                if !text.is_empty() {
                    record.subjects.push(text.to_string());
                }
            }
            Some("bookshelf") => {
                if !text.is_empty() {
                    record.bookshelves.push(text.to_string());
                }
            }
            Some("language") => apply_language(record, text),
            _ => {}
        }
        return;
    }

    match field {
        "title" => record.title = text.to_string(),
        "rights" => record.rights = Some(text.to_string()),
        "issued" => record.publication_date = parse_issued_date(text),
        "downloads" => record.download_count = text.parse().ok(),
        _ => {}
    }
}

fn apply_language(record: &mut EbookRecord, text: &str) {
    match LanguageMapper::try_map(text) {
        Some((code, name)) => {
            record.language = Some(name.to_string());
            record.language_short_code = Some(code.to_string());
        }
        None if (2..=3).contains(&text.len()) => {
            record.language_short_code = Some(text.to_lowercase());
        }
        None => record.language = Some(text.to_string()),
    }
}

fn parse_issued_date(text: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    let year: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    year.parse::<i32>().ok().and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
}

fn extract_leading_year(text: &str) -> Option<i32> {
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Extract the last run of digits from `s`, ignoring a trailing `.rdf`.
/// Implements the `/(\d+)(?:\.rdf)?$` rule without pulling in `regex`.
fn extract_trailing_number(s: &str) -> Option<u32> {
    let trimmed = s.strip_suffix(".rdf").unwrap_or(s);
    let digits: String = trimmed
        .chars()
        .rev()
        .take_while(char::is_ascii_digit)
        .collect::<String>()
        .chars()
        .rev()
        .collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

/// Last-resort author fallback: one DC `creator` text, used only when no
/// `pgterms:agent` elements were present at all.
fn creator_fallback(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_creator = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => return None,
            Ok(Event::Start(e)) if local_name(e.name().as_ref()) == "creator" => in_creator = true,
            Ok(Event::End(e)) if local_name(e.name().as_ref()) == "creator" => in_creator = false,
            Ok(Event::Text(e)) if in_creator => {
                if let Ok(text) = e.unescape() {
                    let text = text.trim().to_string();
                    if !text.is_empty() {
                        return Some(text);
                    }
                }
            }
            Ok(_) => {}
            Err(_) => return None,
        }
        buf.clear();
    }
}

fn local_name(qname: &[u8]) -> String {
    let text = String::from_utf8_lossy(qname);
    text.rsplit(':').next().unwrap_or(&text).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:dcterms="http://purl.org/dc/terms/"
         xmlns:pgterms="http://www.gutenberg.org/2009/pgterms/">
  <pgterms:ebook rdf:about="ebooks/12345">
    <dcterms:title>Pride and Prejudice</dcterms:title>
    <dcterms:creator>
      <pgterms:agent>
        <pgterms:name>Austen, Jane</pgterms:name>
        <pgterms:birthdate>1775</pgterms:birthdate>
        <pgterms:deathdate>1817</pgterms:deathdate>
      </pgterms:agent>
    </dcterms:creator>
    <dcterms:language>
      <rdf:Description>
        <rdf:value>en</rdf:value>
      </rdf:Description>
    </dcterms:language>
    <dcterms:issued>1813-01-28</dcterms:issued>
    <dcterms:subject>
      <rdf:Description>
        <rdf:value>Fiction</rdf:value>
      </rdf:Description>
    </dcterms:subject>
    <pgterms:bookshelf>
      <rdf:Description>
        <rdf:value>Best Books Ever Listings</rdf:value>
      </rdf:Description>
    </pgterms:bookshelf>
    <dcterms:rights>Public domain in the USA.</dcterms:rights>
    <pgterms:downloads>1000</pgterms:downloads>
  </pgterms:ebook>
</rdf:RDF>"#;

    #[test]
    fn extracts_book_id_from_about_attribute() {
        let record = parse_rdf_str(SAMPLE).unwrap();
        assert_eq!(record.book_id, 12345);
    }

    #[test]
    fn extracts_title_and_rights() {
        let record = parse_rdf_str(SAMPLE).unwrap();
        assert_eq!(record.title, "Pride and Prejudice");
        assert_eq!(record.rights.as_deref(), Some("Public domain in the USA."));
    }

    #[test]
    fn extracts_author_with_years() {
        let record = parse_rdf_str(SAMPLE).unwrap();
        assert_eq!(record.authors.len(), 1);
        assert_eq!(record.authors[0].name, "Austen, Jane");
        assert_eq!(record.authors[0].birth_year, Some(1775));
        assert_eq!(record.authors[0].death_year, Some(1817));
    }

    #[test]
    fn extracts_language_code_and_name() {
        let record = parse_rdf_str(SAMPLE).unwrap();
        assert_eq!(record.language_short_code.as_deref(), Some("en"));
        assert_eq!(record.language.as_deref(), Some("English"));
    }

    #[test]
    fn extracts_publication_date() {
        let record = parse_rdf_str(SAMPLE).unwrap();
        assert_eq!(
            record.publication_date,
            Some(NaiveDate::from_ymd_opt(1813, 1, 28).unwrap())
        );
    }

    #[test]
    fn extracts_subjects_and_bookshelves() {
        let record = parse_rdf_str(SAMPLE).unwrap();
        assert_eq!(record.subjects, vec!["Fiction".to_string()]);
        assert_eq!(
            record.bookshelves,
            vec!["Best Books Ever Listings".to_string()]
        );
    }

    #[test]
    fn extracts_download_count() {
        let record = parse_rdf_str(SAMPLE).unwrap();
        assert_eq!(record.download_count, Some(1000));
    }

    #[test]
    fn prefers_resource_attribute_over_about() {
        let xml = SAMPLE.replace(
            r#"rdf:about="ebooks/12345""#,
            r#"rdf:about="ebooks/99999" rdf:resource="ebooks/12345""#,
        );
        let record = parse_rdf_str(&xml).unwrap();
        assert_eq!(record.book_id, 12345);
        assert_eq!(record.source_url.as_deref(), Some("ebooks/12345"));
    }

    #[test]
    fn missing_book_id_is_a_parse_error() {
        let xml = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"></rdf:RDF>"#;
        assert!(parse_rdf_str(xml).is_err());
    }

    #[test]
    fn year_only_issued_date_falls_back_to_january_first() {
        let xml = SAMPLE.replace("1813-01-28", "1813");
        let record = parse_rdf_str(&xml).unwrap();
        assert_eq!(
            record.publication_date,
            Some(NaiveDate::from_ymd_opt(1813, 1, 1).unwrap())
        );
    }
}
