use std::collections::HashSet;
use std::panic;
use std::sync::LazyLock;

use regex::Regex;

use super::{collapse_whitespace, ExtractionError};
use crate::types::FieldValue;

static EASTING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Easting \(x\) (\d+)").unwrap());
static NORTHING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(y\) (\d+)").unwrap());
static PORTAL_REFERENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(PP-\d{7})").unwrap());

/// The three fields read from the application form document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFields {
    pub easting: FieldValue,
    pub northing: FieldValue,
    pub planning_portal_reference: FieldValue,
}

impl DocumentFields {
    fn uniform(value: FieldValue) -> Self {
        Self {
            easting: value.clone(),
            northing: value.clone(),
            planning_portal_reference: value,
        }
    }
}

/// Extracts the document's text with whitespace runs collapsed.
///
/// The PDF parser can panic on malformed input; that is reported as an
/// error like any other parse failure.
pub fn document_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let extracted = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| ExtractionError::Pdf("parser panicked".to_string()))?
        .map_err(|e| ExtractionError::Pdf(e.to_string()))?;
    Ok(collapse_whitespace(&extracted))
}

/// Every distinct first capture of `pattern`, in first-seen order, joined
/// by single spaces.
pub fn pattern_values(text: &str, pattern: &Regex) -> FieldValue {
    let mut seen = HashSet::new();
    let mut values = Vec::new();
    for caps in pattern.captures_iter(text) {
        if let Some(m) = caps.get(1) {
            if seen.insert(m.as_str()) {
                values.push(m.as_str());
            }
        }
    }
    if values.is_empty() {
        FieldValue::NotFound
    } else {
        FieldValue::Found(values.join(" "))
    }
}

pub fn fields_from_text(text: &str) -> DocumentFields {
    DocumentFields {
        easting: pattern_values(text, &EASTING),
        northing: pattern_values(text, &NORTHING),
        planning_portal_reference: pattern_values(text, &PORTAL_REFERENCE),
    }
}

/// Reads the document fields from raw PDF bytes. A document that cannot be
/// parsed marks all three fields as extraction errors.
pub fn document_fields(bytes: &[u8]) -> DocumentFields {
    match document_text(bytes) {
        Ok(text) => fields_from_text(&text),
        Err(e) => {
            tracing::error!("Unable to read application form: {}", e);
            DocumentFields::uniform(FieldValue::ExtractionError)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM_TEXT: &str = "Site Location Easting (x) 526123 Northing (y) 174456 \
        Planning Portal Reference: PP-1234567 Description Easting (x) 526123 \
        Northing (y) 174456";

    #[test]
    fn fields_from_form_text() {
        let fields = fields_from_text(FORM_TEXT);
        assert_eq!(fields.easting, FieldValue::Found("526123".into()));
        assert_eq!(fields.northing, FieldValue::Found("174456".into()));
        assert_eq!(
            fields.planning_portal_reference,
            FieldValue::Found("PP-1234567".into())
        );
    }

    #[test]
    fn distinct_matches_keep_first_seen_order() {
        let text = "Easting (x) 123 then Easting (x) 456 and Easting (x) 123";
        assert_eq!(pattern_values(text, &EASTING), FieldValue::Found("123 456".into()));
    }

    #[test]
    fn no_match_is_not_found() {
        let fields = fields_from_text("a page with no coordinates");
        assert_eq!(fields, DocumentFields::uniform(FieldValue::NotFound));
    }

    #[test]
    fn portal_reference_needs_seven_digits() {
        assert_eq!(
            pattern_values("PP-123456 ref", &PORTAL_REFERENCE),
            FieldValue::NotFound
        );
    }

    #[test]
    fn every_page_of_the_form_is_searched() {
        let bytes = include_bytes!("../../tests/fixtures/two_page_form.pdf");
        let fields = document_fields(bytes);
        assert_eq!(fields.easting, FieldValue::Found("123 456".into()));
        assert_eq!(fields.northing, FieldValue::Found("555".into()));
        assert_eq!(
            fields.planning_portal_reference,
            FieldValue::Found("PP-1234567".into())
        );
    }

    #[test]
    fn garbage_bytes_mark_extraction_error() {
        let fields = document_fields(b"%PDF-1.4 this is not really a pdf");
        assert_eq!(fields, DocumentFields::uniform(FieldValue::ExtractionError));
    }
}
