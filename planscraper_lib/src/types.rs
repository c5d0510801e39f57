//! Data model shared by the crawl and extraction stages.

use std::fmt;

use serde::{Serialize, Serializer};

/// Marker for a field whose label or pattern was not on the page.
pub const NOT_FOUND: &str = "NOT_FOUND";
/// Marker for a field whose lookup failed outright.
pub const EXTRACTION_ERROR: &str = "EXTRACTION_ERROR";

/// Everything fetched for one application, before extraction.
///
/// `source_url` is always set. The other parts are independently optional;
/// a missing part never blocks extraction from the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawApplicationBundle {
    pub source_url: String,
    pub main_detail_html: Option<String>,
    pub dates_html: Option<String>,
    pub document_bytes: Option<Vec<u8>>,
}

impl RawApplicationBundle {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            main_detail_html: None,
            dates_html: None,
            document_bytes: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.main_detail_html.is_none() && self.dates_html.is_none() && self.document_bytes.is_none()
    }
}

/// One extracted field: a value or one of the two sentinels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldValue {
    Found(String),
    #[default]
    NotFound,
    ExtractionError,
}

impl FieldValue {
    /// Trims `text`; blank text counts as not found.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Self::NotFound
        } else {
            Self::Found(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Found(value) => value,
            Self::NotFound => NOT_FOUND,
            Self::ExtractionError => EXTRACTION_ERROR,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One output row. Every column is always present; gaps hold a sentinel.
///
/// Field order is the export column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedRecord {
    pub application_number: FieldValue,
    pub application_type: FieldValue,
    pub site_address: FieldValue,
    pub proposal: FieldValue,
    pub appeal_submitted: FieldValue,
    pub appeal_decision: FieldValue,
    pub appeal_decision_date: FieldValue,
    pub council_decision: FieldValue,
    pub appeal_date_lodged: FieldValue,
    pub received: FieldValue,
    pub registered: FieldValue,
    pub decision_expiry: FieldValue,
    pub easting: FieldValue,
    pub northing: FieldValue,
    pub planning_portal_reference: FieldValue,
    pub source: String,
}

impl NormalizedRecord {
    pub const COLUMNS: [&'static str; 16] = [
        "application_number",
        "application_type",
        "site_address",
        "proposal",
        "appeal_submitted",
        "appeal_decision",
        "appeal_decision_date",
        "council_decision",
        "appeal_date_lodged",
        "received",
        "registered",
        "decision_expiry",
        "easting",
        "northing",
        "planning_portal_reference",
        "source",
    ];

    /// A record with every field at `NOT_FOUND`.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            application_number: FieldValue::NotFound,
            application_type: FieldValue::NotFound,
            site_address: FieldValue::NotFound,
            proposal: FieldValue::NotFound,
            appeal_submitted: FieldValue::NotFound,
            appeal_decision: FieldValue::NotFound,
            appeal_decision_date: FieldValue::NotFound,
            council_decision: FieldValue::NotFound,
            appeal_date_lodged: FieldValue::NotFound,
            received: FieldValue::NotFound,
            registered: FieldValue::NotFound,
            decision_expiry: FieldValue::NotFound,
            easting: FieldValue::NotFound,
            northing: FieldValue::NotFound,
            planning_portal_reference: FieldValue::NotFound,
            source: source.into(),
        }
    }

    /// Field values in column order.
    pub fn values(&self) -> [&str; 16] {
        [
            self.application_number.as_str(),
            self.application_type.as_str(),
            self.site_address.as_str(),
            self.proposal.as_str(),
            self.appeal_submitted.as_str(),
            self.appeal_decision.as_str(),
            self.appeal_decision_date.as_str(),
            self.council_decision.as_str(),
            self.appeal_date_lodged.as_str(),
            self.received.as_str(),
            self.registered.as_str(),
            self.decision_expiry.as_str(),
            self.easting.as_str(),
            self.northing.as_str(),
            self.planning_portal_reference.as_str(),
            &self.source,
        ]
    }
}
