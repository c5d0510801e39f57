//! Field Extraction Engine: raw bundle in, normalized record out.
//!
//! HTML fields are found by exact label match; PDF fields by fixed regular
//! expressions over the document text. Every lookup degrades on its own, so
//! a broken field never affects its siblings or other applications.

pub mod html;
pub mod pdf;

use scraper::Html;

use crate::types::{NormalizedRecord, RawApplicationBundle};

/// Column labels as printed on the portal's detail and dates pages.
pub mod labels {
    pub const APPLICATION_NUMBER: &str = "Application Number";
    pub const APPLICATION_TYPE: &str = "Application Type";
    pub const SITE_ADDRESS: &str = "Site Address";
    pub const PROPOSAL: &str = "Proposal";
    pub const APPEAL_SUBMITTED: &str = "Appeal Submitted?";
    pub const APPEAL_LODGED: &str = "Appeal Lodged";
    pub const DECISION: &str = "Decision";
    pub const RECEIVED: &str = "Received?";
    pub const REGISTERED: &str = "Registered";
    pub const DECISION_EXPIRY: &str = "Decision Expiry";
}

#[derive(thiserror::Error, Debug)]
pub enum ExtractionError {
    #[error("unexpected page structure: {0}")]
    Structure(String),
    #[error("pdf error: {0}")]
    Pdf(String),
}

/// Extracts one record per bundle, in input order.
pub fn parse_bundles(bundles: &[RawApplicationBundle]) -> Vec<NormalizedRecord> {
    bundles.iter().map(parse_bundle).collect()
}

/// Extracts the full schema from one bundle. Parts that are absent leave
/// their fields at `NOT_FOUND`.
pub fn parse_bundle(bundle: &RawApplicationBundle) -> NormalizedRecord {
    let mut record = NormalizedRecord::new(&bundle.source_url);

    if let Some(main) = non_empty(bundle.main_detail_html.as_deref()) {
        apply_main_details(&mut record, main);
    }

    if let Some(dates) = non_empty(bundle.dates_html.as_deref()) {
        let doc = Html::parse_document(dates);
        record.received = html::table_value(&doc, labels::RECEIVED);
        record.registered = html::table_value(&doc, labels::REGISTERED);
        record.decision_expiry = html::table_value(&doc, labels::DECISION_EXPIRY);
    }

    if let Some(bytes) = bundle.document_bytes.as_deref().filter(|b| !b.is_empty()) {
        let fields = pdf::document_fields(bytes);
        record.easting = fields.easting;
        record.northing = fields.northing;
        record.planning_portal_reference = fields.planning_portal_reference;
    }

    record
}

fn apply_main_details(record: &mut NormalizedRecord, main: &str) {
    let doc = Html::parse_document(main);

    record.application_number = html::table_value(&doc, labels::APPLICATION_NUMBER);
    tracing::info!(
        "Parsing through Application Number: {}",
        record.application_number
    );

    let (decision, decision_date) = html::decision_values(&doc);
    record.council_decision = html::council_decision(&decision, &decision_date);
    record.appeal_decision = decision;
    record.appeal_decision_date = decision_date;

    record.application_type = html::table_value(&doc, labels::APPLICATION_TYPE);
    record.site_address = html::table_value(&doc, labels::SITE_ADDRESS);
    record.proposal = html::table_value(&doc, labels::PROPOSAL);
    record.appeal_submitted = html::table_value(&doc, labels::APPEAL_SUBMITTED);
    record.appeal_date_lodged = html::table_value(&doc, labels::APPEAL_LODGED);
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
