use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::{collapse_whitespace, labels, ExtractionError};
use crate::types::FieldValue;

static LABEL_SPANS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());

static DECISION_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}/\d{2}/\d{4}").unwrap());

/// Looks up the value printed next to a label span.
///
/// The span text must equal the label exactly, so `Decision` never picks up
/// `Decision Date` and a padded ` Decision ` span is not a label. The value is the text of the label's parent with the
/// label's own text removed.
pub fn table_value(doc: &Html, label: &str) -> FieldValue {
    match labelled_text(doc, label) {
        Ok(Some(text)) => FieldValue::from_text(&text),
        Ok(None) => FieldValue::NotFound,
        Err(e) => {
            tracing::error!("Lookup of {:?} failed: {}", label, e);
            FieldValue::ExtractionError
        }
    }
}

fn labelled_text(doc: &Html, label: &str) -> Result<Option<String>, ExtractionError> {
    let Some(label_el) = doc
        .select(&LABEL_SPANS)
        .find(|el| el.text().collect::<String>() == label)
    else {
        return Ok(None);
    };

    let parent = label_el
        .parent()
        .ok_or_else(|| ExtractionError::Structure(format!("label {:?} has no parent", label)))?;

    let label_id = label_el.id();
    let mut text = String::new();
    for node in parent.descendants() {
        if let Some(fragment) = node.value().as_text() {
            if !node.ancestors().any(|a| a.id() == label_id) {
                text.push_str(fragment);
            }
        }
    }
    Ok(Some(text))
}

/// Splits a raw decision cell into its text and its date.
///
/// The first `dd/mm/yyyy` run is the date; the text is what remains once
/// every date is removed. Either half may be missing.
pub fn split_decision(raw: &str) -> (FieldValue, FieldValue) {
    let cleaned = collapse_whitespace(raw);
    let date = DECISION_DATE
        .find(&cleaned)
        .map(|m| FieldValue::Found(m.as_str().to_string()))
        .unwrap_or(FieldValue::NotFound);
    let text = collapse_whitespace(&DECISION_DATE.replace_all(&cleaned, ""));
    (FieldValue::from_text(&text), date)
}

/// Returns `(decision, decision_date)` for the main detail page. A sentinel
/// from the lookup applies to both halves.
pub fn decision_values(doc: &Html) -> (FieldValue, FieldValue) {
    match table_value(doc, labels::DECISION) {
        FieldValue::Found(raw) => split_decision(&raw),
        sentinel => (sentinel.clone(), sentinel),
    }
}

/// The council decision column: decision text and date joined by a space.
pub fn council_decision(decision: &FieldValue, date: &FieldValue) -> FieldValue {
    match (decision, date) {
        (FieldValue::Found(text), FieldValue::Found(date)) => {
            FieldValue::Found(format!("{} {}", text, date))
        }
        (FieldValue::Found(text), _) => FieldValue::Found(text.clone()),
        (FieldValue::NotFound, FieldValue::Found(date)) => FieldValue::Found(date.clone()),
        (sentinel, _) => sentinel.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: &str, value: &str) -> String {
        format!(
            "<ul><li><div><span>{}</span>{}</div></li></ul>",
            label, value
        )
    }

    #[test]
    fn exact_label_match_only() {
        let html = format!(
            "<html><body>{}{}</body></html>",
            row("Decision Date", "01/01/2020"),
            row("Decision", "Refused 03/04/2021")
        );
        let doc = Html::parse_document(&html);
        assert_eq!(
            table_value(&doc, "Decision"),
            FieldValue::Found("Refused 03/04/2021".into())
        );
        assert_eq!(
            table_value(&doc, "Decision Date"),
            FieldValue::Found("01/01/2020".into())
        );
    }

    #[test]
    fn padded_label_span_does_not_match() {
        let doc = Html::parse_document(&row(" Proposal ", "Loft conversion"));
        assert_eq!(table_value(&doc, "Proposal"), FieldValue::NotFound);
    }

    #[test]
    fn missing_label_is_not_found() {
        let doc = Html::parse_document(&row("Proposal", "Loft conversion"));
        assert_eq!(table_value(&doc, "Site Address"), FieldValue::NotFound);
    }

    #[test]
    fn label_only_cell_is_not_found() {
        let doc = Html::parse_document(&row("Appeal Lodged", "  \n "));
        assert_eq!(table_value(&doc, "Appeal Lodged"), FieldValue::NotFound);
    }

    #[test]
    fn value_keeps_nested_markup_text() {
        let doc = Html::parse_document(&row(
            "Site Address",
            "\n  12 Example Road,<br/> <b>London</b>\n",
        ));
        assert_eq!(
            table_value(&doc, "Site Address"),
            FieldValue::Found("12 Example Road, London".into())
        );
    }

    #[test]
    fn split_decision_text_and_date() {
        assert_eq!(
            split_decision("Approved 01/02/2023"),
            (
                FieldValue::Found("Approved".into()),
                FieldValue::Found("01/02/2023".into())
            )
        );
    }

    #[test]
    fn split_decision_without_date() {
        assert_eq!(
            split_decision("  Withdrawn \n"),
            (FieldValue::Found("Withdrawn".into()), FieldValue::NotFound)
        );
    }

    #[test]
    fn split_decision_date_only() {
        assert_eq!(
            split_decision("01/02/2023"),
            (FieldValue::NotFound, FieldValue::Found("01/02/2023".into()))
        );
    }

    #[test]
    fn missing_decision_applies_to_both_halves() {
        let doc = Html::parse_document("<html><body><p>nothing here</p></body></html>");
        let (decision, date) = decision_values(&doc);
        assert_eq!(decision, FieldValue::NotFound);
        assert_eq!(date, FieldValue::NotFound);
        assert_eq!(council_decision(&decision, &date), FieldValue::NotFound);
    }

    #[test]
    fn council_decision_joins_parts() {
        let decision = FieldValue::Found("Granted".into());
        let date = FieldValue::Found("14/08/2023".into());
        assert_eq!(
            council_decision(&decision, &date),
            FieldValue::Found("Granted 14/08/2023".into())
        );
        assert_eq!(
            council_decision(&decision, &FieldValue::NotFound),
            FieldValue::Found("Granted".into())
        );
        assert_eq!(
            council_decision(&FieldValue::ExtractionError, &FieldValue::ExtractionError),
            FieldValue::ExtractionError
        );
    }
}
