use chrono::{Duration, NaiveDate};
use url::form_urlencoded;

use super::HiddenFormState;

/// Date format the search form expects.
pub const DATE_FORMAT: &str = "%d/%m/%Y";
/// Width of the received-date window: six months, counted as 6 x 30 days.
pub const SEARCH_WINDOW_DAYS: i64 = 6 * 30;

/// Free-text and dropdown filters, all left blank.
const EMPTY_FILTERS: &[&str] = &[
    "txtApplicationNumber",
    "txtApplicantName",
    "txtAgentName",
    "cboStreetReferenceNumber",
    "txtProposal",
    "edrDateSelection",
    "cboWardCode",
    "cboParishCode",
    "cboApplicationTypeCode",
    "cboDevelopmentTypeCode",
    "cboStatusCode",
];

/// Body of the GeneralSearch postback: every application received in the
/// last six months.
#[derive(Debug, Clone)]
pub struct SearchForm<'a> {
    state: &'a HiddenFormState,
    today: NaiveDate,
}

impl<'a> SearchForm<'a> {
    pub fn new(state: &'a HiddenFormState, today: NaiveDate) -> Self {
        Self { state, today }
    }

    /// `(start, end)` of the received-date filter.
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        (self.today - Duration::days(SEARCH_WINDOW_DAYS), self.today)
    }

    /// The urlencoded body, ready for an `application/x-www-form-urlencoded` POST.
    pub fn encode(&self) -> String {
        let (start, end) = self.date_range();
        let start = start.format(DATE_FORMAT).to_string();
        let end = end.format(DATE_FORMAT).to_string();

        let mut form = form_urlencoded::Serializer::new(String::new());
        form.append_pair("__VIEWSTATE", self.state.view_state_or_empty())
            .append_pair("__VIEWSTATEGENERATOR", self.state.generator_or_empty())
            .append_pair("__EVENTVALIDATION", self.state.validation_or_empty());
        for field in EMPTY_FILTERS {
            form.append_pair(field, "");
        }
        form.append_pair("cboSelectDateValue", "DATE_RECEIVED")
            .append_pair("cboMonths", "1")
            .append_pair("cboDays", "1")
            .append_pair("rbGroup", "rbRange")
            .append_pair("dateStart", &start)
            .append_pair("dateEnd", &end)
            .append_pair("csbtnSearch", "Search");
        form.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> HiddenFormState {
        HiddenFormState {
            view_state: Some("/wE+PD w=".to_string()),
            view_state_generator: Some("C2EE9ABB".to_string()),
            event_validation: Some("ev$1".to_string()),
        }
    }

    #[test]
    fn date_range_spans_one_hundred_eighty_days() {
        let state = tokens();
        let today = NaiveDate::from_ymd_opt(2023, 7, 1).unwrap();
        let (start, end) = SearchForm::new(&state, today).date_range();
        assert_eq!(end, today);
        assert_eq!(start, NaiveDate::from_ymd_opt(2023, 1, 2).unwrap());
    }

    #[test]
    fn encoded_body_is_stable() {
        let state = tokens();
        let today = NaiveDate::from_ymd_opt(2023, 7, 1).unwrap();
        let body = SearchForm::new(&state, today).encode();
        insta::assert_snapshot!(body, @"__VIEWSTATE=%2FwE%2BPD+w%3D&__VIEWSTATEGENERATOR=C2EE9ABB&__EVENTVALIDATION=ev%241&txtApplicationNumber=&txtApplicantName=&txtAgentName=&cboStreetReferenceNumber=&txtProposal=&edrDateSelection=&cboWardCode=&cboParishCode=&cboApplicationTypeCode=&cboDevelopmentTypeCode=&cboStatusCode=&cboSelectDateValue=DATE_RECEIVED&cboMonths=1&cboDays=1&rbGroup=rbRange&dateStart=02%2F01%2F2023&dateEnd=01%2F07%2F2023&csbtnSearch=Search");
    }

    #[test]
    fn missing_tokens_encode_as_empty_values() {
        let state = HiddenFormState::default();
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let body = SearchForm::new(&state, today).encode();
        assert!(body.starts_with("__VIEWSTATE=&__VIEWSTATEGENERATOR=&__EVENTVALIDATION=&"));
        assert!(body.contains("dateStart=17%2F09%2F2023"));
        assert!(body.contains("dateEnd=15%2F03%2F2024"));
    }
}
