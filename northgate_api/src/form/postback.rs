use url::form_urlencoded;

use super::HiddenFormState;

/// `__EVENTTARGET` postback that opens one row of the related-documents grid.
#[derive(Debug, Clone)]
pub struct DocumentPostback<'a> {
    event_target: &'a str,
    state: &'a HiddenFormState,
}

impl<'a> DocumentPostback<'a> {
    pub fn new(event_target: &'a str, state: &'a HiddenFormState) -> Self {
        Self {
            event_target,
            state,
        }
    }

    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("__EVENTTARGET", self.event_target)
            .append_pair("__EVENTARGUMENT", "")
            .append_pair("__VIEWSTATE", self.state.view_state_or_empty())
            .append_pair("__VIEWSTATEGENERATOR", self.state.generator_or_empty())
            .append_pair("__SCROLLPOSITIONX", "0")
            .append_pair("__SCROLLPOSITIONY", "0")
            .append_pair("__EVENTVALIDATION", self.state.validation_or_empty())
            .finish()
    }
}
