use std::sync::LazyLock;

use scraper::{Html, Selector};

static VIEW_STATE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input#__VIEWSTATE").expect("invalid selector: viewstate"));
static VIEW_STATE_GENERATOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("input#__VIEWSTATEGENERATOR").expect("invalid selector: viewstate generator")
});
static EVENT_VALIDATION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("input#__EVENTVALIDATION").expect("invalid selector: event validation")
});

/// The three page-scoped ASP.NET tokens a postback must echo back.
///
/// Tokens are valid for exactly one follow-up request: always extract a fresh
/// set from the page you are about to post from. Each field is present only
/// when its hidden input exists and carries a `value` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiddenFormState {
    pub view_state: Option<String>,
    pub view_state_generator: Option<String>,
    pub event_validation: Option<String>,
}

impl HiddenFormState {
    pub fn from_html(html: &str) -> Self {
        Self::from_document(&Html::parse_document(html))
    }

    pub fn from_document(doc: &Html) -> Self {
        Self {
            view_state: input_value(doc, &VIEW_STATE),
            view_state_generator: input_value(doc, &VIEW_STATE_GENERATOR),
            event_validation: input_value(doc, &EVENT_VALIDATION),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.view_state.is_some()
            && self.view_state_generator.is_some()
            && self.event_validation.is_some()
    }

    /// Names of the tokens this page did not provide.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.view_state.is_none() {
            missing.push("__VIEWSTATE");
        }
        if self.view_state_generator.is_none() {
            missing.push("__VIEWSTATEGENERATOR");
        }
        if self.event_validation.is_none() {
            missing.push("__EVENTVALIDATION");
        }
        missing
    }

    pub(crate) fn view_state_or_empty(&self) -> &str {
        self.view_state.as_deref().unwrap_or_default()
    }

    pub(crate) fn generator_or_empty(&self) -> &str {
        self.view_state_generator.as_deref().unwrap_or_default()
    }

    pub(crate) fn validation_or_empty(&self) -> &str {
        self.event_validation.as_deref().unwrap_or_default()
    }
}

fn input_value(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM_PAGE: &str = r#"<html><body><form>
        <input type="hidden" name="__VIEWSTATE" id="__VIEWSTATE" value="/wEPDwUKMTY1" />
        <input type="hidden" name="__VIEWSTATEGENERATOR" id="__VIEWSTATEGENERATOR" value="C2EE9ABB" />
        <input type="hidden" name="__EVENTVALIDATION" id="__EVENTVALIDATION" value="/wEdAAx+abc=" />
    </form></body></html>"#;

    #[test]
    fn extracts_all_three_tokens() {
        let state = HiddenFormState::from_html(FORM_PAGE);
        assert_eq!(state.view_state.as_deref(), Some("/wEPDwUKMTY1"));
        assert_eq!(state.view_state_generator.as_deref(), Some("C2EE9ABB"));
        assert_eq!(state.event_validation.as_deref(), Some("/wEdAAx+abc="));
        assert!(state.is_complete());
        assert!(state.missing().is_empty());
    }

    #[test]
    fn input_without_value_is_absent() {
        let html = r#"<input type="hidden" id="__VIEWSTATE" />
            <input type="hidden" id="__EVENTVALIDATION" value="" />"#;
        let state = HiddenFormState::from_html(html);
        assert_eq!(state.view_state, None);
        assert_eq!(state.view_state_generator, None);
        assert_eq!(state.event_validation.as_deref(), Some(""));
        assert_eq!(state.missing(), vec!["__VIEWSTATE", "__VIEWSTATEGENERATOR"]);
    }

    #[test]
    fn page_without_form_yields_empty_state() {
        let state = HiddenFormState::from_html("<p>Service unavailable</p>");
        assert_eq!(state, HiddenFormState::default());
        assert!(!state.is_complete());
    }
}
