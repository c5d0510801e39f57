//! Document-link resolution: the second postback flow.
//!
//! The related-documents page lists files in a grid whose rows are opened
//! by a WebForms postback. Resolving the application form means reading
//! that page's own tokens, naming the row's postback target, and posting
//! to the case's comments page, which answers with plain links.

use std::sync::LazyLock;

use northgate_api::endpoints::resolve_href;
use northgate_api::{DocumentPostback, HiddenFormState, RequestHeaders};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::PageFetcher;

pub const APPLICATION_FORM_LABEL: &str = "Application Form";

static SPANS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());
static ANCHORS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static CASE_NUMBER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span#lblCaseNo").unwrap());
static NEW_TAB_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[target="_blank"]"#).unwrap());

static EVENT_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"gvDocs\$ctl\d+\$lnkDShow").unwrap());

/// Everything needed to post for the application form's links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPostbackPlan {
    pub event_target: String,
    pub case_number: String,
    pub state: HiddenFormState,
}

/// Reads the related-documents page. `None` when the page has no
/// application form row, or the row or case number cannot be read.
pub fn plan_document_postback(html: &str) -> Option<DocumentPostbackPlan> {
    let doc = Html::parse_document(html);

    let Some(label) = doc
        .select(&SPANS)
        .find(|span| span.text().collect::<String>().trim() == APPLICATION_FORM_LABEL)
    else {
        tracing::info!("No document URL for this application.");
        return None;
    };

    let href = label
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "tr")
        .and_then(|row| row.select(&ANCHORS).next())
        .and_then(|a| a.value().attr("href"));
    let Some(event_target) = href.and_then(|h| EVENT_TARGET.find(h)) else {
        tracing::warn!("Application form row has no document postback control");
        return None;
    };

    let case_number = doc
        .select(&CASE_NUMBER)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|c| !c.is_empty());
    let Some(case_number) = case_number else {
        tracing::warn!("Documents page has no case number");
        return None;
    };

    let state = HiddenFormState::from_document(&doc);
    if !state.is_complete() {
        tracing::warn!(
            "Documents page is missing {:?}; posting empty values",
            state.missing()
        );
    }

    Some(DocumentPostbackPlan {
        event_target: event_target.as_str().to_string(),
        case_number,
        state,
    })
}

/// Hrefs of every new-tab link on `html`, resolved against `page_url`, in
/// document order.
pub fn document_links(html: &str, page_url: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    doc.select(&NEW_TAB_LINKS)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_href(page_url, href))
        .collect()
}

/// Turns a related-documents page into candidate document URLs.
///
/// An empty result means no document was offered; the caller decides
/// what to fall back to.
pub async fn resolve_document_links(fetcher: &PageFetcher, documents_page: &str) -> Vec<String> {
    let Some(plan) = plan_document_postback(documents_page) else {
        return Vec::new();
    };

    let endpoints = fetcher.endpoints();
    let page_url = endpoints.documents_url(&plan.case_number);
    let body = DocumentPostback::new(&plan.event_target, &plan.state).encode();
    let headers = RequestHeaders::postback(&endpoints.documents_origin, &page_url);
    tracing::debug!("Posting {} for case {}", plan.event_target, plan.case_number);

    let Some(response) = fetcher.post_form(&page_url, headers, body).await else {
        return Vec::new();
    };
    let links = document_links(&response, &page_url);
    if links.is_empty() {
        tracing::info!("No document links offered for case {}", plan.case_number);
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENTS_PAGE: &str = include_str!("../../tests/fixtures/documents_page.html");
    const DOCUMENT_LINKS: &str = include_str!("../../tests/fixtures/document_links.html");

    #[test]
    fn plan_uses_exact_application_form_row() {
        let plan = plan_document_postback(DOCUMENTS_PAGE).unwrap();
        assert_eq!(plan.event_target, "gvDocs$ctl03$lnkDShow");
        assert_eq!(plan.case_number, "2023/2441");
        assert_eq!(plan.state.view_state.as_deref(), Some("docsVS2"));
        assert_eq!(plan.state.event_validation.as_deref(), Some("docsEV2"));
    }

    #[test]
    fn no_application_form_row_means_no_plan() {
        let html = r#"<table><tr><td><a href="javascript:__doPostBack('gvDocs$ctl02$lnkDShow','')">View</a></td>
            <td><span>Site Plan</span></td></tr></table><span id="lblCaseNo">1</span>"#;
        assert_eq!(plan_document_postback(html), None);
    }

    #[test]
    fn missing_case_number_means_no_plan() {
        let html = r#"<table><tr><td><a href="javascript:__doPostBack('gvDocs$ctl05$lnkDShow','')">View</a></td>
            <td><span>Application Form</span></td></tr></table>"#;
        assert_eq!(plan_document_postback(html), None);
    }

    #[test]
    fn row_without_postback_control_means_no_plan() {
        let html = r#"<table><tr><td><a href="/static/form.pdf">View</a></td>
            <td><span>Application Form</span></td></tr></table><span id="lblCaseNo">1</span>"#;
        assert_eq!(plan_document_postback(html), None);
    }

    #[test]
    fn links_keep_document_order_and_resolve() {
        let links = document_links(
            DOCUMENT_LINKS,
            "https://planning2.example.gov.uk/planningcase/comments.aspx?case=2023%2F2441",
        );
        assert_eq!(
            links,
            vec![
                "https://planning2.example.gov.uk/docs/2023-2441-form.html".to_string(),
                "https://planning2.example.gov.uk/docs/2023-2441-form.pdf".to_string(),
                "https://planning2.example.gov.uk/docs/2023-2441-form-copy.pdf".to_string(),
            ]
        );
    }

    #[test]
    fn page_without_new_tab_links_is_empty() {
        let links = document_links("<p><a href=\"/x\">same tab</a></p>", "https://a.example/");
        assert!(links.is_empty());
    }

    #[test]
    fn blank_hrefs_are_not_candidates() {
        let links = document_links(
            "<ul><li><a target=\"_blank\" href=\"  \">Form</a></li>\
             <li><a target=\"_blank\" href=\"\">Plan</a></li></ul>",
            "https://a.example/planningcase/comments.aspx?case=1",
        );
        assert!(links.is_empty());
    }
}
