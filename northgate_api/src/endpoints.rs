//! Fixed URLs of a Northgate PlanningExplorer deployment.

use url::{form_urlencoded, Url};

/// Every fixed address the crawl touches.
///
/// Defaults point at the Wandsworth portal. [`PortalEndpoints::with_base_url`]
/// collapses all of them onto one origin, which is how tests drive the flow
/// against a mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalEndpoints {
    /// The GeneralSearch form page (GET for tokens, POST for results).
    pub search_url: String,
    /// Prefix for the relative hrefs found on result and detail pages.
    pub application_base_url: String,
    /// Origin sent with search postbacks.
    pub portal_origin: String,
    /// Referer sent with plain page loads.
    pub site_referer: String,
    /// The second-host comments page that serves document links.
    pub documents_case_url: String,
    /// Origin sent with document postbacks.
    pub documents_origin: String,
}

impl Default for PortalEndpoints {
    fn default() -> Self {
        Self::wandsworth()
    }
}

impl PortalEndpoints {
    pub fn wandsworth() -> Self {
        Self {
            search_url: "https://planning.wandsworth.gov.uk/Northgate/PlanningExplorer/GeneralSearch.aspx"
                .to_string(),
            application_base_url: "https://planning.wandsworth.gov.uk/Northgate/PlanningExplorer/Generic/"
                .to_string(),
            portal_origin: "https://planning.wandsworth.gov.uk".to_string(),
            site_referer: "https://www.wandsworth.gov.uk/".to_string(),
            documents_case_url: "https://planning2.wandsworth.gov.uk/planningcase/comments.aspx"
                .to_string(),
            documents_origin: "https://planning2.wandsworth.gov.uk".to_string(),
        }
    }

    /// Same paths as production, all served from `base_url`. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            search_url: format!("{}/Northgate/PlanningExplorer/GeneralSearch.aspx", base),
            application_base_url: format!("{}/Northgate/PlanningExplorer/Generic/", base),
            portal_origin: base.to_string(),
            site_referer: format!("{}/", base),
            documents_case_url: format!("{}/planningcase/comments.aspx", base),
            documents_origin: base.to_string(),
        }
    }

    /// Turns a relative href from a result or detail page into a fetchable URL.
    ///
    /// Absolute hrefs are only cleaned, never re-prefixed.
    pub fn application_url(&self, href: &str) -> String {
        let cleaned = clean_href(href);
        if cleaned.starts_with("http://") || cleaned.starts_with("https://") {
            cleaned
        } else {
            format!("{}{}", self.application_base_url, cleaned)
        }
    }

    /// The comments page for one case, with the case number as a query parameter.
    pub fn documents_url(&self, case_number: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(case_number.as_bytes()).collect();
        format!("{}?case={}", self.documents_case_url, encoded)
    }
}

/// Escapes spaces as `%20`, then strips any remaining whitespace.
pub fn clean_href(href: &str) -> String {
    href.replace(' ', "%20")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Resolves `href` against the page it was found on. Blank hrefs resolve
/// to nothing.
pub fn resolve_href(page_url: &str, href: &str) -> Option<String> {
    if href.trim().is_empty() {
        return None;
    }
    let cleaned = clean_href(href);
    let base = Url::parse(page_url).ok()?;
    base.join(&cleaned).ok().map(String::from)
}
