use std::sync::LazyLock;

use northgate_api::endpoints::resolve_href;
use northgate_api::PortalEndpoints;
use scraper::{Html, Selector};

use super::documents::resolve_document_links;
use super::PageFetcher;
use crate::types::RawApplicationBundle;

static DATES_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"a[title="Link to the application Dates page."]"#).unwrap()
});
static DOCUMENTS_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[title="Link to View Related Documents"]"#).unwrap());

/// Sub-page links found on an application's main detail page.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DetailLinks {
    pub dates: Option<String>,
    pub documents: Option<String>,
}

impl DetailLinks {
    /// The dates link is relative to the application base path; the
    /// documents link is resolved against the detail page itself.
    pub fn parse(html: &str, detail_url: &str, endpoints: &PortalEndpoints) -> Self {
        let doc = Html::parse_document(html);
        let href = |selector: &Selector| {
            doc.select(selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string)
        };
        Self {
            dates: href(&DATES_LINK).map(|h| endpoints.application_url(&h)),
            documents: href(&DOCUMENTS_LINK).and_then(|h| resolve_href(detail_url, &h)),
        }
    }
}

/// Fetches everything for one application.
///
/// A failed main page leaves the bundle empty apart from its URL, and no
/// sub-page is attempted.
pub async fn walk_application(fetcher: &PageFetcher, url: &str) -> RawApplicationBundle {
    tracing::info!("Page: {}", url);
    let mut bundle = RawApplicationBundle::new(url);

    let Some(main) = fetcher.fetch_text(url).await else {
        return bundle;
    };
    let links = DetailLinks::parse(&main, url, fetcher.endpoints());
    bundle.main_detail_html = Some(main);

    match links.dates {
        Some(dates_url) => bundle.dates_html = fetcher.fetch_text(&dates_url).await,
        None => tracing::debug!("No dates link on {}", url),
    }

    let Some(documents_url) = links.documents else {
        tracing::debug!("No related documents link on {}", url);
        return bundle;
    };

    let candidates = match fetcher.fetch_text(&documents_url).await {
        Some(page) => resolve_document_links(fetcher, &page).await,
        None => Vec::new(),
    };

    bundle.document_bytes = if candidates.is_empty() {
        fetcher.fetch_document(url).await
    } else {
        first_pdf(fetcher, &candidates).await
    };

    bundle
}

async fn first_pdf(fetcher: &PageFetcher, candidates: &[String]) -> Option<Vec<u8>> {
    for candidate in candidates {
        if let Some(bytes) = fetcher.fetch_document(candidate).await {
            return Some(bytes);
        }
    }
    tracing::info!("None of {} document links served a PDF", candidates.len());
    None
}
