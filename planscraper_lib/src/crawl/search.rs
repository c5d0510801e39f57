use chrono::NaiveDate;
use northgate_api::{HiddenFormState, RequestHeaders, SearchForm};

use super::PageFetcher;

/// Loads the search page for fresh tokens and posts the date-range search.
///
/// Returns the first results page, or `None` if either request failed.
pub async fn submit_search(fetcher: &PageFetcher, today: NaiveDate) -> Option<String> {
    let endpoints = fetcher.endpoints();

    tracing::info!("Getting general search data...");
    let Some(search_page) = fetcher.fetch_text(&endpoints.search_url).await else {
        tracing::error!("Search page unavailable, no applications to crawl");
        return None;
    };

    let state = HiddenFormState::from_html(&search_page);
    if !state.is_complete() {
        tracing::warn!(
            "Search page is missing {:?}; posting empty values",
            state.missing()
        );
    }

    let form = SearchForm::new(&state, today);
    let (start, end) = form.date_range();
    tracing::debug!("Searching applications received {} to {}", start, end);

    tracing::info!("Getting first page data...");
    let headers = RequestHeaders::postback(&endpoints.portal_origin, &endpoints.search_url);
    fetcher
        .post_form(&endpoints.search_url, headers, form.encode())
        .await
}
