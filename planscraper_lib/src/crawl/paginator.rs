//! Result-page pagination.
//!
//! The paginator is a small state machine. [`Paginator::absorb`] reads one
//! results page, [`Paginator::advance`] decides whether to follow the next
//! page control; the async [`Paginator::run`] drives both over the network.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tokio_util::sync::CancellationToken;

use super::PageFetcher;

static RESULT_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.TableData a.data_text").unwrap());

static NEXT_PAGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a.noborder img[title="Go to next page "]"#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginatorState {
    /// Waiting for the body of page `n` (1-based).
    Fetching(u32),
    /// Page absorbed; a next-page decision is pending.
    HasResults,
    Exhausted,
}

/// Detail hrefs and the next-page href found on one results page, raw.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ResultsPage {
    pub detail_hrefs: Vec<String>,
    pub next_href: Option<String>,
}

impl ResultsPage {
    pub fn parse(html: &str) -> Self {
        let doc = Html::parse_document(html);
        let detail_hrefs = doc
            .select(&RESULT_LINKS)
            .filter_map(|a| a.value().attr("href"))
            .map(str::to_string)
            .collect();
        let next_href = doc
            .select(&NEXT_PAGE)
            .next()
            .and_then(|img| img.parent())
            .and_then(ElementRef::wrap)
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string);
        Self {
            detail_hrefs,
            next_href,
        }
    }
}

pub struct Paginator<'a> {
    fetcher: &'a PageFetcher,
    max_pages: u32,
    state: PaginatorState,
    page: u32,
    next_url: Option<String>,
    links: Vec<String>,
}

impl<'a> Paginator<'a> {
    pub fn new(fetcher: &'a PageFetcher, max_pages: u32) -> Self {
        Self {
            fetcher,
            max_pages: max_pages.max(1),
            state: PaginatorState::Fetching(1),
            page: 1,
            next_url: None,
            links: Vec::new(),
        }
    }

    pub fn state(&self) -> PaginatorState {
        self.state
    }

    /// Detail URLs collected so far, in page order. Duplicates are kept.
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Reads the page currently being fetched. Ignored in any other state.
    pub fn absorb(&mut self, html: &str) {
        let PaginatorState::Fetching(page) = self.state else {
            return;
        };
        let results = ResultsPage::parse(html);
        let endpoints = self.fetcher.endpoints();
        self.links.extend(
            results
                .detail_hrefs
                .iter()
                .map(|href| endpoints.application_url(href)),
        );
        self.next_url = results
            .next_href
            .map(|href| endpoints.application_url(&href));
        self.page = page;
        self.state = PaginatorState::HasResults;
    }

    /// Moves to the next page if there is one and the cap allows it,
    /// returning its URL. Otherwise the paginator is exhausted.
    pub fn advance(&mut self) -> Option<String> {
        if self.state != PaginatorState::HasResults {
            return None;
        }
        match self.next_url.take() {
            Some(url) if self.page < self.max_pages => {
                self.state = PaginatorState::Fetching(self.page + 1);
                Some(url)
            }
            Some(_) => {
                tracing::info!("Reached page cap of {}", self.max_pages);
                self.state = PaginatorState::Exhausted;
                None
            }
            None => {
                tracing::info!("Next page not found");
                self.state = PaginatorState::Exhausted;
                None
            }
        }
    }

    /// Walks every results page starting from the search response.
    ///
    /// A page that cannot be fetched ends pagination with what was
    /// collected so far, and the outcome is marked truncated. A missing
    /// search response truncates before page 1.
    pub async fn run(mut self, first_page: Option<String>, cancel: &CancellationToken) -> Pagination {
        let mut body = first_page;
        let mut truncated = false;
        loop {
            let PaginatorState::Fetching(page) = self.state else {
                break;
            };
            let Some(html) = body.take() else {
                tracing::warn!("Results page {} unavailable, stopping pagination", page);
                self.state = PaginatorState::Exhausted;
                truncated = true;
                break;
            };
            self.absorb(&html);

            let Some(next_url) = self.advance() else {
                break;
            };
            if cancel.is_cancelled() {
                tracing::info!("Cancelled during pagination at page {}", page);
                self.state = PaginatorState::Exhausted;
                truncated = true;
                break;
            }
            tracing::info!("On page {}", page + 1);
            body = self.fetcher.fetch_text(&next_url).await;
        }
        tracing::info!("Found {} applications", self.links.len());
        Pagination {
            links: self.links,
            truncated,
        }
    }
}

/// What a pagination run collected.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Pagination {
    /// Detail URLs in page order.
    pub links: Vec<String>,
    /// Set when a results page failed or the run was cancelled before the
    /// last page. Reaching the page cap is not truncation.
    pub truncated: bool,
}
