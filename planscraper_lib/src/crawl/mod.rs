//! Crawl stage: search postback, pagination, per-application walks.
//!
//! Every network call goes through [`PageFetcher`], which logs transport
//! failures and degrades them to `None`. One failing page never aborts the
//! crawl; the worker pool in [`pipeline`] decides when enough has failed.

pub mod documents;
pub mod paginator;
pub mod pipeline;
pub mod search;
pub mod walker;

use northgate_api::{PortalEndpoints, PortalRequest, RequestHeaders, Transport};

pub use self::paginator::{Pagination, Paginator, PaginatorState};
pub use self::pipeline::{walk_all, CrawlReport, ProgressFn};
pub use self::walker::walk_application;

/// The crawl's view of the network: one transport plus the portal's fixed URLs.
pub struct PageFetcher {
    transport: Transport,
    endpoints: PortalEndpoints,
}

impl PageFetcher {
    pub fn new(transport: Transport, endpoints: PortalEndpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &PortalEndpoints {
        &self.endpoints
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// GETs a page as text. `None` on any failure or an empty body.
    pub async fn fetch_text(&self, url: &str) -> Option<String> {
        let request = PortalRequest::get(url)
            .with_headers(RequestHeaders::browser(&self.endpoints.site_referer));
        match self.transport.send(&request).await {
            Ok(resp) => non_empty_text(url, resp.text()),
            Err(e) => {
                tracing::error!("download() error for {}: {}", url, e);
                None
            }
        }
    }

    /// POSTs an urlencoded form body with explicit postback headers.
    pub async fn post_form(
        &self,
        url: &str,
        headers: RequestHeaders,
        body: String,
    ) -> Option<String> {
        let request = PortalRequest::post(url, body).with_headers(headers);
        match self.transport.send(&request).await {
            Ok(resp) => non_empty_text(url, resp.text()),
            Err(e) => {
                tracing::error!("postback error for {}: {}", url, e);
                None
            }
        }
    }

    /// GETs a document, keeping the body only when the server says it is a PDF.
    pub async fn fetch_document(&self, url: &str) -> Option<Vec<u8>> {
        let request = PortalRequest::get(url)
            .with_headers(RequestHeaders::browser(&self.endpoints.site_referer));
        match self.transport.send(&request).await {
            Ok(resp) if resp.is_pdf() => Some(resp.body),
            Ok(resp) => {
                tracing::debug!(
                    "{} is not a PDF (content-type {:?})",
                    url,
                    resp.content_type
                );
                None
            }
            Err(e) => {
                tracing::error!("download_document() error for {}: {}", url, e);
                None
            }
        }
    }
}

fn non_empty_text(url: &str, text: String) -> Option<String> {
    if text.trim().is_empty() {
        tracing::warn!("Empty response body from {}", url);
        None
    } else {
        Some(text)
    }
}
