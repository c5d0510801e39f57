//! Portal strategies and the static website registry.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use northgate_api::{PortalEndpoints, PortalRequest, PortalResponse, Transport, TransportConfig};
use tokio_util::sync::CancellationToken;

use crate::crawl::search::submit_search;
use crate::crawl::{walk_all, CrawlReport, PageFetcher, Pagination, Paginator, ProgressFn};
use crate::error::PlanScraperError;
use crate::extract::parse_bundles;
use crate::settings::CrawlSettings;
use crate::types::{NormalizedRecord, RawApplicationBundle};

/// Website identifier to implementation name.
pub const PORTALS: &[(&str, &str)] = &[("planning.wandsworth.gov.uk", "wandsworth_gov_uk")];

pub fn implementation_name(website: &str) -> Option<&'static str> {
    PORTALS
        .iter()
        .find(|(site, _)| *site == website)
        .map(|(_, name)| *name)
}

/// One planning portal: how to fetch from it, crawl it and parse what was
/// crawled.
#[async_trait]
pub trait PortalStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Sends one request through the portal's transport.
    async fn download(&self, request: &PortalRequest) -> Result<PortalResponse, PlanScraperError>;

    /// Crawls the given detail URLs, or discovers them by searching when
    /// `urls` is empty.
    async fn crawl(
        &self,
        urls: Vec<String>,
        cancel: CancellationToken,
        progress: Option<ProgressFn>,
    ) -> CrawlReport;

    fn parse(&self, bundles: &[RawApplicationBundle]) -> Vec<NormalizedRecord>;
}

pub struct WandsworthPortal {
    fetcher: Arc<PageFetcher>,
    settings: CrawlSettings,
}

impl WandsworthPortal {
    pub const NAME: &'static str = "wandsworth_gov_uk";

    pub fn new(
        transport_config: TransportConfig,
        settings: CrawlSettings,
        endpoints: PortalEndpoints,
    ) -> Result<Self, PlanScraperError> {
        let transport = Transport::new(transport_config)?;
        Ok(Self {
            fetcher: Arc::new(PageFetcher::new(transport, endpoints)),
            settings,
        })
    }

    /// Runs the search postback and pagination, returning detail URLs in
    /// result order. A failed search yields a truncated, empty outcome.
    pub async fn discover(&self, cancel: &CancellationToken) -> Pagination {
        let today = Local::now().date_naive();
        let first_page = submit_search(&self.fetcher, today).await;
        tracing::info!(
            "Getting all application URLs until page {}",
            self.settings.max_pages
        );
        Paginator::new(&self.fetcher, self.settings.max_pages)
            .run(first_page, cancel)
            .await
    }
}

#[async_trait]
impl PortalStrategy for WandsworthPortal {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn download(&self, request: &PortalRequest) -> Result<PortalResponse, PlanScraperError> {
        Ok(self.fetcher.transport().send(request).await?)
    }

    async fn crawl(
        &self,
        urls: Vec<String>,
        cancel: CancellationToken,
        progress: Option<ProgressFn>,
    ) -> CrawlReport {
        let discovery = if urls.is_empty() {
            self.discover(&cancel).await
        } else {
            tracing::info!("Crawling {} given application URLs", urls.len());
            Pagination {
                links: urls,
                truncated: false,
            }
        };
        let mut report = walk_all(
            Arc::clone(&self.fetcher),
            discovery.links,
            &self.settings,
            cancel,
            progress,
        )
        .await;
        report.pagination_truncated = discovery.truncated;
        report
    }

    fn parse(&self, bundles: &[RawApplicationBundle]) -> Vec<NormalizedRecord> {
        parse_bundles(bundles)
    }
}

/// Looks up `website` in [`PORTALS`] and builds its strategy.
pub fn build_portal(
    website: &str,
    transport_config: TransportConfig,
    settings: CrawlSettings,
    endpoints: PortalEndpoints,
) -> Result<Box<dyn PortalStrategy>, PlanScraperError> {
    match implementation_name(website) {
        Some(WandsworthPortal::NAME) => Ok(Box::new(WandsworthPortal::new(
            transport_config,
            settings,
            endpoints,
        )?)),
        _ => Err(PlanScraperError::UnknownPortal(website.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup() {
        assert_eq!(
            implementation_name("planning.wandsworth.gov.uk"),
            Some("wandsworth_gov_uk")
        );
        assert_eq!(implementation_name("planning.example.gov.uk"), None);
    }

    #[test]
    fn unknown_website_is_typed_error() {
        let result = build_portal(
            "planning.example.gov.uk",
            TransportConfig::default(),
            CrawlSettings::default(),
            PortalEndpoints::default(),
        );
        assert!(matches!(result, Err(PlanScraperError::UnknownPortal(site)) if site == "planning.example.gov.uk"));
    }

    #[test]
    fn builds_registered_portal() {
        let portal = build_portal(
            "planning.wandsworth.gov.uk",
            TransportConfig::default(),
            CrawlSettings::default(),
            PortalEndpoints::default(),
        )
        .unwrap();
        assert_eq!(portal.name(), "wandsworth_gov_uk");
        assert!(portal.parse(&[]).is_empty());
    }
}
