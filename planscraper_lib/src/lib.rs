//! Crawl pipeline for WebForms planning portals.
//!
//! Drives the search postback, walks paginated results, visits each
//! application's detail, dates and documents pages, and turns the raw pages
//! into one flat [`NormalizedRecord`] per application.

pub mod cache;
pub mod crawl;
pub mod error;
pub mod extract;
pub mod portal;
pub mod settings;
pub mod types;

pub use northgate_api;
pub use tokio_util::sync::CancellationToken;

pub use cache::{BundleCache, CacheError};
pub use crawl::{CrawlReport, PageFetcher, Pagination, ProgressFn};
pub use error::PlanScraperError;
pub use extract::{parse_bundle, parse_bundles, ExtractionError};
pub use portal::{build_portal, implementation_name, PortalStrategy, WandsworthPortal, PORTALS};
pub use settings::CrawlSettings;
pub use types::{FieldValue, NormalizedRecord, RawApplicationBundle, EXTRACTION_ERROR, NOT_FOUND};
