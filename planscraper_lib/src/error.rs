//! Error types for the library layer.

use std::fmt;

use crate::cache::CacheError;

/// Errors produced by the library layer, wrapping transport and cache
/// failures and adding portal lookup failures.
///
/// None of these abort a running crawl: per-page and per-field failures are
/// degraded where they happen. They surface only from setup, persistence
/// and direct downloads.
#[derive(Debug)]
pub enum PlanScraperError {
    /// An error from the portal transport.
    Api(northgate_api::Error),
    /// Reading or writing the bundle cache failed.
    Cache(CacheError),
    /// No crawler is registered for this website identifier.
    UnknownPortal(String),
}

impl fmt::Display for PlanScraperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(e) => write!(f, "Portal error: {}", e),
            Self::Cache(e) => write!(f, "Cache error: {}", e),
            Self::UnknownPortal(name) => write!(f, "No crawler registered for website: {}", name),
        }
    }
}

impl std::error::Error for PlanScraperError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::Cache(e) => Some(e),
            Self::UnknownPortal(_) => None,
        }
    }
}

impl From<northgate_api::Error> for PlanScraperError {
    fn from(e: northgate_api::Error) -> Self {
        Self::Api(e)
    }
}

impl From<CacheError> for PlanScraperError {
    fn from(e: CacheError) -> Self {
        Self::Cache(e)
    }
}
