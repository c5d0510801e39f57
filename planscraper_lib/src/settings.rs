//! Crawl policy knobs.

/// Historical cap on result pages (the portal shows 10 applications per page).
pub const DEFAULT_MAX_PAGES: u32 = 240;
/// Applications walked at once.
pub const DEFAULT_CONCURRENCY: usize = 4;
/// Consecutive failed detail fetches before the crawl gives up.
pub const DEFAULT_BREAKER_THRESHOLD: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSettings {
    pub max_pages: u32,
    pub concurrency: usize,
    pub breaker_threshold: usize,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            concurrency: DEFAULT_CONCURRENCY,
            breaker_threshold: DEFAULT_BREAKER_THRESHOLD,
        }
    }
}

impl CrawlSettings {
    /// Defaults overridden by `PLANSCRAPER_MAX_PAGES`, `PLANSCRAPER_CONCURRENCY`
    /// and `PLANSCRAPER_BREAKER_THRESHOLD`.
    pub fn from_env() -> Self {
        Self {
            max_pages: env_parse("PLANSCRAPER_MAX_PAGES", DEFAULT_MAX_PAGES),
            concurrency: env_parse("PLANSCRAPER_CONCURRENCY", DEFAULT_CONCURRENCY).max(1),
            breaker_threshold: env_parse("PLANSCRAPER_BREAKER_THRESHOLD", DEFAULT_BREAKER_THRESHOLD),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<T>().ok())
        .unwrap_or(default)
}
