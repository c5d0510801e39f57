//! Per-application worker pool.
//!
//! Uses Semaphore + JoinSet + mpsc: each application's walk is one task,
//! at most `concurrency` run at once, and results flow back over a channel
//! to a single collector that owns the circuit breaker.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::walker::walk_application;
use super::PageFetcher;
use crate::settings::CrawlSettings;
use crate::types::RawApplicationBundle;

/// Called once per finished application, in completion order.
pub type ProgressFn = Arc<dyn Fn(&RawApplicationBundle) + Send + Sync>;

#[derive(Debug, Default)]
pub struct CrawlReport {
    /// Walked bundles in discovery order.
    pub bundles: Vec<RawApplicationBundle>,
    /// Detail URLs handed to the pool.
    pub discovered: usize,
    pub failed_main_fetches: usize,
    pub breaker_tripped: bool,
    pub cancelled: bool,
    /// Discovery stopped early, so `discovered` undercounts the portal.
    pub pagination_truncated: bool,
}

impl CrawlReport {
    /// True when discovery finished and every discovered application was
    /// walked.
    pub fn is_complete(&self) -> bool {
        !self.pagination_truncated
            && !self.breaker_tripped
            && !self.cancelled
            && self.bundles.len() == self.discovered
    }
}

struct CircuitBreaker {
    consecutive_failures: usize,
    threshold: usize,
}

impl CircuitBreaker {
    fn new(threshold: usize) -> Self {
        Self {
            consecutive_failures: 0,
            threshold: threshold.max(1),
        }
    }

    fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    fn record_failure(&mut self) {
        self.consecutive_failures += 1;
    }

    fn is_tripped(&self) -> bool {
        self.consecutive_failures >= self.threshold
    }
}

struct WalkResult {
    index: usize,
    bundle: RawApplicationBundle,
}

/// Walks every application URL and collects the bundles.
///
/// Cancellation is checked before each walk starts; walks already running
/// finish. The breaker stops the pool after `breaker_threshold`
/// consecutive applications whose main page could not be fetched.
pub async fn walk_all(
    fetcher: Arc<PageFetcher>,
    urls: Vec<String>,
    settings: &CrawlSettings,
    cancel: CancellationToken,
    progress: Option<ProgressFn>,
) -> CrawlReport {
    let discovered = urls.len();
    let concurrency = settings.concurrency.max(1);
    tracing::info!(
        "Getting all page data from {} applications ({} at a time)...",
        discovered,
        concurrency
    );

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let (tx, mut rx) = mpsc::channel::<WalkResult>(concurrency * 2);
    let mut join_set = JoinSet::new();

    for (index, url) in urls.into_iter().enumerate() {
        let sem = Arc::clone(&semaphore);
        let sender = tx.clone();
        let fetcher = Arc::clone(&fetcher);
        let cancel = cancel.clone();

        join_set.spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return;
            };
            if cancel.is_cancelled() {
                return;
            }
            let bundle = walk_application(&fetcher, &url).await;
            let _ = sender.send(WalkResult { index, bundle }).await;
        });
    }
    drop(tx);

    let mut results = Vec::with_capacity(discovered);
    let mut breaker = CircuitBreaker::new(settings.breaker_threshold);
    let mut failed_main_fetches = 0usize;
    let mut breaker_tripped = false;

    while let Some(result) = rx.recv().await {
        if result.bundle.main_detail_html.is_some() {
            breaker.record_success();
        } else {
            failed_main_fetches += 1;
            breaker.record_failure();
        }
        if let Some(progress) = &progress {
            progress(&result.bundle);
        }
        results.push(result);

        if breaker.is_tripped() {
            tracing::error!(
                "Circuit breaker tripped after {} consecutive failed applications, stopping crawl",
                breaker.threshold
            );
            join_set.abort_all();
            breaker_tripped = true;
            break;
        }
    }
    drop(rx);
    while join_set.join_next().await.is_some() {}

    let cancelled = cancel.is_cancelled();
    if cancelled {
        tracing::warn!(
            "Crawl cancelled after {} of {} applications",
            results.len(),
            discovered
        );
    }

    results.sort_by_key(|r| r.index);
    CrawlReport {
        bundles: results.into_iter().map(|r| r.bundle).collect(),
        discovered,
        failed_main_fetches,
        breaker_tripped,
        cancelled,
        pagination_truncated: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breaker_trips_on_consecutive_failures_only() {
        let mut breaker = CircuitBreaker::new(3);
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();
        breaker.record_failure();
        assert!(!breaker.is_tripped());
        breaker.record_failure();
        assert!(breaker.is_tripped());
    }

    #[test]
    fn zero_threshold_means_one() {
        let mut breaker = CircuitBreaker::new(0);
        assert!(!breaker.is_tripped());
        breaker.record_failure();
        assert!(breaker.is_tripped());
    }

    #[test]
    fn report_completeness() {
        let report = CrawlReport {
            bundles: vec![RawApplicationBundle::new("a")],
            discovered: 1,
            ..Default::default()
        };
        assert!(report.is_complete());

        let cancelled = CrawlReport {
            discovered: 2,
            cancelled: true,
            ..Default::default()
        };
        assert!(!cancelled.is_complete());

        let truncated = CrawlReport {
            pagination_truncated: true,
            ..Default::default()
        };
        assert!(!truncated.is_complete());
    }
}
