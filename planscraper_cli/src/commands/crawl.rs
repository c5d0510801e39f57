//! `planscraper crawl`: cache-or-crawl, then extract and export.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use planscraper_lib::northgate_api::{PortalEndpoints, TransportConfig};
use planscraper_lib::{
    build_portal, BundleCache, CancellationToken, CrawlReport, CrawlSettings, PortalStrategy,
    ProgressFn, RawApplicationBundle,
};

use crate::output::{self, ExportFormat};

#[derive(Args)]
pub struct CrawlArgs {
    /// Website identifier (see `planscraper portals`)
    #[arg(default_value = "planning.wandsworth.gov.uk")]
    pub website: String,

    /// Crawl only this application detail URL (repeatable). Skips search and never touches the cache
    #[arg(long = "url")]
    pub urls: Vec<String>,

    /// SQLite cache of raw crawl data
    #[arg(long, default_value = "output/raw_data.db")]
    pub cache: PathBuf,

    /// Crawl even if the cache already exists
    #[arg(long)]
    pub refresh: bool,

    /// Export path for csv output
    #[arg(long, default_value = "output/output.csv")]
    pub output: PathBuf,

    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,

    /// Maximum result pages to follow
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Applications walked at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Validate TLS certificates (the portal's are not accepted by default)
    #[arg(long)]
    pub verify_tls: bool,

    /// Serve every portal URL from this origin instead (also PLANSCRAPER_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,
}

pub async fn run(args: &CrawlArgs) -> Result<()> {
    let mut transport_config = TransportConfig::from_env();
    if args.verify_tls {
        transport_config.accept_invalid_certs = false;
    }

    let mut settings = CrawlSettings::from_env();
    if let Some(max_pages) = args.max_pages {
        settings.max_pages = max_pages;
    }
    if let Some(concurrency) = args.concurrency {
        settings.concurrency = concurrency.max(1);
    }

    let endpoints = match args
        .base_url
        .clone()
        .or_else(|| std::env::var("PLANSCRAPER_BASE_URL").ok())
    {
        Some(base) => PortalEndpoints::with_base_url(&base),
        None => PortalEndpoints::wandsworth(),
    };

    let portal = build_portal(&args.website, transport_config, settings, endpoints)?;
    tracing::info!("Using {} for {}", portal.name(), args.website);

    let use_cache = args.urls.is_empty() && !args.refresh && args.cache.exists();
    let bundles = if use_cache {
        eprintln!("Loading raw data from {}", args.cache.display());
        let cache = BundleCache::open(&args.cache)?;
        cache.init()?;
        cache.load()?
    } else {
        let report = crawl_with_progress(portal.as_ref(), args.urls.clone()).await?;
        if args.urls.is_empty() {
            save_report(&report, args)?;
        }
        report.bundles
    };

    let records = portal.parse(&bundles);
    output::write_records(&records, args.format, &args.output)?;
    Ok(())
}

async fn crawl_with_progress(portal: &dyn PortalStrategy, urls: Vec<String>) -> Result<CrawlReport> {
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted, finishing applications in progress...");
            ctrl_c.cancel();
        }
    });

    let pb = if urls.is_empty() {
        let pb = ProgressBar::no_length();
        pb.set_style(ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] {pos} applications {msg}",
        )?);
        pb
    } else {
        let pb = ProgressBar::new(urls.len() as u64);
        pb.set_style(ProgressStyle::with_template(
            "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} ({eta}) {msg}",
        )?);
        pb
    };
    pb.set_message("crawling...");

    let bar = pb.clone();
    let progress: ProgressFn = Arc::new(move |bundle: &RawApplicationBundle| {
        if bundle.main_detail_html.is_none() {
            bar.println(format!("  Warning: {} could not be fetched", bundle.source_url));
        }
        bar.inc(1);
    });

    let report = portal.crawl(urls, cancel, Some(progress)).await;

    pb.finish_with_message(format!(
        "done: {} of {} applications, {} failed",
        report.bundles.len(),
        report.discovered,
        report.failed_main_fetches
    ));
    if report.pagination_truncated {
        eprintln!("Search results incomplete: a results page could not be fetched");
    }
    if report.breaker_tripped {
        eprintln!("Crawl stopped early: too many consecutive failed applications");
    }
    Ok(report)
}

fn save_report(report: &CrawlReport, args: &CrawlArgs) -> Result<()> {
    if !report.is_complete() {
        eprintln!(
            "Crawl incomplete, not updating cache at {}",
            args.cache.display()
        );
        return Ok(());
    }
    if let Some(parent) = args.cache.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut cache = BundleCache::open(&args.cache)?;
    cache.init()?;
    cache.save(&report.bundles)?;
    eprintln!(
        "Cached {} applications to {}",
        report.bundles.len(),
        args.cache.display()
    );
    Ok(())
}
