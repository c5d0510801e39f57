use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use planscraper_lib::{implementation_name, parse_bundles, BundleCache, PlanScraperError};

use crate::output::{self, ExportFormat};

#[derive(Args)]
pub struct ParseArgs {
    /// Website identifier the cache was crawled from
    #[arg(default_value = "planning.wandsworth.gov.uk")]
    pub website: String,

    /// SQLite cache written by `planscraper crawl`
    #[arg(long, default_value = "output/raw_data.db")]
    pub cache: PathBuf,

    /// Export path for csv output
    #[arg(long, default_value = "output/output.csv")]
    pub output: PathBuf,

    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,
}

pub fn run(args: &ParseArgs) -> Result<()> {
    if implementation_name(&args.website).is_none() {
        return Err(PlanScraperError::UnknownPortal(args.website.clone()).into());
    }
    if !args.cache.exists() {
        bail!(
            "No cache at {}; run `planscraper crawl` first",
            args.cache.display()
        );
    }

    let cache = BundleCache::open(&args.cache)?;
    cache.init()?;
    let bundles = cache.load()?;

    let records = parse_bundles(&bundles);
    output::write_records(&records, args.format, &args.output)?;
    Ok(())
}
