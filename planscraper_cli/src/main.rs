mod commands;
mod output;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "planscraper")]
#[command(about = "Crawl planning application portals into a flat table")]
struct Cli {
    /// Also write logs to a daily file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a portal (or reuse the cache) and export one row per application
    Crawl(commands::crawl::CrawlArgs),
    /// Re-run extraction over a cached crawl without network access
    Parse(commands::parse::ParseArgs),
    /// List supported portals
    Portals,
}

fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env()
        .add_directive("planscraper=info".parse().unwrap())
        .add_directive("planscraper_lib=info".parse().unwrap())
        .add_directive("northgate_api=info".parse().unwrap());

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "planscraper.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_dir.as_deref());

    match &cli.command {
        Commands::Crawl(args) => commands::crawl::run(args).await?,
        Commands::Parse(args) => commands::parse::run(args)?,
        Commands::Portals => commands::portals::run(),
    }

    Ok(())
}
