use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use homecrawl_core::{load_crawl_config, AdvertiserType, CrawlConfig, FilterCriteria};
use homecrawl_crawler::{
    polygon_from_feature, CancelFlag, CrawlOptions, Crawler, DivarClient, FileStore, ResultCache,
};

#[derive(Debug, Parser)]
#[command(name = "homecrawl")]
#[command(about = "Map-based real-estate listing crawler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl a polygonal area and print (or write) the merged listings.
    Crawl {
        /// Path to a GeoJSON file with the area polygon (Feature or geometry).
        #[arg(long)]
        area: PathBuf,
        /// Write the resulting JSON here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Override the configured tile side, in kilometers.
        #[arg(long)]
        cell_km: Option<f64>,
        /// Ignore any cached result and crawl fresh.
        #[arg(long)]
        refresh: bool,
        /// Require (or exclude, with `=false`) an elevator.
        #[arg(long)]
        elevator: Option<bool>,
        /// Require (or exclude, with `=false`) parking.
        #[arg(long)]
        parking: Option<bool>,
        /// Require (or exclude, with `=false`) a balcony.
        #[arg(long)]
        balcony: Option<bool>,
        /// Floor-area bounds in square meters, as MIN:MAX.
        #[arg(long, value_parser = parse_range)]
        size: Option<(u64, u64)>,
        /// Total price bounds, as MIN:MAX.
        #[arg(long, value_parser = parse_range)]
        price: Option<(u64, u64)>,
        /// Only listings from this kind of advertiser.
        #[arg(long)]
        advertiser: Option<AdvertiserArg>,
    },
    /// Manage the on-disk result cache.
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Debug, Subcommand)]
enum CacheCommands {
    /// Remove the cached result for one area.
    Evict { area_id: String },
    /// Remove every cached result.
    Clear,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AdvertiserArg {
    Person,
    Business,
}

impl From<AdvertiserArg> for AdvertiserType {
    fn from(arg: AdvertiserArg) -> Self {
        match arg {
            AdvertiserArg::Person => AdvertiserType::Person,
            AdvertiserArg::Business => AdvertiserType::Business,
        }
    }
}

/// Parses `MIN:MAX` into an inclusive range pair.
fn parse_range(s: &str) -> Result<(u64, u64), String> {
    let (min, max) = s
        .split_once(':')
        .ok_or_else(|| format!("expected MIN:MAX, got {s:?}"))?;
    let min: u64 = min.trim().parse().map_err(|e| format!("bad minimum: {e}"))?;
    let max: u64 = max.trim().parse().map_err(|e| format!("bad maximum: {e}"))?;
    if min > max {
        return Err(format!("minimum {min} exceeds maximum {max}"));
    }
    Ok((min, max))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_crawl_config().context("failed to load configuration")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Crawl {
            area,
            out,
            cell_km,
            refresh,
            elevator,
            parking,
            balcony,
            size,
            price,
            advertiser,
        } => {
            let filters = FilterCriteria {
                elevator,
                parking,
                balcony,
                size,
                price,
                advertiser: advertiser.map(AdvertiserType::from),
            };
            run_crawl(&config, &area, out.as_deref(), cell_km, refresh, &filters).await
        }
        Commands::Cache { command } => {
            let cache = open_cache(&config)?;
            match command {
                CacheCommands::Evict { area_id } => {
                    cache
                        .evict(&area_id)
                        .await
                        .with_context(|| format!("failed to evict {area_id}"))?;
                    println!("evicted {area_id}");
                }
                CacheCommands::Clear => {
                    cache.evict_all().await.context("failed to clear cache")?;
                    println!("cache cleared");
                }
            }
            Ok(())
        }
    }
}

fn open_cache(config: &CrawlConfig) -> anyhow::Result<ResultCache<FileStore>> {
    let store = FileStore::new(config.cache_dir.clone())
        .with_context(|| format!("failed to open cache dir {}", config.cache_dir.display()))?;
    Ok(ResultCache::new(store, config.cache_ttl_hours))
}

async fn run_crawl(
    config: &CrawlConfig,
    area: &std::path::Path,
    out: Option<&std::path::Path>,
    cell_km: Option<f64>,
    refresh: bool,
    filters: &FilterCriteria,
) -> anyhow::Result<()> {
    let geojson = std::fs::read_to_string(area)
        .with_context(|| format!("failed to read {}", area.display()))?;
    let feature: serde_json::Value =
        serde_json::from_str(&geojson).context("area file is not valid JSON")?;
    let polygon = polygon_from_feature(&feature).context("area file is not a usable polygon")?;

    let provider = DivarClient::new(
        &config.provider_base_url,
        config.request_timeout_secs,
        &config.user_agent,
        config.max_retries,
        config.retry_backoff_base_secs,
    )
    .context("failed to build provider client")?;
    let crawler = Crawler::new(
        provider,
        open_cache(config)?,
        cell_km.unwrap_or(config.tile_side_km),
    );

    let options = CrawlOptions {
        force_refresh: refresh,
        cancel: CancelFlag::new(),
    };
    let cancel = options.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, finishing current tile");
            cancel.cancel();
        }
    });

    let outcome = crawler
        .crawl(&polygon, filters, &options, |progress| {
            eprintln!("[{:>3.0}%] {}", progress.fraction * 100.0, progress.status);
        })
        .await
        .context("crawl failed")?;

    if outcome.report.tiles_overflowed > 0 {
        tracing::warn!(
            overflowed = outcome.report.tiles_overflowed,
            "some tiles were too dense to enumerate; result is incomplete"
        );
    }

    let json = serde_json::to_string_pretty(&outcome.result)?;
    match out {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "{} listings written to {}",
                outcome.result.listing_count(),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}
