use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use std::process;
use std::sync::Arc;
use tracing::info;

use cloudtrail_daily::cache::ReportCache;
use cloudtrail_daily::config::get_config;
use cloudtrail_daily::logging::init_logging;
use cloudtrail_daily::pipeline::Aggregator;
use cloudtrail_daily::report::print_report;
use cloudtrail_daily::store::S3Store;

#[derive(Parser)]
#[command(name = "cloudtrail-daily")]
#[command(about = "Daily CloudTrail activity reports: who did what, where")]
#[command(version)]
struct Cli {
    /// AWS account id whose trail to report on
    #[arg(long)]
    account: String,

    /// Bucket holding the CloudTrail log batches
    #[arg(long)]
    bucket: String,

    /// Trail region
    #[arg(long, default_value = "us-east-1")]
    region: String,

    /// Day to report on (YYYY-MM-DD, default: today)
    #[arg(long)]
    date: Option<String>,

    /// Enable verbose logging
    #[arg(long)]
    debug: bool,

    /// Recompute the report even when a cached one exists
    #[arg(long)]
    invalidate_cache: bool,

    /// Custom S3 endpoint (for S3-compatible stores)
    #[arg(long)]
    endpoint_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = cloudtrail_daily::config::init_config() {
        return handle_error(e);
    }
    // Held for the process lifetime so the file log writer stays alive.
    let _log_guard = init_logging(cli.debug);

    match run(cli).await {
        Ok(()) => Ok(()),
        Err(e) => handle_error(e),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = get_config();

    let date = match &cli.date {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            cloudtrail_daily::Error::Configuration(format!(
                "invalid date: {raw} (expected YYYY-MM-DD)"
            ))
        })?,
        None => chrono::Utc::now().date_naive(),
    };
    let date_key = date.format("%Y-%m-%d").to_string();

    let mut cache = ReportCache::load(&config.paths.cache_file)?;

    if !cli.invalidate_cache {
        if let Some(index) = cache.lookup(&cli.bucket, &cli.region, &date_key) {
            info!(bucket = %cli.bucket, region = %cli.region, date = %date_key, "serving cached report");
            print_report(index, &cli.bucket, &date_key);
            return Ok(());
        }
    }

    // Trail layout: AWSLogs/<account>/CloudTrail/<region>/<YYYY/MM/DD>
    let prefix = format!(
        "AWSLogs/{}/CloudTrail/{}/{}",
        cli.account,
        cli.region,
        date.format("%Y/%m/%d")
    );

    let store = S3Store::connect(&cli.region, cli.endpoint_url.as_deref()).await;
    let aggregator = Aggregator::new(Arc::new(store), &config.processing);
    let index = aggregator.aggregate(&cli.bucket, &prefix).await?;

    cache.store(&cli.bucket, &cli.region, &date_key, index.clone())?;
    print_report(&index, &cli.bucket, &date_key);

    Ok(())
}

fn handle_error(e: anyhow::Error) -> Result<()> {
    eprintln!("Error: {e:#}");
    process::exit(1);
}
