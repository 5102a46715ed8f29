//! Fleet Catalog Recorder CLI
//!
//! Polls an airline flight-status API and maintains a versioned JSON
//! catalog of the fleet.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use fleetwatch::{
    client::{ApiClient, ClientConfig},
    crawler::{CrawlConfig, CrawlReport, Crawler},
    store,
    types::AirlineInfo,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "fleetwatch")]
#[command(about = "Airline fleet catalog recorder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding catalog files
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Airline IATA code (LH or CL)
    #[arg(short, long, default_value = "LH")]
    airline: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Update the catalog from a single day of flights
    Update {
        /// API keys, comma-separated (rotated on rate limiting)
        #[arg(long, env = "FLEETWATCH_API_KEYS", value_delimiter = ',')]
        api_key: Vec<String>,

        /// Target date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Compute everything but write nothing
        #[arg(long)]
        dry_run: bool,

        /// Days without a sighting before an aircraft is reported stale
        #[arg(long, default_value = "30")]
        stale_days: i64,

        /// Write observed changes to this JSON file
        #[arg(long)]
        export_changes: Option<PathBuf>,

        /// Minimum milliseconds between API requests
        #[arg(long, default_value = "5000")]
        min_interval_ms: u64,
    },

    /// Rebuild the catalog from a multi-day crawl
    Bootstrap {
        /// API keys, comma-separated (rotated on rate limiting)
        #[arg(long, env = "FLEETWATCH_API_KEYS", value_delimiter = ',')]
        api_key: Vec<String>,

        /// Number of consecutive days ending today
        #[arg(long, default_value = "7")]
        days: u32,

        /// Compute everything but write nothing
        #[arg(long)]
        dry_run: bool,

        /// Minimum milliseconds between API requests
        #[arg(long, default_value = "5000")]
        min_interval_ms: u64,
    },

    /// Show catalog statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let airline = AirlineInfo::from_code(&cli.airline).ok_or_else(|| {
        format!(
            "unsupported airline code '{}' (expected LH or CL)",
            cli.airline
        )
    })?;
    let catalog_path = cli
        .data_dir
        .join(format!("{}-fleet.json", airline.iata_code.to_lowercase()));

    match cli.command {
        Commands::Update {
            api_key,
            date,
            dry_run,
            stale_days,
            export_changes,
            min_interval_ms,
        } => {
            let client = build_client(api_key, min_interval_ms)?;
            let mut config = CrawlConfig::new(airline, catalog_path);
            config.target_date = date;
            config.dry_run = dry_run;
            config.stale_days = stale_days;
            config.export_path = export_changes;

            let report = Crawler::new(client, config).run().await?;
            log_report(&report);
        }

        Commands::Bootstrap {
            api_key,
            days,
            dry_run,
            min_interval_ms,
        } => {
            let client = build_client(api_key, min_interval_ms)?;
            let mut config = CrawlConfig::new(airline, catalog_path);
            config.bootstrap_days = Some(days);
            config.dry_run = dry_run;

            let report = Crawler::new(client, config).run().await?;
            log_report(&report);
        }

        Commands::Stats => {
            show_stats(&catalog_path)?;
        }
    }

    Ok(())
}

fn build_client(
    api_keys: Vec<String>,
    min_interval_ms: u64,
) -> Result<ApiClient, Box<dyn std::error::Error>> {
    let config = ClientConfig::new(api_keys)
        .with_min_interval(Duration::from_millis(min_interval_ms))
        .with_timeout(Duration::from_secs(30));
    Ok(ApiClient::new(config)?)
}

fn log_report(report: &CrawlReport) {
    tracing::info!("Run summary:");
    tracing::info!("  Created: {}", report.stats.created);
    tracing::info!("  Updated: {}", report.stats.updated);
    tracing::info!("  Re-seen: {}", report.stats.seen);
    tracing::info!("  Changes: {}", report.changes.len());
    tracing::info!("  Requests: {}", report.requests);
    tracing::info!("  Stale aircraft: {}", report.stale.len());
    tracing::info!(
        "  Catalog: {}",
        if report.persisted { "written" } else { "not written" }
    );
}

fn show_stats(catalog_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let Some(catalog) = store::load(catalog_path)? else {
        println!("No catalog at {}", catalog_path.display());
        return Ok(());
    };

    let total_flights: u64 = catalog
        .aircraft
        .iter()
        .map(|r| r.tracking.total_flights)
        .sum();
    let history_entries: usize = catalog.aircraft.iter().map(|r| r.history.len()).sum();
    let with_wifi = catalog
        .aircraft
        .iter()
        .filter(|r| r.connectivity.wifi != fleetwatch::types::WifiStatus::None)
        .count();

    println!("Catalog Statistics");
    println!("==================");
    println!("Airline: {} ({})", catalog.airline.name, catalog.airline.iata_code);
    println!("Generated: {}", catalog.generated_at);
    println!("Aircraft: {}", catalog.aircraft_count);
    println!("Observations: {}", total_flights);
    println!("History entries: {}", history_entries);
    println!("With wifi: {}", with_wifi);

    Ok(())
}
