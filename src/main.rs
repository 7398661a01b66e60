//! # ESG score scraper
//!
//! Fetches the LSEG ESG ticker list, pulls the score payload for every RIC with a pool of
//! concurrent workers, flattens the results and stores them in SQLite.
//!
//! ## Usage
//!
//! ```
//! # Scrape and persist using environment configuration
//! cargo run --bin esg-scraper
//!
//! # Use 4 outer units with 16 workers each and print records instead of storing them
//! cargo run --bin esg-scraper -- --processes 4 --threads 16 --dry-run
//! ```
//!
//! ## Configuration
//!
//! - `ESG_BASE_URL`: provider base URL (default: "https://www.lseg.com/bin/esg/")
//! - `ESG_THREAD_COUNT`: workers per outer unit (default: 8)
//! - `ESG_PROCESS_COUNT`: outer units (default: number of CPUs)
//! - `ESG_REQUEST_TIMEOUT_SECS`: per-request timeout (default: 30)
//! - `ESG_LOOKUP_FIELD`: ticker field holding the RIC (default: "ricCode")
//! - `ESG_NAME_FIELD`: ticker field holding the company name (default: "companyName")
//! - `DATABASE_PATH`: SQLite file (default: "esg.db")
//! - `OUTPUT_TABLE`: destination table (default: "esg_scores")
//! - `LOG_DIR`: directory for the rolling log file (default: "logs")

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use esg_scraper::db::Database;
use esg_scraper::environment::ScraperConfig;
use esg_scraper::logging::configure_logging;
use esg_scraper::lseg::LsegClient;
use esg_scraper::scraper::Scraper;
use esg_scraper::transform;

#[derive(Parser)]
#[clap(name = "esg-scraper", about = "Scrape LSEG ESG scores into SQLite")]
struct Cli {
    /// Workers per outer unit
    #[clap(short, long)]
    threads: Option<usize>,

    /// Number of outer units
    #[clap(short, long)]
    processes: Option<usize>,

    /// Destination table
    #[clap(long)]
    table: Option<String>,

    /// SQLite database file
    #[clap(long)]
    database: Option<String>,

    /// Print records as JSON lines instead of storing them
    #[clap(long)]
    dry_run: bool,
}

impl Cli {
    fn apply(&self, config: &mut ScraperConfig) {
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(processes) = self.processes {
            config.processes = processes;
        }
        if let Some(table) = &self.table {
            config.output_table = table.clone();
        }
        if let Some(database) = &self.database {
            config.database_path = database.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let mut config = ScraperConfig::from_env()?;
    args.apply(&mut config);

    configure_logging(&config.log_dir);
    info!("Initializing ESG scraper");

    let client = Arc::new(LsegClient::new(&config.base_url, config.request_timeout)?);
    let scraper = Scraper::new(
        client.clone(),
        client,
        config.layout(),
        &config.lookup_field,
    );
    let results = scraper.run().await?;

    info!("Transforming data");
    let records = transform::to_records(&results, &config.record_fields(), Utc::now());
    info!("Transformed {} records", records.len());

    if args.dry_run {
        for record in &records {
            println!("{}", serde_json::to_string(record)?);
        }
        return Ok(());
    }

    let db = Database::open(&config.database_path).await?;
    info!("Inserting data into {}", config.output_table);
    let inserted = db.insert_records(&config.output_table, &records).await?;
    let total = db.count_rows(&config.output_table).await?;
    info!("Inserted {} rows ({} total in {})", inserted, total, config.output_table);

    info!("Application completed successfully");
    Ok(())
}
