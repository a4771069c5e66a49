//! Dumps the newest trades from the feed to a CSV file without touching the
//! database.
//!
//! Usage: export_trades [path]   (defaults to trades.csv)

use std::env;
use std::fs::File;
use std::io::BufWriter;

use anyhow::{Context, Result};
use tracing::info;

use pm_ingest::config::{FeedConfig, IngestConfig};
use pm_ingest::constants::defaults;
use pm_ingest::export::CsvSink;
use pm_ingest::feed::{Paginator, TradesApi};
use pm_ingest::logging::init;
use pm_ingest::normalize::normalize_batch;
use pm_ingest::pipeline::watermark::epoch;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let lookup = |key: &str| env::var(key).ok();

    let level = lookup("LOG_LEVEL").unwrap_or_else(|| defaults::LOG_LEVEL.to_string());
    init(&level);

    let feed = FeedConfig::from_lookup(&lookup)?;
    let ingest = IngestConfig::from_lookup(&lookup)?;

    let path = env::args().nth(1).unwrap_or_else(|| "trades.csv".to_string());
    let file = File::create(&path).with_context(|| format!("Failed to create CSV file: {}", path))?;
    let mut sink = CsvSink::new(BufWriter::new(file))?;

    let source = TradesApi::new(&feed)?;
    let mut paginator = Paginator::new(source, &feed, epoch());

    while let Some(page) = paginator.next_page().await? {
        let records = normalize_batch(page.trades, ingest.local_tz)?;
        sink.write_records(&records)?;
        info!("Offset {}: wrote {} trades", page.offset, records.len());
    }

    let rows = sink.rows();
    sink.finish()?;
    info!("Wrote {} trades to {}", rows, path);
    Ok(())
}
