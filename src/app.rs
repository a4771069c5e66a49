use tracing::info;

use crate::config::Config;
use crate::db::Db;
use crate::error::Result;
use crate::feed::TradesApi;
use crate::pipeline::{ingest, IngestSummary};

pub async fn run(config: Config) -> Result<IngestSummary> {
    info!("Polymarket trades ingestion started");
    info!("================================");

    info!("Feed: {}", config.feed.trades_url);
    info!(
        "Cost threshold: {}, local zone: {}",
        config.ingest.cost_threshold, config.ingest.local_tz
    );

    let db = Db::new(&config.database).await?;
    db.ensure_schema().await?;

    let source = TradesApi::new(&config.feed)?;

    ingest(source, &db, &config.feed, &config.ingest).await
}
