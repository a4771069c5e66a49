//! One incremental ingestion run: fetch pages newest-first, normalize them,
//! and persist the qualifying bets of each page in its own transaction.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::bets::{build_bet_rows, select_new, select_qualifying, unstored, write_bets};
use super::upsert::{resolve_entities, upsert_entities, EntityKeys, UpsertCounts};
use super::watermark::{epoch, resolve_watermark};
use crate::config::{FeedConfig, IngestConfig};
use crate::db::{StoreTx, TradeStore};
use crate::error::Result;
use crate::feed::{Paginator, StopReason, TradeSource};
use crate::normalize::{normalize_batch, NormalizedTrade};

#[derive(Debug, Clone, PartialEq)]
pub struct IngestSummary {
    pub watermark: DateTime<Utc>,
    pub pages_fetched: u32,
    pub trades_seen: usize,
    pub normalized: usize,
    pub new_trades: usize,
    pub qualifying: usize,
    pub bets_inserted: u64,
    /// Qualifying trades not written: no hash, repeated or already stored
    /// hash, or unresolved ids.
    pub bets_skipped: u64,
    pub users_inserted: u64,
    pub wallets_inserted: u64,
    pub events_inserted: u64,
    pub stop_reason: Option<StopReason>,
}

impl IngestSummary {
    fn new(watermark: DateTime<Utc>) -> Self {
        Self {
            watermark,
            pages_fetched: 0,
            trades_seen: 0,
            normalized: 0,
            new_trades: 0,
            qualifying: 0,
            bets_inserted: 0,
            bets_skipped: 0,
            users_inserted: 0,
            wallets_inserted: 0,
            events_inserted: 0,
            stop_reason: None,
        }
    }

    fn add_page(&mut self, page: &PageOutcome) {
        self.qualifying += page.qualifying;
        self.bets_inserted += page.bets_inserted;
        self.bets_skipped += page.qualifying as u64 - page.bets_inserted;
        self.users_inserted += page.upserted.users;
        self.wallets_inserted += page.upserted.wallets;
        self.events_inserted += page.upserted.events;
    }
}

impl fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "watermark {}: {} pages, {} trades ({} normalized, {} new), {} qualifying, \
             {} bets inserted, {} skipped, new users/wallets/events {}/{}/{}",
            self.watermark,
            self.pages_fetched,
            self.trades_seen,
            self.normalized,
            self.new_trades,
            self.qualifying,
            self.bets_inserted,
            self.bets_skipped,
            self.users_inserted,
            self.wallets_inserted,
            self.events_inserted,
        )?;
        if let Some(reason) = self.stop_reason {
            write!(f, ", stopped: {}", reason)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct PageOutcome {
    qualifying: usize,
    bets_inserted: u64,
    upserted: UpsertCounts,
}

/// Runs ingestion until the paginator stops.
///
/// Pages committed before a failure stay committed; the next run resumes
/// from whatever watermark they produced.
pub async fn ingest<S, D>(source: S, store: &D, feed: &FeedConfig, config: &IngestConfig) -> Result<IngestSummary>
where
    S: TradeSource,
    D: TradeStore,
{
    let watermark = if config.full_backfill {
        info!("Full backfill requested, ignoring stored watermark");
        epoch()
    } else {
        resolve_watermark(store).await?
    };

    let mut summary = IngestSummary::new(watermark);
    let mut paginator = Paginator::new(source, feed, watermark);

    while let Some(page) = paginator.next_page().await? {
        let offset = page.offset;
        summary.trades_seen += page.trades.len();

        let records = normalize_batch(page.trades, config.local_tz)?;
        summary.normalized += records.len();

        let new = select_new(&records, watermark);
        summary.new_trades += new.len();
        if new.is_empty() {
            debug!("Page at offset {} has nothing newer than {}", offset, watermark);
            continue;
        }

        let outcome = write_page(store, &new, config.cost_threshold).await?;
        info!(
            "Offset {}: {} new trades, {} qualifying, {} bets inserted",
            offset,
            new.len(),
            outcome.qualifying,
            outcome.bets_inserted
        );
        summary.add_page(&outcome);
    }

    summary.pages_fetched = paginator.pages_fetched();
    summary.stop_reason = paginator.stop_reason();
    info!("Ingestion finished, {}", summary);
    Ok(summary)
}

async fn write_page<D: TradeStore>(store: &D, new: &[&NormalizedTrade], threshold: f64) -> Result<PageOutcome> {
    let selected = select_qualifying(new, threshold);

    let mut tx = store.begin().await?;
    let fresh = unstored(&mut tx, &selected.insertable).await?;
    let keys = EntityKeys::collect(new, &fresh);
    let upserted = upsert_entities(&mut tx, &keys).await?;
    let ids = resolve_entities(&mut tx, &keys).await?;
    let rows = build_bet_rows(&fresh, &ids);
    let bets_inserted = write_bets(&mut tx, &rows.rows).await?;
    tx.commit().await?;

    Ok(PageOutcome {
        qualifying: selected.total(),
        bets_inserted,
        upserted,
    })
}
