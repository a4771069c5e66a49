//! Qualifying-bet selection and insertion.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::upsert::ResolvedIds;
use crate::db::{NewBet, StoreTx};
use crate::error::Result;
use crate::normalize::NormalizedTrade;

/// Trades strictly newer than the watermark.
pub fn select_new(records: &[NormalizedTrade], watermark: DateTime<Utc>) -> Vec<&NormalizedTrade> {
    records.iter().filter(|t| t.event_time_utc > watermark).collect()
}

/// Threshold is inclusive.
pub fn is_qualifying(trade: &NormalizedTrade, threshold: f64) -> bool {
    trade.cost >= threshold
}

/// Qualifying trades split by whether they can be keyed for dedup.
#[derive(Debug, Default)]
pub struct Qualifying<'a> {
    pub insertable: Vec<&'a NormalizedTrade>,
    /// No transaction hash, so no way to insert idempotently.
    pub unhashed: usize,
    /// Repeats of a hash already selected on this page.
    pub duplicates: usize,
}

impl Qualifying<'_> {
    pub fn total(&self) -> usize {
        self.insertable.len() + self.unhashed + self.duplicates
    }
}

/// Qualifying trades with at most one trade per transaction hash; the first
/// occurrence wins.
pub fn select_qualifying<'a>(new: &[&'a NormalizedTrade], threshold: f64) -> Qualifying<'a> {
    let mut selected = Qualifying::default();
    let mut seen = HashSet::new();
    for trade in new.iter().copied().filter(|t| is_qualifying(t, threshold)) {
        if let Some(hash) = trade.transaction_hash.as_deref() {
            if seen.insert(hash) {
                selected.insertable.push(trade);
            } else {
                debug!("Duplicate transaction hash {} on page, keeping the first", hash);
                selected.duplicates += 1;
            }
        } else {
            warn!(
                "Skipping qualifying trade by {} on {} at {}: no transaction hash",
                trade.name, trade.event_slug, trade.event_time_utc
            );
            selected.unhashed += 1;
        }
    }
    selected
}

#[derive(Debug, Default)]
pub struct BetRows {
    pub rows: Vec<NewBet>,
    /// Trades dropped because a user, wallet or event id was missing.
    pub unresolved: usize,
}

/// Joins qualifying trades to their resolved ids.
///
/// A missing id means the upsert and the lookup disagree, which should not
/// happen inside one transaction; such trades are logged and left out.
pub fn build_bet_rows(qualifying: &[&NormalizedTrade], ids: &ResolvedIds) -> BetRows {
    let mut out = BetRows::default();

    for trade in qualifying {
        let Some(transaction_hash) = trade.transaction_hash.clone() else {
            continue;
        };

        let resolved = (
            ids.users.get(&trade.name),
            ids.wallets.get(&trade.wallet_address),
            ids.events.get(&trade.event_slug),
        );

        let (Some(&user_id), Some(&wallet_id), Some(&event_id)) = resolved else {
            warn!(
                "Unresolved ids for bet {} (user {:?}, wallet {:?}, event {:?}), skipping",
                transaction_hash, resolved.0, resolved.1, resolved.2
            );
            out.unresolved += 1;
            continue;
        };

        out.rows.push(NewBet {
            user_id,
            wallet_id,
            event_id,
            bet_timestamp: trade.event_time_local,
            cost: trade.cost,
            transaction_hash,
            title: trade.title.clone(),
            outcome: trade.outcome.clone(),
            side: trade.side.clone(),
            asset: trade.asset.clone(),
            condition_id: trade.condition_id.clone(),
            price: trade.price,
            size: trade.size,
        });
    }

    out
}

/// Drops trades whose hash is already stored, so no entity gets created
/// for a bet that will not be written.
pub async fn unstored<'a, T: StoreTx>(tx: &mut T, trades: &[&'a NormalizedTrade]) -> Result<Vec<&'a NormalizedTrade>> {
    let hashes: Vec<String> = trades.iter().filter_map(|t| t.transaction_hash.clone()).collect();
    if hashes.is_empty() {
        return Ok(trades.to_vec());
    }

    let stored = tx.stored_hashes(&hashes).await?;
    Ok(trades
        .iter()
        .copied()
        .filter(|t| t.transaction_hash.as_ref().map_or(true, |h| !stored.contains(h)))
        .collect())
}

/// Inserts the rows; those whose hash is already stored are skipped.
pub async fn write_bets<T: StoreTx>(tx: &mut T, rows: &[NewBet]) -> Result<u64> {
    if rows.is_empty() {
        return Ok(0);
    }
    tx.insert_bets(rows).await
}
