//! Users, wallets and events: idempotent insert, then id lookup.

use std::collections::{BTreeSet, HashMap};

use crate::db::{EntityKind, StoreTx};
use crate::error::Result;
use crate::normalize::NormalizedTrade;

/// Distinct natural keys touched by one page, sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityKeys {
    pub users: Vec<String>,
    pub wallets: Vec<String>,
    pub events: Vec<String>,
}

impl EntityKeys {
    /// Users and wallets come from every new trade; events only from
    /// trades that will be written as bets.
    pub fn collect(new: &[&NormalizedTrade], qualifying: &[&NormalizedTrade]) -> Self {
        Self {
            users: distinct(new.iter().map(|t| t.name.as_str())),
            wallets: distinct(new.iter().map(|t| t.wallet_address.as_str())),
            events: distinct(qualifying.iter().map(|t| t.event_slug.as_str())),
        }
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertCounts {
    pub users: u64,
    pub wallets: u64,
    pub events: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedIds {
    pub users: HashMap<String, i64>,
    pub wallets: HashMap<String, i64>,
    pub events: HashMap<String, i64>,
}

/// Inserts missing users, wallets and events, in that order.
pub async fn upsert_entities<T: StoreTx>(tx: &mut T, keys: &EntityKeys) -> Result<UpsertCounts> {
    let users = tx.upsert_users(&keys.users).await?;
    let wallets = tx.upsert_wallets(&keys.wallets).await?;
    let events = if keys.events.is_empty() {
        0
    } else {
        tx.upsert_events(&keys.events).await?
    };

    Ok(UpsertCounts { users, wallets, events })
}

/// Looks up surrogate ids for every key. Must run after
/// [`upsert_entities`] in the same transaction.
pub async fn resolve_entities<T: StoreTx>(tx: &mut T, keys: &EntityKeys) -> Result<ResolvedIds> {
    Ok(ResolvedIds {
        users: resolve(tx, EntityKind::User, &keys.users).await?,
        wallets: resolve(tx, EntityKind::Wallet, &keys.wallets).await?,
        events: resolve(tx, EntityKind::Event, &keys.events).await?,
    })
}

async fn resolve<T: StoreTx>(tx: &mut T, kind: EntityKind, keys: &[String]) -> Result<HashMap<String, i64>> {
    if keys.is_empty() {
        return Ok(HashMap::new());
    }
    tx.resolve_ids(kind, keys).await
}
