//! Storage seam for the ingestion pipeline.
//!
//! A [`TradeStore`] hands out transactions; everything a page writes goes
//! through one [`StoreTx`] and becomes visible on `commit`. Dropping a
//! transaction without committing discards its writes.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};

use crate::error::Result;

/// The reference entities addressed by natural key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    User,
    Wallet,
    Event,
}

impl EntityKind {
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Wallet => "wallets",
            EntityKind::Event => "events",
        }
    }

    pub fn natural_key_column(&self) -> &'static str {
        match self {
            EntityKind::User => "display_name",
            EntityKind::Wallet => "wallet_address",
            EntityKind::Event => "event_slug",
        }
    }

    pub fn surrogate_column(&self) -> &'static str {
        match self {
            EntityKind::User => "user_id",
            EntityKind::Wallet => "wallet_id",
            EntityKind::Event => "event_id",
        }
    }
}

/// A bet ready for insertion, with every reference resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBet {
    pub user_id: i64,
    pub wallet_id: i64,
    pub event_id: i64,
    pub bet_timestamp: DateTime<FixedOffset>,
    pub cost: f64,
    pub transaction_hash: String,
    pub title: Option<String>,
    pub outcome: Option<String>,
    pub side: Option<String>,
    pub asset: Option<String>,
    pub condition_id: Option<String>,
    pub price: f64,
    pub size: f64,
}

#[async_trait]
pub trait TradeStore: Send + Sync {
    type Tx: StoreTx;

    /// Event time of the most recent persisted bet.
    async fn latest_bet_time(&self) -> Result<Option<DateTime<Utc>>>;

    async fn begin(&self) -> Result<Self::Tx>;
}

#[async_trait]
pub trait StoreTx: Send {
    /// Inserts any keys not yet present; existing rows are left alone.
    /// Returns the number of rows actually created.
    async fn upsert(&mut self, kind: EntityKind, keys: &[String]) -> Result<u64>;

    /// Maps each stored key to its surrogate id. Keys not in the store are
    /// absent from the result.
    async fn resolve_ids(&mut self, kind: EntityKind, keys: &[String]) -> Result<HashMap<String, i64>>;

    /// The subset of `hashes` already stored as bets.
    async fn stored_hashes(&mut self, hashes: &[String]) -> Result<HashSet<String>>;

    /// Inserts bets, skipping any whose transaction hash is already stored.
    async fn insert_bets(&mut self, bets: &[NewBet]) -> Result<u64>;

    async fn commit(self) -> Result<()>;

    async fn upsert_users(&mut self, names: &[String]) -> Result<u64> {
        self.upsert(EntityKind::User, names).await
    }

    async fn upsert_wallets(&mut self, addresses: &[String]) -> Result<u64> {
        self.upsert(EntityKind::Wallet, addresses).await
    }

    async fn upsert_events(&mut self, slugs: &[String]) -> Result<u64> {
        self.upsert(EntityKind::Event, slugs).await
    }
}
