//! In-process store with the same unique-key behavior as the Postgres one.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::store::{EntityKind, NewBet, StoreTx, TradeStore};
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub entities: HashMap<EntityKind, BTreeMap<String, i64>>,
    pub bets: Vec<NewBet>,
    next_id: i64,
}

impl Tables {
    pub fn keys(&self, kind: EntityKind) -> Vec<String> {
        self.entities
            .get(&kind)
            .map(|rows| rows.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn id_of(&self, kind: EntityKind, key: &str) -> Option<i64> {
        self.entities.get(&kind)?.get(key).copied()
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed state.
    pub fn snapshot(&self) -> Tables {
        self.tables.lock().unwrap().clone()
    }
}

#[async_trait]
impl TradeStore for MemoryStore {
    type Tx = MemoryTx;

    async fn latest_bet_time(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .bets
            .iter()
            .map(|b| b.bet_timestamp.with_timezone(&Utc))
            .max())
    }

    async fn begin(&self) -> Result<MemoryTx> {
        Ok(MemoryTx {
            store: self.tables.clone(),
            staged: self.snapshot(),
        })
    }
}

pub struct MemoryTx {
    store: Arc<Mutex<Tables>>,
    staged: Tables,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn upsert(&mut self, kind: EntityKind, keys: &[String]) -> Result<u64> {
        let mut inserted = 0;
        for key in keys {
            let next_id = self.staged.next_id + 1;
            let rows = self.staged.entities.entry(kind).or_default();
            if !rows.contains_key(key) {
                rows.insert(key.clone(), next_id);
                self.staged.next_id = next_id;
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn resolve_ids(&mut self, kind: EntityKind, keys: &[String]) -> Result<HashMap<String, i64>> {
        Ok(keys
            .iter()
            .filter_map(|k| self.staged.id_of(kind, k).map(|id| (k.clone(), id)))
            .collect())
    }

    async fn stored_hashes(&mut self, hashes: &[String]) -> Result<HashSet<String>> {
        Ok(hashes
            .iter()
            .filter(|h| self.staged.bets.iter().any(|b| &b.transaction_hash == *h))
            .cloned()
            .collect())
    }

    async fn insert_bets(&mut self, bets: &[NewBet]) -> Result<u64> {
        let mut inserted = 0;
        for bet in bets {
            if !self.staged.bets.iter().any(|b| b.transaction_hash == bet.transaction_hash) {
                self.staged.bets.push(bet.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn commit(self) -> Result<()> {
        *self.store.lock().unwrap() = self.staged;
        Ok(())
    }
}
