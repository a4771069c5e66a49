use std::time::UNIX_EPOCH;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::db::TradeStore;
use crate::error::Result;

/// Resume point used when nothing has been persisted yet.
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::from(UNIX_EPOCH)
}

/// Event time of the newest stored bet, or [`epoch`] for an empty store.
pub async fn resolve_watermark<S: TradeStore>(store: &S) -> Result<DateTime<Utc>> {
    match store.latest_bet_time().await? {
        Some(latest) => {
            info!("Resuming after latest stored bet at {}", latest);
            Ok(latest)
        }
        None => {
            info!("No bets stored yet, starting from epoch");
            Ok(epoch())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::{NewBet, StoreTx};
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_empty_store_resolves_to_epoch() {
        let store = MemoryStore::new();
        assert_eq!(resolve_watermark(&store).await.unwrap().timestamp(), 0);
    }

    #[tokio::test]
    async fn test_latest_bet_wins() {
        let store = MemoryStore::new();
        let offset = chrono::FixedOffset::west_opt(8 * 3600).unwrap();

        let mut tx = store.begin().await.unwrap();
        let bets: Vec<NewBet> = [1_700_000_500, 1_700_000_900, 1_700_000_100]
            .iter()
            .enumerate()
            .map(|(i, ts)| NewBet {
                user_id: 1,
                wallet_id: 1,
                event_id: 1,
                bet_timestamp: offset.timestamp_opt(*ts, 0).unwrap(),
                cost: 1_000.0,
                transaction_hash: format!("0x{}", i),
                title: None,
                outcome: None,
                side: None,
                asset: None,
                condition_id: None,
                price: 0.5,
                size: 2_000.0,
            })
            .collect();
        tx.insert_bets(&bets).await.unwrap();
        tx.commit().await.unwrap();

        let watermark = resolve_watermark(&store).await.unwrap();
        assert_eq!(watermark, Utc.timestamp_opt(1_700_000_900, 0).unwrap());
    }
}
