//! Canned feed responses for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use super::models::RawTrade;
use super::traits::{PageResponse, TradeSource};
use crate::error::Result;

/// Replays responses in order and records every `(offset, limit)` asked for.
/// Once the script runs out every request gets an empty page.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    responses: Arc<Mutex<VecDeque<Result<PageResponse>>>>,
    calls: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl ScriptedSource {
    pub fn new(responses: Vec<Result<PageResponse>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<(u32, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TradeSource for ScriptedSource {
    async fn fetch_trades(&self, offset: u32, limit: u32) -> Result<PageResponse> {
        self.calls.lock().unwrap().push((offset, limit));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(PageResponse::Trades(Vec::new())))
    }
}

pub fn raw_trade(
    name: &str,
    wallet: &str,
    slug: &str,
    price: f64,
    size: f64,
    timestamp: i64,
    tx_hash: &str,
) -> RawTrade {
    serde_json::from_value(json!({
        "name": name,
        "proxyWallet": wallet,
        "eventSlug": slug,
        "price": price,
        "size": size,
        "timestamp": timestamp,
        "transactionHash": tx_hash,
        "title": format!("{} market", slug),
        "outcome": "Yes",
        "side": "BUY",
        "asset": "1234",
        "conditionId": "0xcondition",
        "icon": "https://example.com/icon.png"
    }))
    .unwrap()
}
