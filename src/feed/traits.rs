use async_trait::async_trait;

use crate::error::Result;
use crate::feed::models::RawTrade;

/// Outcome of a single page request that did not fail fatally.
#[derive(Debug, Clone, PartialEq)]
pub enum PageResponse {
    Trades(Vec<RawTrade>),
    /// Rate limited or upstream trouble; the same request may be retried.
    Transient(String),
}

/// A newest-first trades feed addressed by offset.
#[async_trait]
pub trait TradeSource: Send + Sync {
    async fn fetch_trades(&self, offset: u32, limit: u32) -> Result<PageResponse>;
}
