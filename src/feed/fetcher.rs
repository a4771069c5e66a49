//! Newest-first offset pagination over the trades feed.
//!
//! Each call to [`Paginator::next_page`] yields one page. Transient upstream
//! failures are retried at the same offset with capped exponential backoff
//! until they clear; anything else ends the run.

use std::fmt;

use chrono::{DateTime, Utc};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::models::RawTrade;
use super::traits::{PageResponse, TradeSource};
use crate::config::FeedConfig;
use crate::constants::{MAX_OFFSET, MAX_PAGE_SIZE};
use crate::error::Result;
use crate::normalize::utc_from_unix_seconds;
use crate::state::RateState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A page reached back to already persisted trades.
    WatermarkReached,
    MaxPages,
    /// The next offset is past what the upstream accepts.
    OffsetLimit,
    EmptyPage,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::WatermarkReached => "reached watermark",
            StopReason::MaxPages => "page limit reached",
            StopReason::OffsetLimit => "offset limit reached",
            StopReason::EmptyPage => "empty page",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub offset: u32,
    pub trades: Vec<RawTrade>,
    /// Transient failures absorbed before this page came through.
    pub retries: u32,
}

impl FetchedPage {
    pub fn oldest_timestamp(&self) -> Option<DateTime<Utc>> {
        oldest_timestamp(&self.trades)
    }
}

pub struct Paginator<S> {
    source: S,
    page_size: u32,
    max_pages: u32,
    watermark: DateTime<Utc>,
    rate: RateState,
    offset: u32,
    pages_fetched: u32,
    stop: Option<StopReason>,
}

impl<S: TradeSource> Paginator<S> {
    pub fn new(source: S, config: &FeedConfig, watermark: DateTime<Utc>) -> Self {
        Self {
            source,
            page_size: config.page_size.clamp(1, MAX_PAGE_SIZE),
            max_pages: config.max_pages,
            watermark,
            rate: RateState::new(config),
            offset: 0,
            pages_fetched: 0,
            stop: None,
        }
    }

    /// Fetches the next page, or `None` once any stop condition holds.
    ///
    /// A page whose oldest trade is at or before the watermark is still
    /// returned; the call after it yields `None`.
    pub async fn next_page(&mut self) -> Result<Option<FetchedPage>> {
        if self.stop.is_some() {
            return Ok(None);
        }
        if self.pages_fetched >= self.max_pages {
            return Ok(self.finish(StopReason::MaxPages));
        }
        if self.offset > MAX_OFFSET {
            return Ok(self.finish(StopReason::OffsetLimit));
        }

        let offset = self.offset;
        let (trades, retries) = self.fetch_with_retry(offset).await?;

        if trades.is_empty() {
            return Ok(self.finish(StopReason::EmptyPage));
        }

        self.pages_fetched += 1;
        let page = FetchedPage {
            offset,
            trades,
            retries,
        };

        if let Some(oldest) = page.oldest_timestamp() {
            if oldest <= self.watermark {
                debug!("Page at offset {} reaches back to {} (watermark {})", offset, oldest, self.watermark);
                self.stop = Some(StopReason::WatermarkReached);
            }
        }

        self.offset = offset.saturating_add(self.page_size);
        Ok(Some(page))
    }

    async fn fetch_with_retry(&mut self, offset: u32) -> Result<(Vec<RawTrade>, u32)> {
        let mut retries = 0;

        loop {
            sleep(self.rate.pacing_delay()).await;

            match self.source.fetch_trades(offset, self.page_size).await? {
                PageResponse::Trades(trades) => {
                    self.rate.record_success();
                    return Ok((trades, retries));
                }
                PageResponse::Transient(reason) => {
                    retries += 1;
                    let backoff = self.rate.record_failure();
                    warn!(
                        "Transient failure at offset {} ({}), attempt {}, retrying in {:?}",
                        offset, reason, retries, backoff
                    );
                    sleep(backoff).await;
                }
            }
        }
    }

    fn finish(&mut self, reason: StopReason) -> Option<FetchedPage> {
        info!("Stopping pagination at offset {}: {}", self.offset, reason);
        self.stop = Some(reason);
        None
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn watermark(&self) -> DateTime<Utc> {
        self.watermark
    }
}

fn oldest_timestamp(trades: &[RawTrade]) -> Option<DateTime<Utc>> {
    trades
        .iter()
        .filter_map(|t| t.unix_seconds().and_then(utc_from_unix_seconds))
        .min()
}
