pub mod client;
pub mod fetcher;
pub mod models;
#[cfg(test)]
pub mod scripted;
pub mod traits;

pub use client::TradesApi;
pub use fetcher::{FetchedPage, Paginator, StopReason};
pub use models::RawTrade;
pub use traits::{PageResponse, TradeSource};
