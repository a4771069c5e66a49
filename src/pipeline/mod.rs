pub mod bets;
pub mod ingest;
pub mod upsert;
pub mod watermark;

pub use ingest::{ingest, IngestSummary};
pub use watermark::resolve_watermark;
