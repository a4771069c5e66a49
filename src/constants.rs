pub const TRADES_API_URL: &str = "https://data-api.polymarket.com/trades";

/// Highest `offset` the trades endpoint accepts.
pub const MAX_OFFSET: u32 = 10_000;

/// Largest `limit` the trades endpoint honors in practice.
pub const MAX_PAGE_SIZE: u32 = 10_000;

/// Database schema holding the four ingestion tables.
pub const DB_SCHEMA: &str = "pm";

/// Rows per bulk insert statement. Bets have 13 columns, so this stays
/// far below the Postgres bind parameter limit.
pub const INSERT_CHUNK_SIZE: usize = 1000;

/// Payload fields with no use downstream.
pub const DROPPED_FIELDS: &[&str] = &[
    "slug",
    "icon",
    "outcomeIndex",
    "pseudonym",
    "bio",
    "profileImage",
    "profileImageOptimized",
];

/// Fields a batch must carry for normalization to proceed.
pub const REQUIRED_FIELDS: &[&str] = &["name", "proxyWallet", "eventSlug", "price", "size", "timestamp"];

pub mod defaults {
    pub const PAGE_SIZE: u32 = 500;
    pub const SLEEP_BASE_MS: u64 = 150;
    pub const SLEEP_JITTER_MS: u64 = 150;
    pub const BACKOFF_INITIAL_MS: u64 = 1_000;
    pub const BACKOFF_MAX_MS: u64 = 60_000;
    pub const MAX_PAGES: u32 = 21;
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    pub const COST_THRESHOLD: f64 = 750.0;
    pub const LOCAL_TZ: &str = "America/Los_Angeles";
    pub const DB_PORT: u16 = 5432;
    pub const DB_MAX_CONNECTIONS: u32 = 5;
    pub const LOG_LEVEL: &str = "info";
}
