pub mod main;
#[cfg(test)]
pub mod memory;
pub mod models;
pub mod store;

pub use main::{Db, PgTx};
pub use store::{EntityKind, NewBet, StoreTx, TradeStore};
