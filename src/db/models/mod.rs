pub mod bets;
pub mod events;
pub mod users;
pub mod wallets;
