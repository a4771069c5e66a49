pub mod app;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod export;
pub mod feed;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
