//! Crypto Portfolio Tracker
//!
//! Tracks asset prices through a pluggable price source and fans triggered
//! price alerts out to pluggable sinks.
//!
//! ## Architecture
//!
//! ```text
//! PriceSource (CoinGecko/CMC/fixed) → PortfolioTracker → AlertSink (log/Telegram/webhook)
//!                                            ↓
//!                                          Report
//! ```

pub mod config;
pub mod error;
pub mod notify;
pub mod report;
pub mod source;
pub mod tracker;
pub mod types;

pub use error::{Result, TrackerError};
pub use tracker::PortfolioTracker;
