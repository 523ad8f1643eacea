//! Price sources
//!
//! Every provider decodes its own payloads into private serde structs and
//! hands the tracker plain `Decimal` prices and `PriceHistoryEntry` series.

mod coingecko;
mod coinmarketcap;
mod fixed;

pub use coingecko::CoinGeckoSource;
pub use coinmarketcap::CoinMarketCapSource;
pub use fixed::FixedPriceSource;

use crate::config::{ProviderKind, SourceConfig};
use crate::error::Result;
use crate::types::{PriceHistoryEntry, Period, Symbol};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

/// Provider of spot, historical and bulk prices
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Spot price; `UnknownSymbol` when the provider does not know the symbol
    async fn fetch_price(&self, symbol: &Symbol) -> Result<Decimal>;

    /// Chronologically ordered series covering `period`
    async fn fetch_history(&self, symbol: &Symbol, period: Period) -> Result<Vec<PriceHistoryEntry>>;

    /// Best effort: unresolved symbols are left out of the map
    async fn fetch_bulk(&self, symbols: &[Symbol]) -> Result<HashMap<Symbol, Decimal>>;
}

/// Build the configured provider
pub fn from_config(config: &SourceConfig) -> Result<Arc<dyn PriceSource>> {
    let source: Arc<dyn PriceSource> = match config.provider {
        ProviderKind::CoinGecko => Arc::new(CoinGeckoSource::new(config)?),
        ProviderKind::CoinMarketCap => Arc::new(CoinMarketCapSource::new(config)?),
        ProviderKind::Fixed => Arc::new(FixedPriceSource::from_prices(
            config
                .fixed_prices
                .iter()
                .map(|(symbol, price)| (Symbol::from(symbol.as_str()), *price)),
        )),
    };
    tracing::debug!("Price source initialized: {:?}", config.provider);
    Ok(source)
}
