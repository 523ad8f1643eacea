//! In-memory price source for offline runs and tests

use super::PriceSource;
use crate::error::{Result, TrackerError};
use crate::types::{PriceHistoryEntry, Period, Symbol};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct FixedPriceSource {
    prices: HashMap<Symbol, Decimal>,
    histories: HashMap<(Symbol, Period), Vec<PriceHistoryEntry>>,
}

impl FixedPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_prices(prices: impl IntoIterator<Item = (Symbol, Decimal)>) -> Self {
        Self {
            prices: prices.into_iter().collect(),
            histories: HashMap::new(),
        }
    }

    pub fn with_price(mut self, symbol: &str, price: Decimal) -> Self {
        self.prices.insert(Symbol::from(symbol), price);
        self
    }

    pub fn with_history(mut self, symbol: &str, period: Period, entries: Vec<PriceHistoryEntry>) -> Self {
        self.histories.insert((Symbol::from(symbol), period), entries);
        self
    }
}

#[async_trait]
impl PriceSource for FixedPriceSource {
    async fn fetch_price(&self, symbol: &Symbol) -> Result<Decimal> {
        self.prices
            .get(symbol)
            .copied()
            .ok_or_else(|| TrackerError::UnknownSymbol(symbol.clone()))
    }

    /// Known symbols without a recorded series get an empty history.
    async fn fetch_history(&self, symbol: &Symbol, period: Period) -> Result<Vec<PriceHistoryEntry>> {
        if let Some(entries) = self.histories.get(&(symbol.clone(), period)) {
            return Ok(entries.clone());
        }
        if self.prices.contains_key(symbol) {
            return Ok(Vec::new());
        }
        Err(TrackerError::UnknownSymbol(symbol.clone()))
    }

    async fn fetch_bulk(&self, symbols: &[Symbol]) -> Result<HashMap<Symbol, Decimal>> {
        Ok(symbols
            .iter()
            .filter_map(|s| self.prices.get(s).map(|p| (s.clone(), *p)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_unknown_symbol() {
        let source = FixedPriceSource::new().with_price("BTC", dec!(50000));
        let err = source.fetch_price(&Symbol::from("INVALID")).await.unwrap_err();
        assert!(matches!(err, TrackerError::UnknownSymbol(_)));
        assert!(source.fetch_history(&Symbol::from("INVALID"), Period::OneDay).await.is_err());
    }

    #[tokio::test]
    async fn test_bulk_omits_unknown() {
        let source = FixedPriceSource::new().with_price("btc", dec!(50000));
        let prices = source
            .fetch_bulk(&[Symbol::from("BTC"), Symbol::from("ETH")])
            .await
            .unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[&Symbol::from("BTC")], dec!(50000));
    }
}
