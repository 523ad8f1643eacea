//! CoinGecko public API client
//!
//! Spot and bulk prices come from `/simple/price`, history from
//! `/coins/{id}/market_chart`.

use super::PriceSource;
use crate::config::SourceConfig;
use crate::error::{Result, TrackerError};
use crate::types::{PriceHistoryEntry, Period, Symbol};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// `{"bitcoin": {"usd": 65000.0}}`
type SimplePriceResponse = HashMap<String, HashMap<String, Decimal>>;

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Vec<(f64, Decimal)>,
}

#[derive(Clone)]
pub struct CoinGeckoSource {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    vs_currency: String,
    coin_ids: HashMap<Symbol, String>,
}

impl CoinGeckoSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
            vs_currency: config.vs_currency.to_lowercase(),
            coin_ids: config
                .coin_ids
                .iter()
                .map(|(symbol, id)| (Symbol::from(symbol.as_str()), id.to_lowercase()))
                .collect(),
        })
    }

    /// CoinGecko addresses coins by id; fall back to the lowercase ticker
    fn coin_id(&self, symbol: &Symbol) -> String {
        self.coin_ids
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| symbol.as_str().to_lowercase())
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let req = self.http.get(url).header("Accept", "application/json");
        match &self.api_key {
            Some(key) => req.header("x-cg-demo-api-key", key),
            None => req,
        }
    }

    async fn simple_price(&self, ids: &[String]) -> Result<SimplePriceResponse> {
        let url = format!("{}/simple/price", self.base_url);
        let body = self
            .get(&url)
            .query(&[("ids", ids.join(",")), ("vs_currencies", self.vs_currency.clone())])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_simple_price(&body)
    }
}

/// Negative quotes are dropped, so they read as unresolved
fn parse_simple_price(body: &str) -> Result<SimplePriceResponse> {
    let mut prices: SimplePriceResponse = serde_json::from_str(body)?;
    for quotes in prices.values_mut() {
        quotes.retain(|_, price| !price.is_sign_negative());
    }
    Ok(prices)
}

fn parse_market_chart(body: &str) -> Result<Vec<PriceHistoryEntry>> {
    let chart: MarketChartResponse = serde_json::from_str(body)?;
    let mut entries: Vec<PriceHistoryEntry> = chart
        .prices
        .into_iter()
        .filter(|(_, price)| !price.is_sign_negative())
        .filter_map(|(ms, price)| {
            DateTime::<Utc>::from_timestamp_millis(ms as i64)
                .map(|timestamp| PriceHistoryEntry { timestamp, price })
        })
        .collect();
    entries.sort_by_key(|e| e.timestamp);
    Ok(entries)
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    async fn fetch_price(&self, symbol: &Symbol) -> Result<Decimal> {
        let id = self.coin_id(symbol);
        debug!("CoinGecko spot price for {} ({})", symbol, id);

        let prices = self.simple_price(&[id.clone()]).await?;
        prices
            .get(&id)
            .and_then(|quotes| quotes.get(&self.vs_currency))
            .copied()
            .ok_or_else(|| TrackerError::UnknownSymbol(symbol.clone()))
    }

    async fn fetch_history(&self, symbol: &Symbol, period: Period) -> Result<Vec<PriceHistoryEntry>> {
        let id = self.coin_id(symbol);
        debug!("CoinGecko history for {} over {}", symbol, period);

        let url = format!("{}/coins/{}/market_chart", self.base_url, id);
        let response = self
            .get(&url)
            .query(&[
                ("vs_currency", self.vs_currency.clone()),
                ("days", period.days().to_string()),
            ])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(TrackerError::UnknownSymbol(symbol.clone()));
        }

        let body = response.error_for_status()?.text().await?;
        parse_market_chart(&body)
    }

    async fn fetch_bulk(&self, symbols: &[Symbol]) -> Result<HashMap<Symbol, Decimal>> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<String> = symbols.iter().map(|s| self.coin_id(s)).collect();
        let prices = self.simple_price(&ids).await?;

        Ok(symbols
            .iter()
            .zip(ids.iter())
            .filter_map(|(symbol, id)| {
                let price = prices.get(id)?.get(&self.vs_currency)?;
                Some((symbol.clone(), *price))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_config() -> SourceConfig {
        let mut config = SourceConfig::default();
        config.coin_ids.insert("btc".to_string(), "Bitcoin".to_string());
        config
    }

    #[test]
    fn test_coin_id_override_and_fallback() {
        let source = CoinGeckoSource::new(&test_config()).unwrap();
        assert_eq!(source.coin_id(&Symbol::from("BTC")), "bitcoin");
        assert_eq!(source.coin_id(&Symbol::from("ethereum")), "ethereum");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let mut config = test_config();
        config.base_url = Some("http://localhost:9000/api/".to_string());
        let source = CoinGeckoSource::new(&config).unwrap();
        assert_eq!(source.base_url, "http://localhost:9000/api");
    }

    #[test]
    fn test_parse_simple_price() {
        let body = r#"{"bitcoin":{"usd":50000.5},"ethereum":{"usd":3000}}"#;
        let prices = parse_simple_price(body).unwrap();
        assert_eq!(prices["bitcoin"]["usd"], dec!(50000.5));
        assert_eq!(prices["ethereum"]["usd"], dec!(3000));
        assert!(!prices.contains_key("dogecoin"));
    }

    #[test]
    fn test_parse_simple_price_drops_negative() {
        let body = r#"{"bitcoin":{"usd":-1.5},"ethereum":{"usd":3000}}"#;
        let prices = parse_simple_price(body).unwrap();
        assert!(prices["bitcoin"].get("usd").is_none());
        assert_eq!(prices["ethereum"]["usd"], dec!(3000));
    }

    #[test]
    fn test_parse_simple_price_rejects_garbage() {
        let err = parse_simple_price("<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, TrackerError::Transport(_)));
    }

    #[test]
    fn test_parse_market_chart_sorted_and_normalized() {
        let body = r#"{
            "prices": [[1711022400000, 51000.0], [1710936000000, 50000.0], [1711108800000, -1.0]],
            "market_caps": [],
            "total_volumes": []
        }"#;
        let entries = parse_market_chart(body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].price, dec!(50000));
        assert_eq!(entries[1].price, dec!(51000));
        assert!(entries[0].timestamp < entries[1].timestamp);
    }

    #[test]
    fn test_parse_market_chart_empty() {
        let entries = parse_market_chart(r#"{"prices": []}"#).unwrap();
        assert!(entries.is_empty());
    }
}
