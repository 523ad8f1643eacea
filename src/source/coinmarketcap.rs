//! CoinMarketCap pro API client
//!
//! Requires an API key. Quotes use `skip_invalid=true` so one unknown ticker
//! does not fail a whole bulk request.

use super::PriceSource;
use crate::config::SourceConfig;
use crate::error::{Result, TrackerError};
use crate::types::{PriceHistoryEntry, Period, Symbol};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://pro-api.coinmarketcap.com";

#[derive(Debug, Deserialize)]
struct CmcStatus {
    error_code: i64,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    status: CmcStatus,
    #[serde(default)]
    data: HashMap<String, Vec<LatestEntry>>,
}

#[derive(Debug, Deserialize)]
struct LatestEntry {
    quote: HashMap<String, CmcQuote>,
}

#[derive(Debug, Deserialize)]
struct CmcQuote {
    price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct HistoricalResponse {
    status: CmcStatus,
    #[serde(default)]
    data: HashMap<String, Vec<HistoricalAsset>>,
}

#[derive(Debug, Deserialize)]
struct HistoricalAsset {
    #[serde(default)]
    quotes: Vec<HistoricalQuote>,
}

#[derive(Debug, Deserialize)]
struct HistoricalQuote {
    timestamp: DateTime<Utc>,
    quote: HashMap<String, CmcQuote>,
}

#[derive(Clone)]
pub struct CoinMarketCapSource {
    http: Client,
    base_url: String,
    api_key: String,
    convert: String,
}

impl CoinMarketCapSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| TrackerError::Config("coinmarketcap requires source.api_key".to_string()))?;

        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key,
            convert: config.vs_currency.to_uppercase(),
        })
    }

    async fn latest(&self, symbols: &[Symbol]) -> Result<HashMap<Symbol, Decimal>> {
        let joined = symbols.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(",");
        let url = format!("{}/v2/cryptocurrency/quotes/latest", self.base_url);
        let body = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .header("X-CMC_PRO_API_KEY", &self.api_key)
            .query(&[
                ("symbol", joined.as_str()),
                ("convert", self.convert.as_str()),
                ("skip_invalid", "true"),
            ])
            .send()
            .await?
            .text()
            .await?;

        parse_latest(&body, &self.convert)
    }
}

fn check_status(status: &CmcStatus) -> Result<()> {
    if status.error_code != 0 {
        let message = status.error_message.clone().unwrap_or_default();
        warn!("CoinMarketCap error {}: {}", status.error_code, message);
        return Err(TrackerError::Transport(format!(
            "coinmarketcap error {}: {}",
            status.error_code, message
        )));
    }
    Ok(())
}

fn parse_latest(body: &str, convert: &str) -> Result<HashMap<Symbol, Decimal>> {
    let resp: LatestResponse = serde_json::from_str(body)?;
    check_status(&resp.status)?;

    // A ticker can map to several listed assets; the first is the ranked one.
    Ok(resp
        .data
        .into_iter()
        .filter_map(|(symbol, entries)| {
            let price = entries.first()?.quote.get(convert)?.price?;
            (!price.is_sign_negative()).then(|| (Symbol::from(symbol), price))
        })
        .collect())
}

fn parse_historical(body: &str, symbol: &Symbol, convert: &str) -> Result<Vec<PriceHistoryEntry>> {
    let resp: HistoricalResponse = serde_json::from_str(body)?;
    check_status(&resp.status)?;

    let asset = resp
        .data
        .into_iter()
        .find(|(key, _)| Symbol::from(key.as_str()) == *symbol)
        .and_then(|(_, assets)| assets.into_iter().next())
        .ok_or_else(|| TrackerError::UnknownSymbol(symbol.clone()))?;

    let mut entries: Vec<PriceHistoryEntry> = asset
        .quotes
        .into_iter()
        .filter_map(|q| {
            let price = q.quote.get(convert)?.price?;
            (!price.is_sign_negative()).then_some(PriceHistoryEntry {
                timestamp: q.timestamp,
                price,
            })
        })
        .collect();
    entries.sort_by_key(|e| e.timestamp);
    Ok(entries)
}

#[async_trait]
impl PriceSource for CoinMarketCapSource {
    async fn fetch_price(&self, symbol: &Symbol) -> Result<Decimal> {
        debug!("CoinMarketCap spot price for {}", symbol);
        let prices = self.latest(std::slice::from_ref(symbol)).await?;
        prices
            .get(symbol)
            .copied()
            .ok_or_else(|| TrackerError::UnknownSymbol(symbol.clone()))
    }

    async fn fetch_history(&self, symbol: &Symbol, period: Period) -> Result<Vec<PriceHistoryEntry>> {
        debug!("CoinMarketCap history for {} over {}", symbol, period);

        let time_end = Utc::now();
        let time_start = time_end - Duration::days(period.days() as i64);
        let interval = match period {
            Period::OneDay => "hourly",
            _ => "daily",
        };

        let url = format!("{}/v2/cryptocurrency/quotes/historical", self.base_url);
        let body = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .header("X-CMC_PRO_API_KEY", &self.api_key)
            .query(&[
                ("symbol", symbol.as_str().to_string()),
                ("time_start", time_start.to_rfc3339()),
                ("time_end", time_end.to_rfc3339()),
                ("interval", interval.to_string()),
                ("convert", self.convert.clone()),
            ])
            .send()
            .await?
            .text()
            .await?;

        parse_historical(&body, symbol, &self.convert)
    }

    async fn fetch_bulk(&self, symbols: &[Symbol]) -> Result<HashMap<Symbol, Decimal>> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }
        let mut prices = self.latest(symbols).await?;
        prices.retain(|symbol, _| symbols.contains(symbol));
        Ok(prices)
    }
}
