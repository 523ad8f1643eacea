//! Configuration
//!
//! Built once at startup from an optional TOML file layered with `TRACKER__*`
//! environment variables, then passed down explicitly.

use crate::error::{Result, TrackerError};
use crate::types::{AlertCondition, Symbol};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub source: SourceConfig,
    pub telegram: Option<TelegramConfig>,
    pub webhook: Option<WebhookConfig>,
    /// Register the tracing sink
    #[serde(default = "default_true")]
    pub log_alerts: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub alerts: Vec<AlertRule>,
}

/// Alert registered at startup
#[derive(Debug, Clone, Deserialize)]
pub struct AlertRule {
    pub symbol: String,
    pub threshold: Decimal,
    pub condition: AlertCondition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    CoinGecko,
    CoinMarketCap,
    Fixed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_vs_currency")]
    pub vs_currency: String,
    /// Ticker -> provider coin id (e.g. BTC = "bitcoin")
    #[serde(default)]
    pub coin_ids: HashMap<String, String>,
    /// Prices served by the `fixed` provider
    #[serde(default)]
    pub fixed_prices: HashMap<String, Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    60
}

fn default_timeout() -> u64 {
    30
}

fn default_vs_currency() -> String {
    "usd".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            source: SourceConfig::default(),
            telegram: None,
            webhook: None,
            log_alerts: true,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            poll_interval_secs: default_poll_interval(),
            alerts: Vec::new(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: None,
            api_key: None,
            timeout_secs: default_timeout(),
            vs_currency: default_vs_currency(),
            coin_ids: HashMap::new(),
            fixed_prices: HashMap::new(),
        }
    }
}

impl Config {
    /// Load from `path` (optional) and the environment
    pub fn load(path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("TRACKER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tracker.poll_interval_secs == 0 {
            return Err(TrackerError::Config("tracker.poll_interval_secs must be > 0".to_string()));
        }
        match self.source.provider {
            ProviderKind::CoinMarketCap if self.source.api_key.is_none() => {
                return Err(TrackerError::Config(
                    "source.api_key is required for coinmarketcap".to_string(),
                ));
            }
            ProviderKind::Fixed if self.source.fixed_prices.is_empty() => {
                return Err(TrackerError::Config(
                    "source.fixed_prices is required for the fixed provider".to_string(),
                ));
            }
            _ => {}
        }
        if let Some(rule) = self.tracker.alerts.iter().find(|r| r.symbol.trim().is_empty()) {
            return Err(TrackerError::Config(format!(
                "alert with threshold {} has an empty symbol",
                rule.threshold
            )));
        }
        Ok(())
    }

    /// Configured symbols, normalized; alert symbols are tracked too
    pub fn tracked_symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = Vec::new();
        let configured = self.tracker.symbols.iter().map(|s| s.as_str());
        let from_alerts = self.tracker.alerts.iter().map(|r| r.symbol.as_str());
        for symbol in configured.chain(from_alerts).map(Symbol::from) {
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
        symbols
    }
}
