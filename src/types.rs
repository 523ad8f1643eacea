//! Core types for price tracking and alerting

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Normalized ticker identifier (trimmed, uppercase)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Symbol {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// One sampled point of a price series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCondition {
    Above,
    Below,
}

impl fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertCondition::Above => f.write_str("above"),
            AlertCondition::Below => f.write_str("below"),
        }
    }
}

impl FromStr for AlertCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "above" => Ok(AlertCondition::Above),
            "below" => Ok(AlertCondition::Below),
            other => Err(format!("unknown alert condition: {}", other)),
        }
    }
}

/// Threshold rule attached to one symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceAlert {
    pub threshold: Decimal,
    pub condition: AlertCondition,
}

impl PriceAlert {
    pub fn new(threshold: Decimal, condition: AlertCondition) -> Self {
        Self { threshold, condition }
    }

    /// Strict comparison: a price equal to the threshold never triggers.
    pub fn is_satisfied_by(&self, price: Decimal) -> bool {
        match self.condition {
            AlertCondition::Above => price > self.threshold,
            AlertCondition::Below => price < self.threshold,
        }
    }
}

/// Lookback window for price history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Period {
    #[default]
    OneDay,
    SevenDays,
    ThirtyDays,
    NinetyDays,
    OneYear,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::OneDay,
        Period::SevenDays,
        Period::ThirtyDays,
        Period::NinetyDays,
        Period::OneYear,
    ];

    /// Lookback window in calendar days
    pub fn days(&self) -> u32 {
        match self {
            Period::OneDay => 1,
            Period::SevenDays => 7,
            Period::ThirtyDays => 30,
            Period::NinetyDays => 90,
            Period::OneYear => 365,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::SevenDays => "7d",
            Period::ThirtyDays => "30d",
            Period::NinetyDays => "90d",
            Period::OneYear => "1y",
        }
    }
}

/// Unrecognized values fall back to `1d` rather than failing.
impl From<&str> for Period {
    fn from(raw: &str) -> Self {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == raw.trim().to_lowercase())
            .unwrap_or_default()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An alert that fired during a check pass
#[derive(Debug, Clone, PartialEq)]
pub struct TriggeredAlert {
    pub symbol: Symbol,
    pub alert: PriceAlert,
    pub price: Decimal,
}

impl TriggeredAlert {
    /// Notification text sent to every sink
    pub fn message(&self) -> String {
        format!(
            "🚨 Price alert: {} is {} {} (current price: {})",
            self.symbol, self.alert.condition, self.alert.threshold, self.price
        )
    }
}
