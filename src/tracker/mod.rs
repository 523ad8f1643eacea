//! Portfolio tracker
//!
//! Owns the tracked symbols and their alert rules. Prices come from an
//! injected [`PriceSource`]; triggered alerts are fanned out to every
//! registered [`AlertSink`].
//!
//! Mutations take `&mut self`: one control flow owns a tracker at a time.


use crate::config::Config;
use crate::error::{Result, TrackerError};
use crate::notify::{self, AlertSink};
use crate::source::{self, PriceSource};
use crate::types::{AlertCondition, PriceAlert, PriceHistoryEntry, Period, Symbol, TriggeredAlert};
use futures_util::future::join_all;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct PortfolioTracker {
    symbols: Vec<Symbol>,
    alerts: HashMap<Symbol, Vec<PriceAlert>>,
    source: Arc<dyn PriceSource>,
    sinks: Vec<Arc<dyn AlertSink>>,
}

impl PortfolioTracker {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self {
            symbols: Vec::new(),
            alerts: HashMap::new(),
            source,
            sinks: Vec::new(),
        }
    }

    /// Tracker wired with the configured source, sinks, symbols and alerts
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut tracker = Self::new(source::from_config(&config.source)?);

        for symbol in config.tracked_symbols() {
            tracker.add_symbol(symbol);
        }
        for rule in &config.tracker.alerts {
            tracker.set_alert(rule.symbol.as_str(), rule.threshold, rule.condition);
        }
        for sink in notify::from_config(config)? {
            tracker.add_notifier(sink);
        }

        info!(
            "Tracker ready: {} symbol(s), {} alert rule(s), {} sink(s)",
            tracker.symbols.len(),
            config.tracker.alerts.len(),
            tracker.sinks.len()
        );
        Ok(tracker)
    }

    // ==================== Tracked symbols ====================

    pub fn add_symbol(&mut self, symbol: impl Into<Symbol>) {
        let symbol = symbol.into();
        if !self.symbols.contains(&symbol) {
            debug!("Tracking {}", symbol);
            self.symbols.push(symbol);
        }
    }

    pub fn remove_symbol(&mut self, symbol: impl Into<Symbol>) {
        let symbol = symbol.into();
        self.symbols.retain(|s| *s != symbol);
    }

    /// Tracked symbols in insertion order
    pub fn list_symbols(&self) -> Vec<Symbol> {
        self.symbols.clone()
    }

    // ==================== Prices ====================

    pub async fn current_price(&self, symbol: impl Into<Symbol>) -> Result<Decimal> {
        self.source.fetch_price(&symbol.into()).await
    }

    /// Unrecognized period strings fall back to `1d`.
    pub async fn price_history(
        &self,
        symbol: impl Into<Symbol>,
        period: impl Into<Period>,
    ) -> Result<Vec<PriceHistoryEntry>> {
        self.source.fetch_history(&symbol.into(), period.into()).await
    }

    /// Percentage change from `old_price` to `new_price`
    pub fn price_change_percent(old_price: Decimal, new_price: Decimal) -> Result<Decimal> {
        if old_price.is_zero() {
            return Err(TrackerError::DivisionByZero);
        }
        new_price
            .checked_sub(old_price)
            .and_then(|delta| delta.checked_div(old_price))
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or(TrackerError::Overflow("price change percent"))
    }

    /// Prices for every tracked symbol the source could resolve
    pub async fn all_current_prices(&self) -> Result<HashMap<Symbol, Decimal>> {
        let symbols = self.list_symbols();
        let mut prices = self.source.fetch_bulk(&symbols).await?;
        prices.retain(|symbol, _| symbols.contains(symbol));

        if prices.len() < symbols.len() {
            let missing: Vec<&str> = symbols
                .iter()
                .filter(|s| !prices.contains_key(*s))
                .map(|s| s.as_str())
                .collect();
            debug!("No price for: {}", missing.join(", "));
        }
        Ok(prices)
    }

    /// Mean price over `period`; zero for an empty history
    pub async fn average_price(&self, symbol: impl Into<Symbol>, period: impl Into<Period>) -> Result<Decimal> {
        let history = self.price_history(symbol, period).await?;
        if history.is_empty() {
            return Ok(Decimal::ZERO);
        }
        history
            .iter()
            .try_fold(Decimal::ZERO, |acc, e| acc.checked_add(e.price))
            .and_then(|total| total.checked_div(Decimal::from(history.len())))
            .ok_or(TrackerError::Overflow("average price"))
    }

    // ==================== Alerts ====================

    /// Append an alert. Duplicates are kept.
    pub fn set_alert(&mut self, symbol: impl Into<Symbol>, threshold: Decimal, condition: AlertCondition) {
        self.alerts
            .entry(symbol.into())
            .or_default()
            .push(PriceAlert::new(threshold, condition));
    }

    /// Remove every alert matching both threshold and condition
    pub fn remove_alert(&mut self, symbol: impl Into<Symbol>, threshold: Decimal, condition: AlertCondition) {
        let symbol = symbol.into();
        let target = PriceAlert::new(threshold, condition);
        if let Some(alerts) = self.alerts.get_mut(&symbol) {
            alerts.retain(|a| *a != target);
            if alerts.is_empty() {
                self.alerts.remove(&symbol);
            }
        }
    }

    pub fn get_alerts(&self, symbol: impl Into<Symbol>) -> Vec<PriceAlert> {
        self.alerts.get(&symbol.into()).cloned().unwrap_or_default()
    }

    pub fn get_alerts_by_condition(&self, symbol: impl Into<Symbol>, condition: AlertCondition) -> Vec<PriceAlert> {
        self.get_alerts(symbol)
            .into_iter()
            .filter(|a| a.condition == condition)
            .collect()
    }

    pub fn clear_alerts(&mut self, symbol: impl Into<Symbol>) {
        self.alerts.remove(&symbol.into());
    }

    /// True if any alert on `symbol` is satisfied by `current_price`
    pub fn is_alert_triggered(&self, symbol: impl Into<Symbol>, current_price: Decimal) -> bool {
        self.alerts
            .get(&symbol.into())
            .is_some_and(|alerts| alerts.iter().any(|a| a.is_satisfied_by(current_price)))
    }

    fn triggered_alerts(&self, prices: &HashMap<Symbol, Decimal>) -> Vec<TriggeredAlert> {
        self.symbols
            .iter()
            .filter_map(|symbol| prices.get(symbol).map(|price| (symbol, *price)))
            .filter(|(symbol, price)| self.is_alert_triggered((*symbol).clone(), *price))
            .flat_map(|(symbol, price)| {
                self.alerts
                    .get(symbol)
                    .into_iter()
                    .flatten()
                    .filter(move |a| a.is_satisfied_by(price))
                    .map(move |alert| TriggeredAlert {
                        symbol: symbol.clone(),
                        alert: *alert,
                        price,
                    })
            })
            .collect()
    }

    /// Fetch prices, evaluate alerts and notify every sink.
    ///
    /// Symbols without a price in the bulk result are skipped. Every
    /// notification is attempted before returning; the first sink failure is
    /// then reported as [`TrackerError::NotificationFailure`].
    pub async fn check_alerts(&self) -> Result<Vec<TriggeredAlert>> {
        let prices = self.all_current_prices().await?;
        let triggered = self.triggered_alerts(&prices);

        if triggered.is_empty() {
            debug!("No alerts triggered across {} prices", prices.len());
            return Ok(triggered);
        }
        info!(
            "{} alert(s) triggered, notifying {} sink(s)",
            triggered.len(),
            self.sinks.len()
        );

        let messages: Vec<String> = triggered.iter().map(|t| t.message()).collect();
        let dispatches = messages.iter().flat_map(|message| {
            self.sinks.iter().map(move |sink| async move {
                sink.notify(message)
                    .await
                    .map_err(|e| (sink.name().to_string(), e))
            })
        });

        let results = join_all(dispatches).await;

        let mut first_failure = None;
        for (sink, err) in results.into_iter().filter_map(|r| r.err()) {
            warn!("Alert sink {} failed: {}", sink, err);
            first_failure.get_or_insert(TrackerError::NotificationFailure {
                sink,
                reason: err.to_string(),
            });
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(triggered),
        }
    }

    /// Register a sink. There is no removal operation.
    pub fn add_notifier(&mut self, sink: Arc<dyn AlertSink>) {
        debug!("Registered alert sink {}", sink.name());
        self.sinks.push(sink);
    }

    pub fn notifier_count(&self) -> usize {
        self.sinks.len()
    }
}
