//! Plain-text portfolio report

use crate::tracker::PortfolioTracker;
use crate::types::{Period, PriceHistoryEntry, Symbol};
use chrono::Duration;
use rust_decimal::Decimal;
use std::fmt::Write;

struct ChangeWindow {
    label: &'static str,
    period: Period,
    /// Only entries this many hours before the newest one count as the base;
    /// `None` takes the oldest entry of the period.
    lookback_hours: Option<i64>,
}

const CHANGE_WINDOWS: &[ChangeWindow] = &[
    ChangeWindow { label: "1 hour", period: Period::OneDay, lookback_hours: Some(1) },
    ChangeWindow { label: "24 hours", period: Period::OneDay, lookback_hours: None },
    ChangeWindow { label: "7 days", period: Period::SevenDays, lookback_hours: None },
    ChangeWindow { label: "30 days", period: Period::ThirtyDays, lookback_hours: None },
];

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolReport {
    pub symbol: Symbol,
    pub price: Option<Decimal>,
    /// Percent change per window label; `None` when there is no usable base price
    pub changes: Vec<(&'static str, Option<Decimal>)>,
}

/// Gather current price and windowed changes for every tracked symbol
pub async fn collect(tracker: &PortfolioTracker) -> Vec<SymbolReport> {
    let mut reports = Vec::new();

    for symbol in tracker.list_symbols() {
        let price = match tracker.current_price(symbol.clone()).await {
            Ok(price) => Some(price),
            Err(e) => {
                tracing::warn!("Report: no price for {}: {}", symbol, e);
                None
            }
        };

        let mut changes = Vec::with_capacity(CHANGE_WINDOWS.len());
        for window in CHANGE_WINDOWS {
            let change = match price {
                Some(current) => window_change(tracker, &symbol, window, current).await,
                None => None,
            };
            changes.push((window.label, change));
        }

        reports.push(SymbolReport { symbol, price, changes });
    }

    reports
}

async fn window_change(
    tracker: &PortfolioTracker,
    symbol: &Symbol,
    window: &ChangeWindow,
    current: Decimal,
) -> Option<Decimal> {
    let history = tracker.price_history(symbol.clone(), window.period).await.ok()?;
    let base = base_price(&history, window.lookback_hours)?;
    PortfolioTracker::price_change_percent(base, current).ok()
}

/// Oldest price inside the lookback, measured back from the newest entry
fn base_price(history: &[PriceHistoryEntry], lookback_hours: Option<i64>) -> Option<Decimal> {
    let Some(hours) = lookback_hours else {
        return history.first().map(|e| e.price);
    };
    let cutoff = history.last()?.timestamp - Duration::hours(hours);
    history.iter().find(|e| e.timestamp >= cutoff).map(|e| e.price)
}

pub fn render(reports: &[SymbolReport]) -> String {
    if reports.is_empty() {
        return "No symbols tracked.\n".to_string();
    }

    let mut out = String::new();
    for report in reports {
        let _ = writeln!(out, "{}:", report.symbol);
        match report.price {
            Some(price) => {
                let _ = writeln!(out, "Current Price: ${:.2}", price);
            }
            None => {
                let _ = writeln!(out, "Current Price: unavailable");
            }
        }
        for (label, change) in &report.changes {
            match change {
                Some(pct) => {
                    let _ = writeln!(out, "Percent Change ({}): {:.2}%", label, pct);
                }
                None => {
                    let _ = writeln!(out, "Percent Change ({}): n/a", label);
                }
            }
        }
        out.push('\n');
    }
    out
}

/// Collect and render in one call
pub async fn build_report(tracker: &PortfolioTracker) -> String {
    render(&collect(tracker).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FixedPriceSource;
    use crate::types::PriceHistoryEntry;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn entry(price: Decimal) -> PriceHistoryEntry {
        entry_at(0, price)
    }

    fn entry_at(hour: u32, price: Decimal) -> PriceHistoryEntry {
        PriceHistoryEntry {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 20, hour, 0, 0).unwrap(),
            price,
        }
    }

    #[tokio::test]
    async fn test_build_report() {
        let source = FixedPriceSource::new()
            .with_price("BTC", dec!(55000))
            .with_history("BTC", Period::OneDay, vec![entry(dec!(50000)), entry(dec!(54000))])
            .with_history("BTC", Period::SevenDays, vec![entry(dec!(0))]);
        let mut tracker = PortfolioTracker::new(Arc::new(source));
        tracker.add_symbol("BTC");
        tracker.add_symbol("ETH");

        let report = build_report(&tracker).await;
        assert!(report.contains("BTC:\nCurrent Price: $55000.00"));
        assert!(report.contains("Percent Change (1 hour): 10.00%"));
        assert!(report.contains("Percent Change (24 hours): 10.00%"));
        assert!(report.contains("Percent Change (7 days): n/a"));
        assert!(report.contains("Percent Change (30 days): n/a"));
        assert!(report.contains("ETH:\nCurrent Price: unavailable"));
    }

    #[tokio::test]
    async fn test_collect_changes() {
        let source = FixedPriceSource::new()
            .with_price("ETH", dec!(2700))
            .with_history("ETH", Period::ThirtyDays, vec![entry(dec!(3000))]);
        let mut tracker = PortfolioTracker::new(Arc::new(source));
        tracker.add_symbol("ETH");

        let reports = collect(&tracker).await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].price, Some(dec!(2700)));
        assert_eq!(
            reports[0].changes,
            vec![
                ("1 hour", None),
                ("24 hours", None),
                ("7 days", None),
                ("30 days", Some(dec!(-10))),
            ]
        );
    }

    #[tokio::test]
    async fn test_one_hour_change_uses_recent_base() {
        let history = vec![
            entry_at(0, dec!(40000)),
            entry_at(10, dec!(48000)),
            entry_at(11, dec!(50000)),
            entry_at(12, dec!(52000)),
        ];
        let source = FixedPriceSource::new()
            .with_price("BTC", dec!(55000))
            .with_history("BTC", Period::OneDay, history);
        let mut tracker = PortfolioTracker::new(Arc::new(source));
        tracker.add_symbol("BTC");

        let reports = collect(&tracker).await;
        assert_eq!(reports[0].changes[0], ("1 hour", Some(dec!(10))));
        assert_eq!(reports[0].changes[1].1.map(|c| c.round_dp(2)), Some(dec!(37.50)));
    }

    #[test]
    fn test_base_price_lookback() {
        let history = vec![entry_at(0, dec!(1)), entry_at(5, dec!(2)), entry_at(6, dec!(3))];
        assert_eq!(base_price(&history, None), Some(dec!(1)));
        assert_eq!(base_price(&history, Some(1)), Some(dec!(2)));
        assert_eq!(base_price(&history, Some(24)), Some(dec!(1)));
        assert_eq!(base_price(&[], Some(1)), None);
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[]), "No symbols tracked.\n");
    }
}
