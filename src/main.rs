//! Crypto Portfolio Tracker
//!
//! Command-line wrapper around the portfolio tracker.

use clap::{Parser, Subcommand};
use crypto_tracker::{config::Config, notify, report, PortfolioTracker};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "crypto-tracker")]
#[command(about = "Track crypto prices and dispatch price alerts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll prices and dispatch alerts until interrupted
    Watch,
    /// Run a single alert check
    Check,
    /// Show the current price of a symbol
    Price {
        symbol: String,
    },
    /// Show prices for all configured symbols
    Prices,
    /// Show price history (1d, 7d, 30d, 90d, 1y)
    History {
        symbol: String,
        #[arg(short, long, default_value = "1d")]
        period: String,
    },
    /// Show the average price over a period
    Average {
        symbol: String,
        #[arg(short, long, default_value = "7d")]
        period: String,
    },
    /// Print the portfolio price report
    Report,
    /// Send a test message through every configured sink
    TestNotify,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Watch => watch(config).await,
        Commands::Check => check(config).await,
        Commands::Price { symbol } => show_price(config, &symbol).await,
        Commands::Prices => show_prices(config).await,
        Commands::History { symbol, period } => show_history(config, &symbol, &period).await,
        Commands::Average { symbol, period } => show_average(config, &symbol, &period).await,
        Commands::Report => show_report(config).await,
        Commands::TestNotify => test_notify(config).await,
    }
}

async fn watch(config: Config) -> anyhow::Result<()> {
    let tracker = PortfolioTracker::from_config(&config)?;
    let mut ticker = tokio::time::interval(Duration::from_secs(config.tracker.poll_interval_secs));

    tracing::info!(
        "Watching {} symbol(s) every {}s",
        tracker.list_symbols().len(),
        config.tracker.poll_interval_secs
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match tracker.check_alerts().await {
                    Ok(triggered) if !triggered.is_empty() => {
                        tracing::info!("{} alert(s) dispatched", triggered.len());
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!("Alert check failed: {}", e),
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Shutting down");
                return Ok(());
            }
        }
    }
}

async fn check(config: Config) -> anyhow::Result<()> {
    let tracker = PortfolioTracker::from_config(&config)?;
    let triggered = tracker.check_alerts().await?;

    if triggered.is_empty() {
        println!("No alerts triggered.");
    }
    for t in &triggered {
        println!("{}", t.message());
    }
    Ok(())
}

async fn show_price(config: Config, symbol: &str) -> anyhow::Result<()> {
    let tracker = PortfolioTracker::from_config(&config)?;
    let price = tracker.current_price(symbol).await?;
    println!("{}: ${}", symbol.to_uppercase(), price);
    Ok(())
}

async fn show_prices(config: Config) -> anyhow::Result<()> {
    let tracker = PortfolioTracker::from_config(&config)?;
    let prices = tracker.all_current_prices().await?;

    for symbol in tracker.list_symbols() {
        match prices.get(&symbol) {
            Some(price) => println!("{:<8} ${}", symbol, price),
            None => println!("{:<8} unavailable", symbol),
        }
    }
    Ok(())
}

async fn show_history(config: Config, symbol: &str, period: &str) -> anyhow::Result<()> {
    let tracker = PortfolioTracker::from_config(&config)?;
    let history = tracker.price_history(symbol, period).await?;

    for entry in &history {
        println!("{}  {}", entry.timestamp.format("%Y-%m-%d %H:%M"), entry.price);
    }
    println!("{} point(s)", history.len());
    Ok(())
}

async fn show_average(config: Config, symbol: &str, period: &str) -> anyhow::Result<()> {
    let tracker = PortfolioTracker::from_config(&config)?;
    let average = tracker.average_price(symbol, period).await?;
    println!("{} average ({}): ${:.2}", symbol.to_uppercase(), period, average);
    Ok(())
}

async fn show_report(config: Config) -> anyhow::Result<()> {
    let tracker = PortfolioTracker::from_config(&config)?;
    print!("{}", report::build_report(&tracker).await);
    Ok(())
}

async fn test_notify(config: Config) -> anyhow::Result<()> {
    let sinks = notify::from_config(&config)?;
    let mut failed = 0;

    for sink in &sinks {
        match sink.notify("✅ crypto-tracker test notification").await {
            Ok(()) => println!("{}: ok", sink.name()),
            Err(e) => {
                failed += 1;
                println!("{}: {}", sink.name(), e);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} sink(s) failed", failed, sinks.len());
    }
    Ok(())
}
