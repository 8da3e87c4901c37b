//! Trading Client Binary
//!
//! Connects to the brokerage, prints an account snapshot and a
//! corporate-action-adjusted portfolio summary, and reconciles the local
//! trade log against recent broker fills.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin trading-client
//! ```
//!
//! # Environment Variables
//!
//! ## Required (per mode)
//! - `ALPACA_PAPER_API_KEY` / `ALPACA_PAPER_SECRET`: paper credentials
//! - `ALPACA_LIVE_API_KEY` / `ALPACA_LIVE_SECRET`: live credentials
//!
//! ## Optional
//! - `MODE`: PAPER | LIVE (default: PAPER; unrecognized values fall back
//!   to PAPER)
//! - `STATE_FILE`: position tracking state path (default:
//!   `position_tracking_data.json`)
//! - `RUST_LOG`: log level (default: info)

use anyhow::Context;
use trading_client::broker::TradingClient;
use trading_client::config::{Credentials, RiskParameters};
use trading_client::positions::PositionTracker;

/// Default state file path.
const DEFAULT_STATE_FILE: &str = "position_tracking_data.json";

/// Days of broker order history to reconcile on startup.
const SYNC_DAYS_BACK: u32 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    trading_client::observability::init();

    let credentials = Credentials::from_env().context("loading credentials")?;
    let risk = RiskParameters::default()
        .validated()
        .context("validating risk parameters")?;

    tracing::info!(
        mode = %credentials.mode,
        max_position_size_pct = %risk.max_position_size_pct,
        "starting trading client"
    );

    let client = TradingClient::connect(credentials.broker_config())
        .await
        .context("connecting to brokerage")?;

    let account = client.account().await.context("fetching account")?;
    println!("Account {} ({})", account.id, account.status);
    println!("  Equity:       ${}", account.equity);
    println!("  Cash:         ${}", account.cash);
    println!("  Buying power: ${}", account.buying_power);

    let market_open = client.is_market_open().await.context("fetching clock")?;
    println!("  Market open:  {market_open}");

    let state_file =
        std::env::var("STATE_FILE").unwrap_or_else(|_| DEFAULT_STATE_FILE.to_string());
    let mut tracker = PositionTracker::open(state_file).context("opening position tracker")?;

    let synced = tracker
        .sync_with_broker(&client, SYNC_DAYS_BACK)
        .await
        .context("syncing with broker")?;
    if synced > 0 {
        println!("Synced {synced} fills from broker history");
    }

    let summary = tracker
        .portfolio_summary(&client)
        .await
        .context("building portfolio summary")?;

    println!("\nPortfolio ({} positions)", summary.positions.len());
    for entry in &summary.positions {
        println!(
            "  {:<6} {:>10} sh @ ${:<10} value ${:<12} P&L ${:<12} ({}%)",
            entry.symbol,
            entry.quantity.round_dp(4),
            entry.current_price.round_dp(2),
            entry.market_value.round_dp(2),
            entry.total_pnl.round_dp(2),
            entry.total_return_pct.round_dp(2),
        );
    }
    println!(
        "  Total: value ${} cost ${} P&L ${} ({}%), dividends ${}",
        summary.total_market_value.round_dp(2),
        summary.total_cost_basis.round_dp(2),
        summary.total_pnl.round_dp(2),
        summary.total_return_pct.round_dp(2),
        summary.total_dividends.round_dp(2),
    );

    Ok(())
}
