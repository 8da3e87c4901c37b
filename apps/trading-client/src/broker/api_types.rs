//! Typed brokerage API payloads.
//!
//! These map directly to the brokerage's REST wire format. Monetary fields
//! arrive as strings on trading endpoints and as numbers on market-data
//! endpoints; both deserialize into [`Decimal`] at this boundary so the
//! rest of the crate never touches raw JSON.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Trading API
// ============================================================================

/// Account response.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: String,
    /// Account status (e.g. "ACTIVE").
    pub status: String,
    /// Account equity.
    pub equity: Decimal,
    /// Cash balance.
    pub cash: Decimal,
    /// Buying power.
    pub buying_power: Decimal,
    /// Total portfolio value.
    #[serde(default)]
    pub portfolio_value: Option<Decimal>,
    /// Day trade count over the rolling window.
    #[serde(default)]
    pub daytrade_count: Option<i32>,
    /// Pattern day trader flag.
    #[serde(default)]
    pub pattern_day_trader: Option<bool>,
}

/// Open position response.
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerPosition {
    /// Symbol.
    pub symbol: String,
    /// Signed quantity.
    pub qty: Decimal,
    /// Side ("long"/"short").
    pub side: String,
    /// Average entry price.
    pub avg_entry_price: Decimal,
    /// Current market value.
    #[serde(default)]
    pub market_value: Option<Decimal>,
    /// Latest traded price.
    #[serde(default)]
    pub current_price: Option<Decimal>,
    /// Unrealized P&L.
    #[serde(default)]
    pub unrealized_pl: Option<Decimal>,
}

/// Order response.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    /// Broker order ID.
    pub id: String,
    /// Client order ID.
    pub client_order_id: String,
    /// Symbol.
    pub symbol: String,
    /// Order status string (e.g. "new", "filled", "canceled").
    pub status: String,
    /// Order side.
    pub side: String,
    /// Order type.
    #[serde(rename = "type")]
    pub order_type: String,
    /// Time in force.
    pub time_in_force: String,
    /// Requested quantity.
    #[serde(default)]
    pub qty: Option<Decimal>,
    /// Requested notional.
    #[serde(default)]
    pub notional: Option<Decimal>,
    /// Filled quantity.
    #[serde(default)]
    pub filled_qty: Option<Decimal>,
    /// Average fill price.
    #[serde(default)]
    pub filled_avg_price: Option<Decimal>,
    /// Limit price.
    #[serde(default)]
    pub limit_price: Option<Decimal>,
    /// Stop price.
    #[serde(default)]
    pub stop_price: Option<Decimal>,
    /// Created timestamp.
    pub created_at: DateTime<Utc>,
    /// Submitted timestamp.
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    /// Filled timestamp.
    #[serde(default)]
    pub filled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Whether the order is fully filled with a known fill price.
    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.status.eq_ignore_ascii_case("filled")
            && self.filled_qty.is_some_and(|q| q > Decimal::ZERO)
            && self.filled_avg_price.is_some()
    }
}

/// Market clock response.
#[derive(Debug, Clone, Deserialize)]
pub struct Clock {
    /// Current timestamp at the exchange.
    pub timestamp: DateTime<Utc>,
    /// Whether the market is open right now.
    pub is_open: bool,
    /// Next market open.
    pub next_open: DateTime<Utc>,
    /// Next market close.
    pub next_close: DateTime<Utc>,
}

/// One trading day from the calendar endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarDay {
    /// Trading date.
    pub date: NaiveDate,
    /// Session open time ("09:30").
    pub open: String,
    /// Session close time ("16:00").
    pub close: String,
}

/// Error body returned by the brokerage.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Brokerage error code.
    #[serde(default)]
    pub code: Option<i64>,
    /// Human-readable message.
    pub message: String,
}

// ============================================================================
// Market data API
// ============================================================================

/// One OHLCV bar.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Bar {
    /// Bar timestamp.
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    /// Open price.
    #[serde(rename = "o")]
    pub open: Decimal,
    /// High price.
    #[serde(rename = "h")]
    pub high: Decimal,
    /// Low price.
    #[serde(rename = "l")]
    pub low: Decimal,
    /// Close price.
    #[serde(rename = "c")]
    pub close: Decimal,
    /// Volume.
    #[serde(rename = "v")]
    pub volume: u64,
}

/// Historical bars keyed by symbol.
#[derive(Debug, Clone, Deserialize)]
pub struct BarsResponse {
    /// Bars per symbol, oldest first.
    pub bars: HashMap<String, Vec<Bar>>,
    /// Pagination token.
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Latest NBBO quote for one symbol.
#[derive(Debug, Clone, Deserialize)]
pub struct Quote {
    /// Quote timestamp.
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    /// Ask price.
    #[serde(rename = "ap")]
    pub ask_price: Decimal,
    /// Ask size.
    #[serde(rename = "as")]
    pub ask_size: u64,
    /// Bid price.
    #[serde(rename = "bp")]
    pub bid_price: Decimal,
    /// Bid size.
    #[serde(rename = "bs")]
    pub bid_size: u64,
}

impl Quote {
    /// Midpoint of the spread, or the bid when the ask is empty.
    #[must_use]
    pub fn mid_price(&self) -> Decimal {
        if self.ask_price > Decimal::ZERO && self.bid_price > Decimal::ZERO {
            (self.ask_price + self.bid_price) / Decimal::TWO
        } else if self.bid_price > Decimal::ZERO {
            self.bid_price
        } else {
            self.ask_price
        }
    }
}

/// Latest quotes keyed by symbol.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestQuotesResponse {
    /// Quote per symbol.
    pub quotes: HashMap<String, Quote>,
}

/// Latest trade tick for one symbol.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeTick {
    /// Trade timestamp.
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    /// Trade price.
    #[serde(rename = "p")]
    pub price: Decimal,
    /// Trade size.
    #[serde(rename = "s")]
    pub size: u64,
}

/// Latest trades keyed by symbol.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestTradesResponse {
    /// Trade per symbol.
    pub trades: HashMap<String, TradeTick>,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn account_parses_string_decimals() {
        let json = serde_json::json!({
            "id": "acct-1",
            "status": "ACTIVE",
            "equity": "100000.25",
            "cash": "25000",
            "buying_power": "50000.50",
            "daytrade_count": 1
        });
        let account: Account = serde_json::from_value(json).unwrap();
        assert_eq!(account.equity, dec!(100000.25));
        assert_eq!(account.buying_power, dec!(50000.50));
        assert_eq!(account.portfolio_value, None);
    }

    #[test]
    fn bar_parses_short_field_names() {
        let json = serde_json::json!({
            "t": "2024-01-02T21:00:00Z",
            "o": 187.15, "h": 188.44, "l": 183.89, "c": 185.64, "v": 82488674u64
        });
        let bar: Bar = serde_json::from_value(json).unwrap();
        assert_eq!(bar.close, dec!(185.64));
        assert_eq!(bar.volume, 82_488_674);
    }

    #[test]
    fn quote_mid_price_prefers_spread_midpoint() {
        let quote = Quote {
            timestamp: Utc::now(),
            ask_price: dec!(150.30),
            ask_size: 100,
            bid_price: dec!(150.20),
            bid_size: 200,
        };
        assert_eq!(quote.mid_price(), dec!(150.25));

        let one_sided = Quote {
            ask_price: Decimal::ZERO,
            ..quote
        };
        assert_eq!(one_sided.mid_price(), dec!(150.20));
    }

    #[test]
    fn filled_order_detection() {
        let json = serde_json::json!({
            "id": "ord-1",
            "client_order_id": "cli-1",
            "symbol": "AAPL",
            "status": "filled",
            "side": "buy",
            "type": "market",
            "time_in_force": "day",
            "filled_qty": "10",
            "filled_avg_price": "185.64",
            "created_at": "2024-01-02T14:30:00Z",
            "filled_at": "2024-01-02T14:30:01Z"
        });
        let order: Order = serde_json::from_value(json).unwrap();
        assert!(order.is_filled());

        let json = serde_json::json!({
            "id": "ord-2",
            "client_order_id": "cli-2",
            "symbol": "AAPL",
            "status": "new",
            "side": "buy",
            "type": "market",
            "time_in_force": "day",
            "created_at": "2024-01-02T14:30:00Z"
        });
        let order: Order = serde_json::from_value(json).unwrap();
        assert!(!order.is_filled());
    }
}
