//! Trade records and derived position types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::corporate_actions::PnlReport;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeKind {
    /// Opening or adding to a position.
    Buy,
    /// Reducing or closing a position.
    Sell,
}

impl std::fmt::Display for TradeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => f.write_str("buy"),
            Self::Sell => f.write_str("sell"),
        }
    }
}

/// One executed fill, as persisted in the trade log.
///
/// Quantity is signed: positive for buys, negative for sells. The current
/// position is always derived by folding these records, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Execution timestamp.
    #[serde(rename = "date")]
    pub executed_at: DateTime<Utc>,
    /// Trade direction.
    #[serde(rename = "type")]
    pub kind: TradeKind,
    /// Signed share quantity.
    pub quantity: Decimal,
    /// Price per share.
    pub price: Decimal,
    /// `|quantity| * price`.
    pub total_value: Decimal,
    /// Broker order id, when known. Used to deduplicate broker syncs.
    #[serde(default)]
    pub order_id: Option<String>,
    /// When this record was written locally.
    pub recorded_at: DateTime<Utc>,
}

impl TradeRecord {
    /// Build a record, deriving `total_value` from quantity and price.
    #[must_use]
    pub fn new(
        kind: TradeKind,
        quantity: Decimal,
        price: Decimal,
        executed_at: DateTime<Utc>,
        order_id: Option<String>,
    ) -> Self {
        Self {
            executed_at,
            kind,
            quantity,
            price,
            total_value: quantity.abs() * price,
            order_id,
            recorded_at: Utc::now(),
        }
    }
}

/// A derived position, after corporate-action adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Symbol.
    pub symbol: String,
    /// Share quantity.
    pub quantity: Decimal,
    /// Average cost per share.
    pub cost_basis: Decimal,
    /// Quantity x cost basis.
    pub total_cost: Decimal,
    /// Number of trades folded into this view.
    pub trades_count: usize,
    /// Number of corporate actions applied.
    pub actions_applied: usize,
    /// Timestamp of the first buy, when one exists.
    pub first_acquisition: Option<DateTime<Utc>>,
}

impl Position {
    /// The zero-position sentinel.
    #[must_use]
    pub fn flat(symbol: impl Into<String>, trades_count: usize) -> Self {
        Self {
            symbol: symbol.into(),
            quantity: Decimal::ZERO,
            cost_basis: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            trades_count,
            actions_applied: 0,
            first_acquisition: None,
        }
    }

    /// Whether any shares are held.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.quantity > Decimal::ZERO
    }
}

/// Cached P&L figures for one symbol, cleared on any mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedPnl {
    /// Price the figures were computed against.
    pub current_price: Decimal,
    /// When the figures were computed.
    pub cached_at: DateTime<Utc>,
    /// The full report.
    pub report: PnlReport,
}

/// Outcome of a P&L query.
///
/// Absence of a position is an expected result, not an error; portfolio
/// aggregation must stay resilient to symbols with no open position.
#[derive(Debug, Clone)]
pub enum PnlOutcome {
    /// No shares held as of the query date.
    NoPosition,
    /// Full corporate-action-adjusted P&L.
    Report(Box<PnlReport>),
}

impl PnlOutcome {
    /// The report, when one was produced.
    #[must_use]
    pub fn report(&self) -> Option<&PnlReport> {
        match self {
            Self::NoPosition => None,
            Self::Report(report) => Some(report),
        }
    }
}

/// One line of the portfolio summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioEntry {
    /// Symbol.
    pub symbol: String,
    /// Adjusted share quantity.
    pub quantity: Decimal,
    /// Current market price.
    pub current_price: Decimal,
    /// Current market value.
    pub market_value: Decimal,
    /// Original cash outlay.
    pub total_cost: Decimal,
    /// Total P&L including dividends.
    pub total_pnl: Decimal,
    /// Total return percentage.
    pub total_return_pct: Decimal,
    /// Dividends received.
    pub dividends_received: Decimal,
    /// Corporate actions applied.
    pub actions_applied: usize,
}

/// Aggregated portfolio view across all broker positions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Per-symbol lines.
    pub positions: Vec<PortfolioEntry>,
    /// Sum of market values.
    pub total_market_value: Decimal,
    /// Sum of original costs.
    pub total_cost_basis: Decimal,
    /// Sum of total P&L.
    pub total_pnl: Decimal,
    /// Sum of dividends received.
    pub total_dividends: Decimal,
    /// Portfolio-level total return percentage.
    pub total_return_pct: Decimal,
    /// Portfolio-level dividend yield percentage.
    pub dividend_yield_pct: Decimal,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn trade_record_derives_total_value() {
        let record = TradeRecord::new(TradeKind::Sell, dec!(-10), dec!(150.50), Utc::now(), None);
        assert_eq!(record.total_value, dec!(1505.00));
    }

    #[test]
    fn trade_record_serializes_documented_field_names() {
        let record = TradeRecord::new(
            TradeKind::Buy,
            dec!(5),
            dec!(100),
            Utc::now(),
            Some("ord-1".into()),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("date").is_some());
        assert_eq!(json["type"], "buy");
        assert_eq!(json["order_id"], "ord-1");
    }

    #[test]
    fn flat_position_is_not_open() {
        let flat = Position::flat("AAPL", 4);
        assert!(!flat.is_open());
        assert_eq!(flat.trades_count, 4);
        assert_eq!(flat.quantity, Decimal::ZERO);
    }
}
