//! Order tickets and pre-submission validation.
//!
//! A ticket is validated locally before any HTTP request is built: exactly
//! one of quantity/notional must be set, and limit/stop prices must match
//! the order type. The brokerage enforces the same rules server-side, but
//! a malformed ticket should never consume a rate-limit slot.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::BrokerError;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    /// Buy to open or add.
    Buy,
    /// Sell to reduce or close.
    Sell,
}

impl OrderSide {
    /// Wire string for the brokerage API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Execute at market.
    Market,
    /// Execute at or better than the limit price.
    Limit,
    /// Becomes a market order once the stop price trades.
    Stop,
    /// Becomes a limit order once the stop price trades.
    StopLimit,
}

impl OrderType {
    /// Wire string for the brokerage API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Limit => "limit",
            Self::Stop => "stop",
            Self::StopLimit => "stop_limit",
        }
    }
}

/// Time in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    /// Valid for the trading day.
    Day,
    /// Good till canceled.
    Gtc,
    /// Immediate or cancel.
    Ioc,
    /// Fill or kill.
    Fok,
}

impl TimeInForce {
    /// Wire string for the brokerage API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Gtc => "gtc",
            Self::Ioc => "ioc",
            Self::Fok => "fok",
        }
    }
}

/// An order to be submitted to the brokerage.
#[derive(Debug, Clone)]
pub struct OrderTicket {
    /// Stock symbol.
    pub symbol: String,
    /// Buy or sell.
    pub side: OrderSide,
    /// Market, limit, stop, or stop-limit.
    pub order_type: OrderType,
    /// How long the order remains active.
    pub time_in_force: TimeInForce,
    /// Quantity of shares. Exactly one of `qty`/`notional` must be set.
    pub qty: Option<Decimal>,
    /// Dollar amount to trade (fractional shares).
    pub notional: Option<Decimal>,
    /// Limit price, required for limit and stop-limit orders.
    pub limit_price: Option<Decimal>,
    /// Stop price, required for stop and stop-limit orders.
    pub stop_price: Option<Decimal>,
    /// Trail amount for trailing stops.
    pub trail_price: Option<Decimal>,
    /// Trail percentage for trailing stops.
    pub trail_percent: Option<Decimal>,
    /// Client-assigned order id.
    pub client_order_id: Option<String>,
    /// Allow execution outside regular hours.
    pub extended_hours: bool,
}

impl OrderTicket {
    /// Start a ticket with the given core fields and no sizing.
    #[must_use]
    pub fn new(symbol: impl Into<String>, side: OrderSide, order_type: OrderType) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type,
            time_in_force: TimeInForce::Day,
            qty: None,
            notional: None,
            limit_price: None,
            stop_price: None,
            trail_price: None,
            trail_percent: None,
            client_order_id: None,
            extended_hours: false,
        }
    }

    /// Market buy for a share quantity.
    #[must_use]
    pub fn market_buy(symbol: impl Into<String>, qty: Decimal) -> Self {
        Self::new(symbol, OrderSide::Buy, OrderType::Market).with_qty(qty)
    }

    /// Market sell for a share quantity.
    #[must_use]
    pub fn market_sell(symbol: impl Into<String>, qty: Decimal) -> Self {
        Self::new(symbol, OrderSide::Sell, OrderType::Market).with_qty(qty)
    }

    /// Limit buy at the given price.
    #[must_use]
    pub fn limit_buy(symbol: impl Into<String>, qty: Decimal, limit_price: Decimal) -> Self {
        Self::new(symbol, OrderSide::Buy, OrderType::Limit)
            .with_qty(qty)
            .with_limit_price(limit_price)
    }

    /// Limit sell at the given price.
    #[must_use]
    pub fn limit_sell(symbol: impl Into<String>, qty: Decimal, limit_price: Decimal) -> Self {
        Self::new(symbol, OrderSide::Sell, OrderType::Limit)
            .with_qty(qty)
            .with_limit_price(limit_price)
    }

    /// Set the share quantity.
    #[must_use]
    pub const fn with_qty(mut self, qty: Decimal) -> Self {
        self.qty = Some(qty);
        self
    }

    /// Set the notional dollar amount.
    #[must_use]
    pub const fn with_notional(mut self, notional: Decimal) -> Self {
        self.notional = Some(notional);
        self
    }

    /// Set the limit price.
    #[must_use]
    pub const fn with_limit_price(mut self, price: Decimal) -> Self {
        self.limit_price = Some(price);
        self
    }

    /// Set the stop price.
    #[must_use]
    pub const fn with_stop_price(mut self, price: Decimal) -> Self {
        self.stop_price = Some(price);
        self
    }

    /// Set the time in force.
    #[must_use]
    pub const fn with_time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = tif;
        self
    }

    /// Set the client order id.
    #[must_use]
    pub fn with_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }

    /// Validate the ticket before submission.
    pub fn validate(&self) -> Result<(), BrokerError> {
        if self.symbol.trim().is_empty() {
            return Err(BrokerError::InvalidOrder("symbol must not be empty".into()));
        }

        match (self.qty, self.notional) {
            (None, None) => {
                return Err(BrokerError::InvalidOrder(
                    "either qty or notional must be specified".into(),
                ));
            }
            (Some(_), Some(_)) => {
                return Err(BrokerError::InvalidOrder(
                    "qty and notional are mutually exclusive".into(),
                ));
            }
            _ => {}
        }

        if self.qty.is_some_and(|qty| qty <= Decimal::ZERO) {
            return Err(BrokerError::InvalidOrder("qty must be positive".into()));
        }
        if self.notional.is_some_and(|notional| notional <= Decimal::ZERO) {
            return Err(BrokerError::InvalidOrder("notional must be positive".into()));
        }

        match self.order_type {
            OrderType::Limit if self.limit_price.is_none() => {
                return Err(BrokerError::InvalidOrder(
                    "limit orders require a limit_price".into(),
                ));
            }
            OrderType::Stop if self.stop_price.is_none() => {
                return Err(BrokerError::InvalidOrder(
                    "stop orders require a stop_price".into(),
                ));
            }
            OrderType::StopLimit if self.limit_price.is_none() || self.stop_price.is_none() => {
                return Err(BrokerError::InvalidOrder(
                    "stop-limit orders require both limit_price and stop_price".into(),
                ));
            }
            _ => {}
        }

        Ok(())
    }

    /// Convert to the brokerage wire format.
    ///
    /// Decimal fields are serialized as strings, which is what the
    /// brokerage expects for order submission.
    #[must_use]
    pub fn to_payload(&self) -> OrderPayload {
        OrderPayload {
            symbol: self.symbol.clone(),
            qty: self.qty.map(|q| q.to_string()),
            notional: self.notional.map(|n| n.to_string()),
            side: self.side.as_str(),
            order_type: self.order_type.as_str(),
            time_in_force: self.time_in_force.as_str(),
            limit_price: self.limit_price.map(|p| p.to_string()),
            stop_price: self.stop_price.map(|p| p.to_string()),
            trail_price: self.trail_price.map(|p| p.to_string()),
            trail_percent: self.trail_percent.map(|p| p.to_string()),
            client_order_id: self.client_order_id.clone(),
            extended_hours: if self.extended_hours { Some(true) } else { None },
        }
    }
}

/// Wire-format order request body.
#[derive(Debug, Clone, Serialize)]
pub struct OrderPayload {
    /// Stock symbol.
    pub symbol: String,
    /// Quantity (shares), as a string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qty: Option<String>,
    /// Notional value (dollars), as a string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notional: Option<String>,
    /// Order side.
    pub side: &'static str,
    /// Order type.
    #[serde(rename = "type")]
    pub order_type: &'static str,
    /// Time in force.
    pub time_in_force: &'static str,
    /// Limit price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<String>,
    /// Stop price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<String>,
    /// Trailing stop amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trail_price: Option<String>,
    /// Trailing stop percentage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trail_percent: Option<String>,
    /// Client order ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
    /// Extended hours trading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_hours: Option<bool>,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn qty_and_notional_are_mutually_exclusive() {
        let ticket = OrderTicket::market_buy("AAPL", dec!(10)).with_notional(dec!(500));
        let err = ticket.validate().unwrap_err();
        assert!(matches!(err, BrokerError::InvalidOrder(_)));
    }

    #[test]
    fn qty_or_notional_is_required() {
        let ticket = OrderTicket::new("AAPL", OrderSide::Buy, OrderType::Market);
        let err = ticket.validate().unwrap_err();
        assert!(matches!(err, BrokerError::InvalidOrder(_)));
    }

    #[test]
    fn notional_alone_is_valid() {
        let ticket =
            OrderTicket::new("AAPL", OrderSide::Buy, OrderType::Market).with_notional(dec!(500));
        assert!(ticket.validate().is_ok());
    }

    #[test]
    fn limit_order_requires_limit_price() {
        let ticket = OrderTicket::new("AAPL", OrderSide::Buy, OrderType::Limit).with_qty(dec!(1));
        assert!(ticket.validate().is_err());

        let ticket = ticket.with_limit_price(dec!(150));
        assert!(ticket.validate().is_ok());
    }

    #[test]
    fn stop_limit_requires_both_prices() {
        let base =
            OrderTicket::new("AAPL", OrderSide::Sell, OrderType::StopLimit).with_qty(dec!(1));
        assert!(base.clone().with_limit_price(dec!(150)).validate().is_err());
        assert!(base.clone().with_stop_price(dec!(149)).validate().is_err());
        assert!(
            base.with_limit_price(dec!(150))
                .with_stop_price(dec!(149))
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn non_positive_sizes_rejected() {
        assert!(OrderTicket::market_buy("AAPL", dec!(0)).validate().is_err());
        assert!(OrderTicket::market_buy("AAPL", dec!(-5)).validate().is_err());
    }

    #[test]
    fn payload_omits_unset_fields() {
        let ticket = OrderTicket::market_buy("AAPL", dec!(10));
        let json = serde_json::to_value(ticket.to_payload()).unwrap();

        assert_eq!(json["symbol"], "AAPL");
        assert_eq!(json["qty"], "10");
        assert_eq!(json["side"], "buy");
        assert_eq!(json["type"], "market");
        assert_eq!(json["time_in_force"], "day");
        assert!(json.get("notional").is_none());
        assert!(json.get("limit_price").is_none());
        assert!(json.get("extended_hours").is_none());
    }

    #[test]
    fn wire_strings_match_brokerage_enums() {
        assert_eq!(OrderType::StopLimit.as_str(), "stop_limit");
        assert_eq!(TimeInForce::Gtc.as_str(), "gtc");
        assert_eq!(OrderSide::Sell.as_str(), "sell");
    }
}
