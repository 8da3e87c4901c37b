//! High-level brokerage client.
//!
//! Translates domain calls (account, positions, orders, market data) into
//! authenticated REST requests through [`HttpClient`], enforcing order
//! validation before submission and freshness validation on market data.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use super::api_types::{
    Account, Bar, BarsResponse, BrokerPosition, CalendarDay, Clock, LatestQuotesResponse,
    LatestTradesResponse, Order,
};
use super::config::{BrokerConfig, TradingMode};
use super::error::BrokerError;
use super::freshness::{FreshnessCheck, LatestTimestamp, MarketData, assess};
use super::http::HttpClient;
use super::order::OrderTicket;

/// Filter for listing orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatusFilter {
    /// Open orders only.
    Open,
    /// Closed orders (filled, canceled, expired).
    Closed,
    /// All orders.
    All,
}

impl OrderStatusFilter {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }
}

/// Query for the order list endpoint.
#[derive(Debug, Clone)]
pub struct OrdersQuery {
    /// Status filter.
    pub status: OrderStatusFilter,
    /// Maximum number of orders returned.
    pub limit: usize,
    /// Only orders submitted after this date.
    pub after: Option<NaiveDate>,
    /// Only orders submitted up to this date.
    pub until: Option<NaiveDate>,
}

impl Default for OrdersQuery {
    fn default() -> Self {
        Self {
            status: OrderStatusFilter::Open,
            limit: 50,
            after: None,
            until: None,
        }
    }
}

impl OrdersQuery {
    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("status", self.status.as_str().to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(after) = self.after {
            params.push(("after", after.to_string()));
        }
        if let Some(until) = self.until {
            params.push(("until", until.to_string()));
        }
        params
    }
}

/// Query for historical bars.
#[derive(Debug, Clone)]
pub struct BarsQuery {
    /// Symbols to fetch.
    pub symbols: Vec<String>,
    /// Bar timeframe ("1Min", "5Min", "15Min", "1Hour", "1Day").
    pub timeframe: String,
    /// Maximum bars per symbol.
    pub limit: usize,
    /// Start date (inclusive).
    pub start: Option<NaiveDate>,
    /// End date (inclusive).
    pub end: Option<NaiveDate>,
}

impl BarsQuery {
    /// Daily bars for one symbol.
    #[must_use]
    pub fn daily(symbol: impl Into<String>, limit: usize) -> Self {
        Self {
            symbols: vec![symbol.into()],
            timeframe: "1Day".to_string(),
            limit,
            start: None,
            end: None,
        }
    }

    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("symbols", self.symbols.join(",")),
            ("timeframe", self.timeframe.clone()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(start) = self.start {
            params.push(("start", start.to_string()));
        }
        if let Some(end) = self.end {
            params.push(("end", end.to_string()));
        }
        params
    }
}

/// Brokerage REST client.
///
/// Construction validates connectivity by fetching the account, so a
/// holder of a `TradingClient` always started from working credentials.
/// Credentials are immutable per instance; [`TradingClient::switch_mode`]
/// builds and re-validates a fresh client.
#[derive(Debug)]
pub struct TradingClient {
    http: HttpClient,
    config: BrokerConfig,
}

impl TradingClient {
    /// Connect and validate credentials against the account endpoint.
    pub async fn connect(config: BrokerConfig) -> Result<Self, BrokerError> {
        let http = HttpClient::new(&config)?;
        let client = Self { http, config };

        let account = client.account().await?;
        tracing::info!(
            account_id = %account.id,
            mode = %client.config.mode,
            "connected to brokerage"
        );

        Ok(client)
    }

    /// Swap to a new credential set, re-validating connectivity.
    pub async fn switch_mode(self, config: BrokerConfig) -> Result<Self, BrokerError> {
        tracing::info!(
            from = %self.config.mode,
            to = %config.mode,
            "switching trading mode"
        );
        Self::connect(config).await
    }

    /// Current trading mode.
    #[must_use]
    pub const fn mode(&self) -> TradingMode {
        self.config.mode
    }

    /// Check if this is live trading.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.config.mode.is_live()
    }

    // ------------------------------------------------------------------
    // Account and positions
    // ------------------------------------------------------------------

    /// Fetch account information.
    pub async fn account(&self) -> Result<Account, BrokerError> {
        self.http.get_trading("/v2/account", &[]).await
    }

    /// Fetch all open positions.
    pub async fn positions(&self) -> Result<Vec<BrokerPosition>, BrokerError> {
        self.http.get_trading("/v2/positions", &[]).await
    }

    /// Fetch the position for one symbol, or `None` when there is none.
    ///
    /// The brokerage answers a missing position with a 404 whose body says
    /// "position does not exist"; that is an expected outcome here, not an
    /// error. Any other failure (bad symbol, auth, network) propagates.
    pub async fn position(&self, symbol: &str) -> Result<Option<BrokerPosition>, BrokerError> {
        let path = format!("/v2/positions/{symbol}");
        match self.http.get_trading(&path, &[]).await {
            Ok(position) => Ok(Some(position)),
            Err(err) if err.is_no_position() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Whether an open position exists for the symbol.
    pub async fn has_position(&self, symbol: &str) -> Result<bool, BrokerError> {
        Ok(self.position(symbol).await?.is_some())
    }

    /// Close a position, optionally partially.
    pub async fn close_position(
        &self,
        symbol: &str,
        qty: Option<Decimal>,
    ) -> Result<Order, BrokerError> {
        let path = format!("/v2/positions/{symbol}");
        let mut params = Vec::new();
        if let Some(qty) = qty {
            params.push(("qty", qty.to_string()));
        }
        self.http.delete_trading(&path, &params).await
    }

    // ------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------

    /// Validate and submit an order.
    ///
    /// Validation failures surface before any HTTP request is made.
    pub async fn place_order(&self, ticket: &OrderTicket) -> Result<Order, BrokerError> {
        ticket.validate()?;

        let mut payload = ticket.to_payload();
        if payload.client_order_id.is_none() {
            payload.client_order_id = Some(uuid::Uuid::new_v4().to_string());
        }

        if self.is_live() {
            tracing::warn!(
                symbol = %ticket.symbol,
                side = payload.side,
                "submitting LIVE order - this will execute real trades"
            );
        }

        tracing::info!(
            symbol = %ticket.symbol,
            side = payload.side,
            order_type = payload.order_type,
            qty = ?payload.qty,
            notional = ?payload.notional,
            limit_price = ?payload.limit_price,
            "submitting order"
        );

        let order: Order = self.http.post_trading("/v2/orders", &payload).await?;

        tracing::info!(
            order_id = %order.id,
            status = %order.status,
            "order submitted"
        );

        Ok(order)
    }

    /// List orders matching a query.
    pub async fn orders(&self, query: &OrdersQuery) -> Result<Vec<Order>, BrokerError> {
        self.http.get_trading("/v2/orders", &query.to_params()).await
    }

    /// Fetch a specific order by broker id.
    pub async fn order(&self, order_id: &str) -> Result<Order, BrokerError> {
        let path = format!("/v2/orders/{order_id}");
        self.http.get_trading(&path, &[]).await
    }

    /// Cancel a specific order.
    pub async fn cancel_order(&self, order_id: &str) -> Result<(), BrokerError> {
        let path = format!("/v2/orders/{order_id}");
        let _: serde_json::Value = self.http.delete_trading(&path, &[]).await?;
        Ok(())
    }

    /// Cancel all open orders.
    pub async fn cancel_all_orders(&self) -> Result<(), BrokerError> {
        let _: serde_json::Value = self.http.delete_trading("/v2/orders", &[]).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Market data
    // ------------------------------------------------------------------

    /// Fetch historical bars, validating data freshness.
    pub async fn bars(
        &self,
        query: &BarsQuery,
        check: FreshnessCheck,
    ) -> Result<MarketData<BarsResponse>, BrokerError> {
        let response: BarsResponse = self
            .http
            .get_data("/v2/stocks/bars", &query.to_params())
            .await?;
        self.validate_market_data(response, check).await
    }

    /// Daily closing bars for one symbol, oldest first.
    ///
    /// Convenience wrapper for indicator construction.
    pub async fn daily_bars(
        &self,
        symbol: &str,
        limit: usize,
        check: FreshnessCheck,
    ) -> Result<Vec<Bar>, BrokerError> {
        let mut data = self.bars(&BarsQuery::daily(symbol, limit), check).await?;
        Ok(data.payload.bars.remove(symbol).unwrap_or_default())
    }

    /// Fetch the latest quotes, validating data freshness.
    pub async fn latest_quotes(
        &self,
        symbols: &[&str],
        check: FreshnessCheck,
    ) -> Result<MarketData<LatestQuotesResponse>, BrokerError> {
        let params = [("symbols", symbols.join(","))];
        let response: LatestQuotesResponse = self
            .http
            .get_data("/v2/stocks/quotes/latest", &params)
            .await?;
        self.validate_market_data(response, check).await
    }

    /// Fetch the latest trades, validating data freshness.
    pub async fn latest_trades(
        &self,
        symbols: &[&str],
        check: FreshnessCheck,
    ) -> Result<MarketData<LatestTradesResponse>, BrokerError> {
        let params = [("symbols", symbols.join(","))];
        let response: LatestTradesResponse = self
            .http
            .get_data("/v2/stocks/trades/latest", &params)
            .await?;
        self.validate_market_data(response, check).await
    }

    // ------------------------------------------------------------------
    // Clock and calendar
    // ------------------------------------------------------------------

    /// Fetch the market clock.
    pub async fn clock(&self) -> Result<Clock, BrokerError> {
        self.http.get_trading("/v2/clock", &[]).await
    }

    /// Whether the market is open right now.
    pub async fn is_market_open(&self) -> Result<bool, BrokerError> {
        Ok(self.clock().await?.is_open)
    }

    /// Fetch the trading calendar for a date range.
    pub async fn calendar(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<CalendarDay>, BrokerError> {
        let mut params = Vec::new();
        if let Some(start) = start {
            params.push(("start", start.to_string()));
        }
        if let Some(end) = end {
            params.push(("end", end.to_string()));
        }
        self.http.get_trading("/v2/calendar", &params).await
    }

    // ------------------------------------------------------------------
    // Convenience orders
    // ------------------------------------------------------------------

    /// Place a market buy order.
    pub async fn buy_market(&self, symbol: &str, qty: Decimal) -> Result<Order, BrokerError> {
        self.place_order(&OrderTicket::market_buy(symbol, qty)).await
    }

    /// Place a market sell order.
    pub async fn sell_market(&self, symbol: &str, qty: Decimal) -> Result<Order, BrokerError> {
        self.place_order(&OrderTicket::market_sell(symbol, qty)).await
    }

    /// Place a limit buy order.
    pub async fn buy_limit(
        &self,
        symbol: &str,
        qty: Decimal,
        limit_price: Decimal,
    ) -> Result<Order, BrokerError> {
        self.place_order(&OrderTicket::limit_buy(symbol, qty, limit_price))
            .await
    }

    /// Place a limit sell order.
    pub async fn sell_limit(
        &self,
        symbol: &str,
        qty: Decimal,
        limit_price: Decimal,
    ) -> Result<Order, BrokerError> {
        self.place_order(&OrderTicket::limit_sell(symbol, qty, limit_price))
            .await
    }

    // ------------------------------------------------------------------
    // Freshness
    // ------------------------------------------------------------------

    /// Attach freshness metadata and enforce the staleness threshold.
    ///
    /// Metadata is computed even when enforcement is skipped, so callers
    /// opting out still see how old their data is.
    async fn validate_market_data<T: LatestTimestamp>(
        &self,
        payload: T,
        check: FreshnessCheck,
    ) -> Result<MarketData<T>, BrokerError> {
        let Some(timestamp) = payload.latest_timestamp() else {
            return Ok(MarketData {
                payload,
                freshness: None,
            });
        };

        let market_open = self.is_market_open().await?;
        let report = assess(timestamp, Utc::now(), market_open, &self.config.freshness);

        if report.is_stale && check == FreshnessCheck::Enforce {
            tracing::warn!(
                age_minutes = report.age_minutes,
                threshold_minutes = report.threshold_minutes,
                market_open = report.market_open,
                "rejecting stale market data"
            );
            return Err(BrokerError::StaleData {
                timestamp: report.timestamp,
                age_minutes: report.age_minutes,
                threshold_minutes: report.threshold_minutes,
                market_open: report.market_open,
            });
        }

        Ok(MarketData {
            payload,
            freshness: Some(report),
        })
    }
}
