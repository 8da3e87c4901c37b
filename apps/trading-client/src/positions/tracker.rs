//! Corporate-action-aware position tracking.
//!
//! The tracker owns an append-only trade log per symbol. Positions are
//! never stored; every query folds the log forward (average-cost method
//! on sells) and then applies all effective corporate actions from the
//! first acquisition date. State persists to a JSON file on every
//! mutation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use super::records::{
    CachedPnl, PnlOutcome, PortfolioEntry, PortfolioSummary, Position, TradeKind, TradeRecord,
};
use super::store::{self, StoreError, TrackerState};
use crate::broker::{
    BrokerError, Order, OrderStatusFilter, OrdersQuery, TradingClient,
};
use crate::corporate_actions::{ActionError, CorporateAction, CorporateActionLedger};

/// Errors from position tracking.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// State persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Corporate action data problem (e.g. a split without a ratio).
    #[error(transparent)]
    Action(#[from] ActionError),

    /// Broker call failed during sync or summary.
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// Trade record rejected before being appended.
    #[error("invalid trade: {0}")]
    InvalidTrade(String),
}

/// Source of historical filled orders, for broker reconciliation.
///
/// Implemented by [`TradingClient`]; tests substitute a canned source.
#[async_trait]
pub trait OrderHistory {
    /// Filled orders between the two dates, inclusive.
    async fn filled_orders(
        &self,
        after: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Order>, BrokerError>;
}

#[async_trait]
impl OrderHistory for TradingClient {
    async fn filled_orders(
        &self,
        after: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<Order>, BrokerError> {
        let query = OrdersQuery {
            status: OrderStatusFilter::Closed,
            limit: 500,
            after: Some(after),
            until: Some(until),
        };
        let orders = self.orders(&query).await?;
        Ok(orders.into_iter().filter(Order::is_filled).collect())
    }
}

/// Raw result of folding a symbol's trade log, before adjustment.
struct FoldedTrades {
    quantity: Decimal,
    total_cost: Decimal,
    trades_count: usize,
    first_acquisition: Option<DateTime<Utc>>,
}

impl FoldedTrades {
    fn cost_basis(&self) -> Decimal {
        if self.quantity > Decimal::ZERO {
            self.total_cost / self.quantity
        } else {
            Decimal::ZERO
        }
    }
}

/// Append-only trade ledger with derived, adjusted position views.
#[derive(Debug)]
pub struct PositionTracker {
    state: TrackerState,
    path: PathBuf,
}

impl PositionTracker {
    /// Open a tracker backed by the given state file.
    ///
    /// A missing file starts empty; a corrupt file is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TrackerError> {
        let path = path.into();
        let state = store::load(&path)?;
        Ok(Self { state, path })
    }

    /// Path of the backing state file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The corporate-action ledger, shared read-only.
    #[must_use]
    pub const fn ledger(&self) -> &CorporateActionLedger {
        &self.state.corporate_actions
    }

    /// Trades recorded for a symbol, oldest first.
    #[must_use]
    pub fn trades_for(&self, symbol: &str) -> &[TradeRecord] {
        self.state
            .positions_history
            .get(symbol)
            .map_or(&[], Vec::as_slice)
    }

    /// Record a confirmed fill.
    ///
    /// Quantity is signed: positive for buys, negative for sells. The
    /// record is appended, the symbol's P&L cache is invalidated, and
    /// state is persisted before returning. Only call this after the
    /// broker confirms the fill - a failed order must never reach the log.
    pub fn record_trade(
        &mut self,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
        kind: TradeKind,
        executed_at: DateTime<Utc>,
        order_id: Option<String>,
    ) -> Result<(), TrackerError> {
        match kind {
            TradeKind::Buy if quantity <= Decimal::ZERO => {
                return Err(TrackerError::InvalidTrade(format!(
                    "buy quantity must be positive, got {quantity}"
                )));
            }
            TradeKind::Sell if quantity >= Decimal::ZERO => {
                return Err(TrackerError::InvalidTrade(format!(
                    "sell quantity must be negative, got {quantity}"
                )));
            }
            _ => {}
        }
        if price <= Decimal::ZERO {
            return Err(TrackerError::InvalidTrade(format!(
                "price must be positive, got {price}"
            )));
        }

        self.state
            .positions_history
            .entry(symbol.to_string())
            .or_default()
            .push(TradeRecord::new(kind, quantity, price, executed_at, order_id));

        self.state.pnl_cache.remove(symbol);
        store::save(&self.path, &mut self.state)?;

        tracing::info!(
            symbol,
            %quantity,
            %price,
            %kind,
            "recorded trade"
        );

        Ok(())
    }

    /// Add a corporate action, invalidating the affected symbol's cache.
    pub fn add_corporate_action(&mut self, action: CorporateAction) -> Result<(), TrackerError> {
        let symbol = action.symbol.clone();
        self.state.corporate_actions.insert(action);
        self.state.pnl_cache.remove(&symbol);
        store::save(&self.path, &mut self.state)?;
        Ok(())
    }

    /// Derive the position for a symbol as of a date.
    ///
    /// Buys accumulate quantity and cost. Sells reduce quantity and
    /// reduce total cost at the average cost per share at the time of the
    /// sell (average-cost method; no FIFO/LIFO lot matching). If shares
    /// remain, corporate actions from the first acquisition date through
    /// `as_of` are applied. A closed-out symbol yields the flat sentinel.
    pub fn position_as_of(
        &self,
        symbol: &str,
        as_of: NaiveDate,
    ) -> Result<Position, TrackerError> {
        let folded = self.fold_trades(symbol, as_of);

        if folded.quantity <= Decimal::ZERO {
            return Ok(Position::flat(symbol, folded.trades_count));
        }

        let cost_basis = folded.cost_basis();
        let Some(first_acquisition) = folded.first_acquisition else {
            return Ok(Position::flat(symbol, folded.trades_count));
        };

        let adjusted = self.state.corporate_actions.apply(
            symbol,
            first_acquisition.date_naive(),
            folded.quantity,
            cost_basis,
            as_of,
        )?;

        Ok(Position {
            symbol: symbol.to_string(),
            quantity: adjusted.adjusted_quantity,
            cost_basis: adjusted.adjusted_cost_basis,
            total_cost: adjusted.adjusted_quantity * adjusted.adjusted_cost_basis,
            trades_count: folded.trades_count,
            actions_applied: adjusted.actions_applied(),
            first_acquisition: Some(first_acquisition),
        })
    }

    /// Derive the current position for a symbol.
    pub fn current_position(&self, symbol: &str) -> Result<Position, TrackerError> {
        self.position_as_of(symbol, Utc::now().date_naive())
    }

    /// Corporate-action-adjusted P&L for a symbol at a price.
    ///
    /// Returns [`PnlOutcome::NoPosition`] when no shares are held as of
    /// the date. The computed report is cached in the state file until
    /// the next mutation of the symbol.
    pub fn position_pnl(
        &mut self,
        symbol: &str,
        current_price: Decimal,
        as_of: NaiveDate,
    ) -> Result<PnlOutcome, TrackerError> {
        let folded = self.fold_trades(symbol, as_of);

        if folded.quantity <= Decimal::ZERO {
            return Ok(PnlOutcome::NoPosition);
        }
        let Some(first_acquisition) = folded.first_acquisition else {
            return Ok(PnlOutcome::NoPosition);
        };

        let report = self.state.corporate_actions.adjusted_pnl(
            symbol,
            first_acquisition.date_naive(),
            folded.quantity,
            folded.cost_basis(),
            current_price,
            as_of,
        )?;

        self.state.pnl_cache.insert(
            symbol.to_string(),
            CachedPnl {
                current_price,
                cached_at: Utc::now(),
                report: report.clone(),
            },
        );
        store::save(&self.path, &mut self.state)?;

        Ok(PnlOutcome::Report(Box::new(report)))
    }

    /// Cached P&L for a symbol, when no mutation has invalidated it.
    #[must_use]
    pub fn cached_pnl(&self, symbol: &str) -> Option<&CachedPnl> {
        self.state.pnl_cache.get(symbol)
    }

    /// Build a portfolio summary across all broker positions.
    ///
    /// Symbols with no local trade history, or no usable price, are
    /// skipped rather than failing the whole summary.
    pub async fn portfolio_summary(
        &mut self,
        client: &TradingClient,
    ) -> Result<PortfolioSummary, TrackerError> {
        let today = Utc::now().date_naive();
        let broker_positions = client.positions().await?;

        let mut summary = PortfolioSummary::default();

        for broker_position in broker_positions {
            let symbol = broker_position.symbol;
            let Some(current_price) = broker_position.current_price else {
                tracing::warn!(%symbol, "no current price from broker, skipping");
                continue;
            };

            let outcome = self.position_pnl(&symbol, current_price, today)?;
            let Some(report) = outcome.report() else {
                continue;
            };

            summary.positions.push(PortfolioEntry {
                symbol,
                quantity: report.position.adjusted_quantity,
                current_price,
                market_value: report.breakdown.current_market_value,
                total_cost: report.breakdown.original_total_cost,
                total_pnl: report.breakdown.total_pnl,
                total_return_pct: report.returns.total_return_pct,
                dividends_received: report.breakdown.dividends_received,
                actions_applied: report.position.actions_applied(),
            });

            summary.total_market_value += report.breakdown.current_market_value;
            summary.total_cost_basis += report.breakdown.original_total_cost;
            summary.total_pnl += report.breakdown.total_pnl;
            summary.total_dividends += report.breakdown.dividends_received;
        }

        if summary.total_cost_basis > Decimal::ZERO {
            summary.total_return_pct =
                summary.total_pnl / summary.total_cost_basis * Decimal::ONE_HUNDRED;
            summary.dividend_yield_pct =
                summary.total_dividends / summary.total_cost_basis * Decimal::ONE_HUNDRED;
        }

        Ok(summary)
    }

    /// Pull filled orders from the broker and append any that are missing.
    ///
    /// Fills are matched by broker order id, so re-running over an
    /// overlapping window records nothing twice. Returns the number of
    /// newly recorded trades.
    pub async fn sync_with_broker<S: OrderHistory + Sync>(
        &mut self,
        source: &S,
        days_back: u32,
    ) -> Result<usize, TrackerError> {
        let until = Utc::now().date_naive();
        let after = until
            .checked_sub_days(Days::new(u64::from(days_back)))
            .unwrap_or(until);

        let orders = source.filled_orders(after, until).await?;
        let mut synced = 0usize;

        for order in orders {
            if !order.is_filled() {
                continue;
            }
            let (Some(filled_qty), Some(price)) = (order.filled_qty, order.filled_avg_price)
            else {
                continue;
            };

            let already_recorded = self
                .trades_for(&order.symbol)
                .iter()
                .any(|t| t.order_id.as_deref() == Some(order.id.as_str()));
            if already_recorded {
                continue;
            }

            let (kind, quantity) = if order.side.eq_ignore_ascii_case("sell") {
                (TradeKind::Sell, -filled_qty)
            } else {
                (TradeKind::Buy, filled_qty)
            };
            let executed_at = order.filled_at.unwrap_or(order.created_at);

            self.record_trade(
                &order.symbol,
                quantity,
                price,
                kind,
                executed_at,
                Some(order.id.clone()),
            )?;
            synced += 1;
        }

        tracing::info!(synced, days_back, "broker sync complete");
        Ok(synced)
    }

    /// Fold the trade log for a symbol up to a date.
    fn fold_trades(&self, symbol: &str, as_of: NaiveDate) -> FoldedTrades {
        let mut quantity = Decimal::ZERO;
        let mut total_cost = Decimal::ZERO;
        let mut trades_count = 0usize;
        let mut first_acquisition = None;

        for trade in self.trades_for(symbol) {
            if trade.executed_at.date_naive() > as_of {
                continue;
            }
            trades_count += 1;

            match trade.kind {
                TradeKind::Buy => {
                    quantity += trade.quantity;
                    total_cost += trade.quantity * trade.price;
                    if first_acquisition.is_none() {
                        first_acquisition = Some(trade.executed_at);
                    }
                }
                TradeKind::Sell => {
                    // Average-cost method: the sale removes cost at the
                    // current average per share, not any particular lot.
                    if quantity > Decimal::ZERO {
                        let cost_per_share = total_cost / quantity;
                        total_cost -= trade.quantity.abs() * cost_per_share;
                        quantity += trade.quantity;
                    }
                }
            }
        }

        FoldedTrades {
            quantity,
            total_cost,
            trades_count,
            first_acquisition,
        }
    }
}
