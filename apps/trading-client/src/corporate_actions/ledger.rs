//! Chronological corporate-action ledger and position adjustment math.
//!
//! The ledger is pure data plus arithmetic: no I/O, no clock. Callers
//! supply the acquisition and as-of dates; actions whose ex date falls in
//! that window are folded in ascending ex-date order. Splits preserve
//! total cost exactly (modulo decimal rounding); cash dividends accumulate
//! against the share count held at that point in the fold.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::action::{ActionError, ActionType, CorporateAction};

/// Audit record of one action's effect on a position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionAdjustment {
    /// Symbol.
    pub symbol: String,
    /// Action type that caused the adjustment.
    pub action_type: ActionType,
    /// Ex date of the action.
    pub effective_date: NaiveDate,
    /// Quantity before.
    pub quantity_before: Decimal,
    /// Quantity after.
    pub quantity_after: Decimal,
    /// Per-share cost basis before.
    pub cost_basis_before: Decimal,
    /// Per-share cost basis after.
    pub cost_basis_after: Decimal,
    /// Total cost before (quantity x cost basis).
    pub total_cost_before: Decimal,
    /// Total cost after. Equal to `total_cost_before` for splits, up to
    /// rounding.
    pub total_cost_after: Decimal,
    /// Cash received (dividends), zero otherwise.
    pub cash_adjustment: Decimal,
    /// Human-readable summary.
    pub description: String,
}

/// Result of folding all effective actions over a position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustedPosition {
    /// Symbol.
    pub symbol: String,
    /// Quantity before any adjustment.
    pub original_quantity: Decimal,
    /// Per-share cost basis before any adjustment.
    pub original_cost_basis: Decimal,
    /// Quantity after all splits.
    pub adjusted_quantity: Decimal,
    /// Per-share cost basis after all splits.
    pub adjusted_cost_basis: Decimal,
    /// Total cash dividends received.
    pub dividends_received: Decimal,
    /// Ordered audit trail of applied adjustments.
    pub adjustments: Vec<PositionAdjustment>,
}

impl AdjustedPosition {
    /// Number of actions that were applied.
    #[must_use]
    pub fn actions_applied(&self) -> usize {
        self.adjustments.len()
    }
}

/// P&L breakdown for an adjusted position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PnlBreakdown {
    /// The investor's actual cash outlay, unadjusted.
    pub original_total_cost: Decimal,
    /// Adjusted quantity x adjusted cost basis.
    pub adjusted_total_cost: Decimal,
    /// Adjusted quantity x current price.
    pub current_market_value: Decimal,
    /// Market value minus adjusted total cost.
    pub capital_pnl: Decimal,
    /// Total cash dividends received.
    pub dividends_received: Decimal,
    /// Capital P&L plus dividends.
    pub total_pnl: Decimal,
}

/// Percentage returns for an adjusted position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReturnPercentages {
    /// Total P&L over original cost.
    pub total_return_pct: Decimal,
    /// Capital P&L over adjusted cost.
    pub capital_return_pct: Decimal,
    /// Dividends over original cost.
    pub dividend_yield_pct: Decimal,
}

/// Full corporate-action-aware P&L report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PnlReport {
    /// Symbol.
    pub symbol: String,
    /// Acquisition date used for action selection.
    pub acquisition_date: NaiveDate,
    /// As-of date used for action selection.
    pub as_of: NaiveDate,
    /// Adjusted position and audit trail.
    pub position: AdjustedPosition,
    /// P&L breakdown.
    pub breakdown: PnlBreakdown,
    /// Percentage returns.
    pub returns: ReturnPercentages,
}

/// Chronologically ordered corporate actions per symbol.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorporateActionLedger {
    actions: BTreeMap<String, Vec<CorporateAction>>,
}

impl CorporateActionLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an action, keeping the symbol's list sorted by ex date.
    pub fn insert(&mut self, action: CorporateAction) {
        let list = self.actions.entry(action.symbol.clone()).or_default();
        list.push(action);
        list.sort_by_key(|a| a.ex_date);
    }

    /// All actions for a symbol, ascending by ex date.
    #[must_use]
    pub fn actions_for(&self, symbol: &str) -> &[CorporateAction] {
        self.actions.get(symbol).map_or(&[], Vec::as_slice)
    }

    /// Symbols that have at least one action on file.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Total number of actions on file.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.values().map(Vec::len).sum()
    }

    /// Whether the ledger holds no actions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Apply every action effective between acquisition and as-of.
    ///
    /// Actions with `acquisition_date <= ex_date <= as_of` are folded in
    /// ascending ex-date order. Only splits and cash-type dividends move
    /// the numbers; other action types are skipped.
    pub fn apply(
        &self,
        symbol: &str,
        acquisition_date: NaiveDate,
        quantity: Decimal,
        cost_basis: Decimal,
        as_of: NaiveDate,
    ) -> Result<AdjustedPosition, ActionError> {
        let mut working_quantity = quantity;
        let mut working_cost_basis = cost_basis;
        let mut dividends = Decimal::ZERO;
        let mut adjustments = Vec::new();

        let relevant = self
            .actions_for(symbol)
            .iter()
            .filter(|a| a.ex_date >= acquisition_date && a.is_effective_on(as_of));

        for action in relevant {
            match action.action_type {
                ActionType::StockSplit | ActionType::ReverseSplit => {
                    let ratio = action.require_ratio()?;
                    let quantity_before = working_quantity;
                    let cost_basis_before = working_cost_basis;

                    working_quantity =
                        quantity_before * Decimal::from(ratio.to()) / Decimal::from(ratio.from());
                    working_cost_basis =
                        cost_basis_before * Decimal::from(ratio.from()) / Decimal::from(ratio.to());

                    tracing::debug!(
                        symbol = %action.symbol,
                        ratio = %ratio,
                        quantity_before = %quantity_before,
                        quantity_after = %working_quantity,
                        "applied split"
                    );

                    adjustments.push(PositionAdjustment {
                        symbol: action.symbol.clone(),
                        action_type: action.action_type,
                        effective_date: action.ex_date,
                        quantity_before,
                        quantity_after: working_quantity,
                        cost_basis_before,
                        cost_basis_after: working_cost_basis,
                        total_cost_before: quantity_before * cost_basis_before,
                        total_cost_after: working_quantity * working_cost_basis,
                        cash_adjustment: Decimal::ZERO,
                        description: format!("{}: {ratio}", action.action_type),
                    });
                }
                ActionType::CashDividend | ActionType::SpecialDividend => {
                    let amount = action.require_dividend_amount()?;
                    let cash = working_quantity * amount;
                    dividends += cash;

                    adjustments.push(PositionAdjustment {
                        symbol: action.symbol.clone(),
                        action_type: action.action_type,
                        effective_date: action.ex_date,
                        quantity_before: working_quantity,
                        quantity_after: working_quantity,
                        cost_basis_before: working_cost_basis,
                        cost_basis_after: working_cost_basis,
                        total_cost_before: working_quantity * working_cost_basis,
                        total_cost_after: working_quantity * working_cost_basis,
                        cash_adjustment: cash,
                        description: format!("{}: {amount} per share", action.action_type),
                    });
                }
                // Recorded for audit, no positional effect.
                ActionType::StockDividend
                | ActionType::SpinOff
                | ActionType::Merger
                | ActionType::RightsIssue => {}
            }
        }

        Ok(AdjustedPosition {
            symbol: symbol.to_string(),
            original_quantity: quantity,
            original_cost_basis: cost_basis,
            adjusted_quantity: working_quantity,
            adjusted_cost_basis: working_cost_basis,
            dividends_received: dividends,
            adjustments,
        })
    }

    /// Compute corporate-action-adjusted P&L for an acquisition.
    ///
    /// `original_total_cost` is the unadjusted cash outlay; percentage
    /// returns are zero when their denominator is zero.
    #[allow(clippy::similar_names)]
    pub fn adjusted_pnl(
        &self,
        symbol: &str,
        acquisition_date: NaiveDate,
        acquisition_qty: Decimal,
        acquisition_cost_per_share: Decimal,
        current_price: Decimal,
        as_of: NaiveDate,
    ) -> Result<PnlReport, ActionError> {
        let position = self.apply(
            symbol,
            acquisition_date,
            acquisition_qty,
            acquisition_cost_per_share,
            as_of,
        )?;

        let original_total_cost = acquisition_qty * acquisition_cost_per_share;
        let adjusted_total_cost = position.adjusted_quantity * position.adjusted_cost_basis;
        let current_market_value = position.adjusted_quantity * current_price;

        let dividends_received = position.dividends_received;
        let capital_pnl = current_market_value - adjusted_total_cost;
        let total_pnl = capital_pnl + dividends_received;

        let pct = |numerator: Decimal, denominator: Decimal| {
            if denominator > Decimal::ZERO {
                numerator / denominator * Decimal::ONE_HUNDRED
            } else {
                Decimal::ZERO
            }
        };

        let returns = ReturnPercentages {
            total_return_pct: pct(total_pnl, original_total_cost),
            capital_return_pct: pct(capital_pnl, adjusted_total_cost),
            dividend_yield_pct: pct(dividends_received, original_total_cost),
        };

        Ok(PnlReport {
            symbol: symbol.to_string(),
            acquisition_date,
            as_of,
            position,
            breakdown: PnlBreakdown {
                original_total_cost,
                adjusted_total_cost,
                current_market_value,
                capital_pnl,
                dividends_received,
                total_pnl,
            },
            returns,
        })
    }
}
