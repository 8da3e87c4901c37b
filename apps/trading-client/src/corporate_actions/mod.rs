//! Corporate actions: split/dividend events and position adjustment math.

pub mod action;
pub mod ledger;

pub use action::{ActionError, ActionType, CorporateAction, SplitRatio};
pub use ledger::{
    AdjustedPosition, CorporateActionLedger, PnlBreakdown, PnlReport, PositionAdjustment,
    ReturnPercentages,
};
