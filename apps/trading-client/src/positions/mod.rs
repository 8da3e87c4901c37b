//! Position tracking: trade log, derived positions, and persistence.

pub mod records;
pub mod store;
pub mod tracker;

pub use records::{
    CachedPnl, PnlOutcome, PortfolioEntry, PortfolioSummary, Position, TradeKind, TradeRecord,
};
pub use store::{StoreError, TrackerState};
pub use tracker::{OrderHistory, PositionTracker, TrackerError};
