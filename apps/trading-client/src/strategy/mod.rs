//! Rule-based strategy scoring over indicator snapshots.

pub mod engine;
pub mod indicators;

pub use engine::{
    Action, DailyCounters, Decision, MarketSnapshot, StrategyKind, evaluate, momentum_score,
};
