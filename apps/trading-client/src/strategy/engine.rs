//! Rule-based buy/skip/consider scoring.
//!
//! Thin weighted arithmetic over indicator snapshots. Each strategy
//! collects named signals and warnings and maps their counts onto an
//! action; the numbers are tuning constants, not engineering.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::indicators;
use crate::broker::Bar;
use crate::config::RiskParameters;

/// Minimum 1-day move treated as momentum.
const MOMENTUM_MIN_CHANGE_1D: f64 = 2.0;
/// Volume confirmation multiple for momentum entries.
const MOMENTUM_VOLUME_RATIO: f64 = 1.5;
/// RSI floor treated as oversold for mean reversion.
const MEAN_REVERSION_RSI: f64 = 30.0;
/// 5-day drop that counts as a significant decline.
const MEAN_REVERSION_DROP_5D: f64 = -5.0;

/// Available strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Buy strength: momentum with volume confirmation.
    Momentum,
    /// Buy weakness: oversold bounces.
    MeanReversion,
}

/// Strategy verdict for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// High-conviction entry.
    StrongBuy,
    /// Standard entry.
    Buy,
    /// Worth watching, not entering.
    Consider,
    /// No entry.
    Skip,
}

/// Scored decision with its supporting evidence.
#[derive(Debug, Clone)]
pub struct Decision {
    /// The verdict.
    pub action: Action,
    /// Conditions supporting an entry.
    pub signals: Vec<String>,
    /// Conditions arguing against one.
    pub warnings: Vec<String>,
    /// `signals - warnings`.
    pub score: i64,
}

/// Indicator snapshot for one symbol, built from daily bars.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    /// Symbol.
    pub symbol: String,
    /// Latest close.
    pub current_price: f64,
    /// 5-day simple moving average.
    pub sma_5: f64,
    /// 10-day simple moving average.
    pub sma_10: f64,
    /// 20-day simple moving average.
    pub sma_20: f64,
    /// 50-day simple moving average.
    pub sma_50: f64,
    /// 14-period RSI.
    pub rsi: f64,
    /// Upper Bollinger band.
    pub bb_upper: f64,
    /// Middle Bollinger band.
    pub bb_middle: f64,
    /// Lower Bollinger band.
    pub bb_lower: f64,
    /// 1-day percent change.
    pub price_change_1d: f64,
    /// 5-day percent change.
    pub price_change_5d: f64,
    /// 20-day percent change.
    pub price_change_20d: f64,
    /// Latest volume over 20-day average.
    pub volume_ratio: f64,
    /// Where price sits in the 20-day range, 0..1.
    pub position_in_range: f64,
    /// Trend strength, 0..1.
    pub trend_strength: f64,
    /// Momentum composite, 0..100.
    pub momentum_score: f64,
}

impl MarketSnapshot {
    /// Build a snapshot from daily bars, oldest first.
    ///
    /// Returns `None` for an empty bar set.
    #[must_use]
    pub fn from_bars(symbol: impl Into<String>, bars: &[Bar]) -> Option<Self> {
        if bars.is_empty() {
            return None;
        }

        let prices: Vec<f64> = bars.iter().map(|b| decimal_to_f64(b.close)).collect();
        let highs: Vec<f64> = bars.iter().map(|b| decimal_to_f64(b.high)).collect();
        let lows: Vec<f64> = bars.iter().map(|b| decimal_to_f64(b.low)).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();

        let current_price = prices[prices.len() - 1];
        let (bb_upper, bb_middle, bb_lower) = indicators::bollinger_bands(&prices, 20, 2.0);
        let price_change_1d = indicators::percent_change(&prices, 1);
        let price_change_5d = indicators::percent_change(&prices, 5);
        let rsi = indicators::rsi(&prices, 14);
        let volume_ratio = indicators::volume_ratio(&volumes, 20);

        Some(Self {
            symbol: symbol.into(),
            current_price,
            sma_5: indicators::sma(&prices, 5),
            sma_10: indicators::sma(&prices, 10),
            sma_20: indicators::sma(&prices, 20),
            sma_50: indicators::sma(&prices, 50),
            rsi,
            bb_upper,
            bb_middle,
            bb_lower,
            price_change_1d,
            price_change_5d,
            price_change_20d: indicators::percent_change(&prices, 20),
            volume_ratio,
            position_in_range: indicators::position_in_range(&highs, &lows, current_price, 20),
            trend_strength: indicators::trend_strength(&prices),
            momentum_score: momentum_score(price_change_1d, price_change_5d, volume_ratio, rsi),
        })
    }
}

fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Composite momentum score, 0..100.
///
/// Price momentum contributes up to 40, volume confirmation up to 30,
/// RSI placement up to 30.
#[must_use]
pub fn momentum_score(change_1d: f64, change_5d: f64, volume_ratio: f64, rsi: f64) -> f64 {
    let mut price_score = 0.0;
    if change_1d > 2.0 {
        price_score += 20.0;
    } else if change_1d > 0.0 {
        price_score += 10.0;
    }
    if change_5d > 5.0 {
        price_score += 20.0;
    } else if change_5d > 0.0 {
        price_score += 10.0;
    }

    let volume_score = if volume_ratio > 2.0 {
        30.0
    } else if volume_ratio > 1.5 {
        20.0
    } else if volume_ratio > 1.0 {
        10.0
    } else {
        0.0
    };

    let rsi_score = if (50.0..=70.0).contains(&rsi) {
        30.0
    } else if (40.0..50.0).contains(&rsi) {
        20.0
    } else if (30.0..40.0).contains(&rsi) {
        10.0
    } else {
        0.0
    };

    price_score + volume_score + rsi_score
}

/// Evaluate a snapshot under a strategy.
#[must_use]
pub fn evaluate(strategy: StrategyKind, snapshot: &MarketSnapshot) -> Decision {
    match strategy {
        StrategyKind::Momentum => evaluate_momentum(snapshot),
        StrategyKind::MeanReversion => evaluate_mean_reversion(snapshot),
    }
}

fn evaluate_momentum(data: &MarketSnapshot) -> Decision {
    let mut signals = Vec::new();
    let mut warnings = Vec::new();

    if data.price_change_1d >= MOMENTUM_MIN_CHANGE_1D {
        signals.push(format!("Strong daily momentum: +{:.1}%", data.price_change_1d));
    }
    if data.volume_ratio >= MOMENTUM_VOLUME_RATIO {
        signals.push(format!("Volume confirmation: {:.1}x average", data.volume_ratio));
    }
    if data.current_price > data.sma_5 && data.sma_5 > data.sma_10 {
        signals.push("Trend alignment: price > SMA5 > SMA10".to_string());
    }
    if data.rsi > 30.0 && data.rsi < 70.0 {
        signals.push(format!("RSI in good range: {:.1}", data.rsi));
    } else if data.rsi >= 70.0 {
        warnings.push(format!("RSI overbought: {:.1}", data.rsi));
    }
    if data.momentum_score >= 60.0 {
        signals.push(format!("High momentum score: {:.0}", data.momentum_score));
    } else if data.momentum_score < 30.0 {
        warnings.push(format!("Low momentum score: {:.0}", data.momentum_score));
    }

    let action = if signals.len() >= 3 && warnings.is_empty() {
        Action::StrongBuy
    } else if signals.len() >= 2 && warnings.len() <= 1 {
        Action::Buy
    } else if signals.len() > warnings.len() {
        Action::Consider
    } else {
        Action::Skip
    };

    decision(action, signals, warnings)
}

fn evaluate_mean_reversion(data: &MarketSnapshot) -> Decision {
    let mut signals = Vec::new();
    let mut warnings = Vec::new();

    if data.rsi < MEAN_REVERSION_RSI {
        signals.push(format!("RSI oversold: {:.1}", data.rsi));
    }
    if data.current_price < data.bb_lower {
        signals.push("Price below lower Bollinger band".to_string());
    }
    if data.price_change_5d < MEAN_REVERSION_DROP_5D {
        signals.push(format!("Significant decline: {:.1}%", data.price_change_5d));
    }
    if data.position_in_range < 0.3 {
        signals.push("Price near recent low".to_string());
    }

    if data.trend_strength < 0.3 {
        warnings.push("Weak overall trend".to_string());
    }
    if data.volume_ratio < 0.8 {
        warnings.push("Low volume".to_string());
    }

    let action = if signals.len() >= 2 && warnings.len() <= 1 {
        Action::Buy
    } else if !signals.is_empty() && warnings.is_empty() {
        Action::Consider
    } else {
        Action::Skip
    };

    decision(action, signals, warnings)
}

fn decision(action: Action, signals: Vec<String>, warnings: Vec<String>) -> Decision {
    let score = signals.len() as i64 - warnings.len() as i64;
    Decision {
        action,
        signals,
        warnings,
        score,
    }
}

/// Per-day trading counters with an explicit day transition.
///
/// Counters never reset implicitly; callers drive [`DailyCounters::new_day`]
/// when their scheduler rolls over.
#[derive(Debug, Clone)]
pub struct DailyCounters {
    day: NaiveDate,
    trades_executed: u32,
    realized_loss: Decimal,
}

impl DailyCounters {
    /// Start counters for a day.
    #[must_use]
    pub const fn new(day: NaiveDate) -> Self {
        Self {
            day,
            trades_executed: 0,
            realized_loss: Decimal::ZERO,
        }
    }

    /// Roll over to a new day, resetting counters if the day changed.
    pub fn new_day(&mut self, day: NaiveDate) {
        if day != self.day {
            tracing::info!(%day, "resetting daily counters");
            *self = Self::new(day);
        }
    }

    /// The day these counters cover.
    #[must_use]
    pub const fn day(&self) -> NaiveDate {
        self.day
    }

    /// Trades executed today.
    #[must_use]
    pub const fn trades_executed(&self) -> u32 {
        self.trades_executed
    }

    /// Realized losses today (positive number).
    #[must_use]
    pub const fn realized_loss(&self) -> Decimal {
        self.realized_loss
    }

    /// Count an executed trade.
    pub fn record_execution(&mut self) {
        self.trades_executed += 1;
    }

    /// Accumulate a realized loss (pass the loss as a positive amount).
    pub fn record_realized_loss(&mut self, amount: Decimal) {
        if amount > Decimal::ZERO {
            self.realized_loss += amount;
        }
    }

    /// Whether another trade is allowed under the risk limits.
    #[must_use]
    pub fn can_trade(&self, risk: &RiskParameters, portfolio_value: Decimal) -> bool {
        if self.trades_executed >= risk.daily_trade_limit {
            return false;
        }
        let loss_cap = portfolio_value * risk.max_daily_loss_pct;
        self.realized_loss < loss_cap
    }
}
