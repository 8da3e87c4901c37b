//! Corporate action events.
//!
//! Splits and dividends are the only action types that adjust a position;
//! the remaining types are tracked for audit but leave quantity and cost
//! basis untouched.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors constructing or applying corporate actions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// Split ratio string could not be parsed.
    ///
    /// A typo'd ratio must never be silently treated as 1:1 - that would
    /// misstate cost basis for every position in the symbol.
    #[error("invalid split ratio {input:?}: expected \"N:M\" or \"N/M\" with positive integers")]
    InvalidRatio {
        /// The offending input.
        input: String,
    },

    /// A split-type action is missing its ratio.
    #[error("{action} for {symbol} has no split ratio")]
    MissingRatio {
        /// Action type name.
        action: String,
        /// Symbol the action applies to.
        symbol: String,
    },

    /// A dividend-type action is missing its per-share amount.
    #[error("{action} for {symbol} has no dividend amount")]
    MissingDividendAmount {
        /// Action type name.
        action: String,
        /// Symbol the action applies to.
        symbol: String,
    },
}

/// Types of corporate actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Forward stock split (e.g. 4:1).
    StockSplit,
    /// Reverse stock split (e.g. 1:10).
    ReverseSplit,
    /// Regular cash dividend.
    CashDividend,
    /// Dividend paid in shares.
    StockDividend,
    /// Spin-off of a subsidiary.
    SpinOff,
    /// Merger or acquisition.
    Merger,
    /// Rights issue.
    RightsIssue,
    /// One-off cash dividend.
    SpecialDividend,
}

impl ActionType {
    /// Whether this action multiplies share counts.
    #[must_use]
    pub const fn is_split(self) -> bool {
        matches!(self, Self::StockSplit | Self::ReverseSplit)
    }

    /// Whether this action pays cash per share.
    #[must_use]
    pub const fn is_cash_dividend(self) -> bool {
        matches!(self, Self::CashDividend | Self::SpecialDividend)
    }

    /// Snake-case name, matching the wire/persistence format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StockSplit => "stock_split",
            Self::ReverseSplit => "reverse_split",
            Self::CashDividend => "cash_dividend",
            Self::StockDividend => "stock_dividend",
            Self::SpinOff => "spin_off",
            Self::Merger => "merger",
            Self::RightsIssue => "rights_issue",
            Self::SpecialDividend => "special_dividend",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed split ratio.
///
/// `"4:1"` means 4 new shares for every 1 old share: `to = 4`, `from = 1`.
/// Serialized back to its `"N:M"` string form in the state file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SplitRatio {
    to: u32,
    from: u32,
}

impl SplitRatio {
    /// Create a ratio from its components.
    pub fn new(to: u32, from: u32) -> Result<Self, ActionError> {
        if to == 0 || from == 0 {
            return Err(ActionError::InvalidRatio {
                input: format!("{to}:{from}"),
            });
        }
        Ok(Self { to, from })
    }

    /// New shares per old share ("4" in "4:1").
    #[must_use]
    pub const fn to(&self) -> u32 {
        self.to
    }

    /// Old shares ("1" in "4:1").
    #[must_use]
    pub const fn from(&self) -> u32 {
        self.from
    }

    /// Quantity multiplier: `to / from`.
    #[must_use]
    pub fn multiplier(&self) -> Decimal {
        Decimal::from(self.to) / Decimal::from(self.from)
    }

    /// Price adjustment factor: `from / to` (inverse of the multiplier).
    #[must_use]
    pub fn price_factor(&self) -> Decimal {
        Decimal::from(self.from) / Decimal::from(self.to)
    }
}

impl std::str::FromStr for SplitRatio {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ActionError::InvalidRatio {
            input: s.to_string(),
        };

        let (to, from) = s
            .split_once(':')
            .or_else(|| s.split_once('/'))
            .ok_or_else(invalid)?;

        let to = to.trim().parse::<u32>().map_err(|_| invalid())?;
        let from = from.trim().parse::<u32>().map_err(|_| invalid())?;

        Self::new(to, from).map_err(|_| invalid())
    }
}

impl std::fmt::Display for SplitRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.to, self.from)
    }
}

impl TryFrom<String> for SplitRatio {
    type Error = ActionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SplitRatio> for String {
    fn from(ratio: SplitRatio) -> Self {
        ratio.to_string()
    }
}

/// A corporate action for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorporateAction {
    /// Symbol the action applies to.
    pub symbol: String,
    /// Action type.
    pub action_type: ActionType,
    /// Announcement date.
    pub announcement_date: NaiveDate,
    /// Ex date; the action is effective on any date >= this.
    pub ex_date: NaiveDate,
    /// Record date.
    #[serde(default)]
    pub record_date: Option<NaiveDate>,
    /// Payment date (dividends).
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    /// Split ratio, present for split-type actions.
    #[serde(default)]
    pub split_ratio: Option<SplitRatio>,
    /// Per-share cash amount, present for dividend-type actions.
    #[serde(default)]
    pub dividend_amount: Option<Decimal>,
    /// Dividend currency.
    #[serde(default = "default_currency")]
    pub dividend_currency: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl CorporateAction {
    /// Create a forward split. The ratio string must parse.
    pub fn stock_split(
        symbol: impl Into<String>,
        ratio: &str,
        announcement_date: NaiveDate,
        ex_date: NaiveDate,
    ) -> Result<Self, ActionError> {
        Ok(Self {
            symbol: symbol.into(),
            action_type: ActionType::StockSplit,
            announcement_date,
            ex_date,
            record_date: None,
            payment_date: None,
            split_ratio: Some(ratio.parse()?),
            dividend_amount: None,
            dividend_currency: default_currency(),
            description: String::new(),
        })
    }

    /// Create a reverse split. The ratio string must parse.
    pub fn reverse_split(
        symbol: impl Into<String>,
        ratio: &str,
        announcement_date: NaiveDate,
        ex_date: NaiveDate,
    ) -> Result<Self, ActionError> {
        let mut action = Self::stock_split(symbol, ratio, announcement_date, ex_date)?;
        action.action_type = ActionType::ReverseSplit;
        Ok(action)
    }

    /// Create a regular cash dividend.
    #[must_use]
    pub fn cash_dividend(
        symbol: impl Into<String>,
        amount: Decimal,
        announcement_date: NaiveDate,
        ex_date: NaiveDate,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            action_type: ActionType::CashDividend,
            announcement_date,
            ex_date,
            record_date: None,
            payment_date: None,
            split_ratio: None,
            dividend_amount: Some(amount),
            dividend_currency: default_currency(),
            description: String::new(),
        }
    }

    /// Create a special (one-off) cash dividend.
    #[must_use]
    pub fn special_dividend(
        symbol: impl Into<String>,
        amount: Decimal,
        announcement_date: NaiveDate,
        ex_date: NaiveDate,
    ) -> Self {
        let mut action = Self::cash_dividend(symbol, amount, announcement_date, ex_date);
        action.action_type = ActionType::SpecialDividend;
        action
    }

    /// Set the record date.
    #[must_use]
    pub const fn with_record_date(mut self, date: NaiveDate) -> Self {
        self.record_date = Some(date);
        self
    }

    /// Set the payment date.
    #[must_use]
    pub const fn with_payment_date(mut self, date: NaiveDate) -> Self {
        self.payment_date = Some(date);
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether the action is effective on the given date.
    #[must_use]
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        date >= self.ex_date
    }

    /// Split ratio, or an error for a split-type action without one.
    ///
    /// A split without a ratio can only come from hand-edited persisted
    /// state; it surfaces as a validation failure rather than a 1:1 no-op.
    pub fn require_ratio(&self) -> Result<SplitRatio, ActionError> {
        self.split_ratio.ok_or_else(|| ActionError::MissingRatio {
            action: self.action_type.to_string(),
            symbol: self.symbol.clone(),
        })
    }

    /// Dividend amount, or an error for a dividend-type action without one.
    pub fn require_dividend_amount(&self) -> Result<Decimal, ActionError> {
        self.dividend_amount
            .ok_or_else(|| ActionError::MissingDividendAmount {
                action: self.action_type.to_string(),
                symbol: self.symbol.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_colon_and_slash_forms() {
        let colon: SplitRatio = "4:1".parse().unwrap();
        assert_eq!(colon.to(), 4);
        assert_eq!(colon.from(), 1);

        let slash: SplitRatio = "3/2".parse().unwrap();
        assert_eq!(slash.to(), 3);
        assert_eq!(slash.from(), 2);
    }

    #[test]
    fn malformed_ratios_are_hard_errors() {
        for input in ["", "4", "4:", ":1", "a:b", "4:1:2", "4.5:1", "0:1", "4:0", "-4:1"] {
            let parsed = input.parse::<SplitRatio>();
            assert!(parsed.is_err(), "{input:?} should not parse");
        }
    }

    #[test]
    fn multiplier_and_price_factor_are_inverses() {
        let ratio: SplitRatio = "4:1".parse().unwrap();
        assert_eq!(ratio.multiplier(), dec!(4));
        assert_eq!(ratio.price_factor(), dec!(0.25));
        assert_eq!(ratio.multiplier() * ratio.price_factor(), dec!(1));

        let reverse: SplitRatio = "1:10".parse().unwrap();
        assert_eq!(reverse.multiplier(), dec!(0.1));
        assert_eq!(reverse.price_factor(), dec!(10));
    }

    #[test]
    fn ratio_round_trips_through_json() {
        let ratio: SplitRatio = "4:1".parse().unwrap();
        let json = serde_json::to_string(&ratio).unwrap();
        assert_eq!(json, "\"4:1\"");
        let back: SplitRatio = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ratio);
    }

    #[test]
    fn split_constructor_rejects_bad_ratio() {
        let err = CorporateAction::stock_split("AAPL", "four:one", date(2020, 7, 30), date(2020, 8, 31));
        assert!(matches!(err, Err(ActionError::InvalidRatio { .. })));
    }

    #[test]
    fn effectiveness_is_inclusive_of_ex_date() {
        let action = CorporateAction::stock_split("AAPL", "4:1", date(2020, 7, 30), date(2020, 8, 31))
            .unwrap();
        assert!(!action.is_effective_on(date(2020, 8, 30)));
        assert!(action.is_effective_on(date(2020, 8, 31)));
        assert!(action.is_effective_on(date(2021, 1, 1)));
    }

    #[test]
    fn dividend_requires_amount() {
        let dividend = CorporateAction::cash_dividend("AAPL", dec!(0.24), date(2023, 10, 26), date(2023, 11, 10));
        assert_eq!(dividend.require_dividend_amount().unwrap(), dec!(0.24));

        let mut broken = dividend;
        broken.dividend_amount = None;
        assert!(matches!(
            broken.require_dividend_amount(),
            Err(ActionError::MissingDividendAmount { .. })
        ));
    }
}
