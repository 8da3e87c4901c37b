//! Risk parameter validation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Portfolio risk limits, validated at configuration time.
///
/// Every constraint here is enforced by [`RiskParameters::validate`]
/// before a client or strategy sees the values, so a bad configuration
/// fails at startup rather than at trade time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskParameters {
    /// Maximum fraction of the portfolio in one position, within [0, 1].
    pub max_position_size_pct: Decimal,
    /// Daily loss fraction that halts trading, within [0, 1].
    pub max_daily_loss_pct: Decimal,
    /// Default stop-loss fraction, within [0, 1].
    pub stop_loss_pct: Decimal,
    /// Default take-profit fraction; must exceed the stop-loss.
    pub take_profit_pct: Decimal,
    /// Maximum simultaneous open orders.
    pub max_open_orders: u32,
    /// Maximum trades per day.
    pub daily_trade_limit: u32,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            max_position_size_pct: dec!(0.05),
            max_daily_loss_pct: dec!(0.02),
            stop_loss_pct: dec!(0.05),
            take_profit_pct: dec!(0.15),
            max_open_orders: 10,
            daily_trade_limit: 10,
        }
    }
}

impl RiskParameters {
    /// Validate all constraints, returning self for chaining.
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }

    /// Check every constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fraction_fields = [
            ("max_position_size_pct", self.max_position_size_pct),
            ("max_daily_loss_pct", self.max_daily_loss_pct),
            ("stop_loss_pct", self.stop_loss_pct),
            ("take_profit_pct", self.take_profit_pct),
        ];
        for (name, value) in fraction_fields {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(ConfigError::InvalidRiskParameter(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if self.take_profit_pct <= self.stop_loss_pct {
            return Err(ConfigError::InvalidRiskParameter(format!(
                "take_profit_pct ({}) must be greater than stop_loss_pct ({})",
                self.take_profit_pct, self.stop_loss_pct
            )));
        }

        if self.max_open_orders == 0 {
            return Err(ConfigError::InvalidRiskParameter(
                "max_open_orders must be at least 1".to_string(),
            ));
        }
        if self.daily_trade_limit == 0 {
            return Err(ConfigError::InvalidRiskParameter(
                "daily_trade_limit must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
