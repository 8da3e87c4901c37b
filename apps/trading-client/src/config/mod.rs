//! Environment-driven configuration.
//!
//! Mode selection and credentials come from the environment; risk
//! parameters validate at construction time so a bad configuration can
//! never surface mid-trade.

mod credentials;
mod risk;

pub use credentials::{Credentials, MODE_ENV_VAR};
pub use risk::RiskParameters;

use thiserror::Error;

/// Errors raised while building configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required credential environment variables are unset.
    #[error("missing credentials for {mode} mode: {vars}")]
    MissingCredentials {
        /// Mode being configured.
        mode: String,
        /// Comma-separated names of the missing variables.
        vars: String,
    },

    /// A risk parameter is out of range or inconsistent.
    #[error("invalid risk parameter: {0}")]
    InvalidRiskParameter(String),
}
