//! Credential loading from the environment.

use crate::broker::{BrokerConfig, TradingMode};

use super::ConfigError;

/// Environment variable selecting PAPER or LIVE mode.
pub const MODE_ENV_VAR: &str = "MODE";

const PAPER_KEY_VAR: &str = "ALPACA_PAPER_API_KEY";
const PAPER_SECRET_VAR: &str = "ALPACA_PAPER_SECRET";
const LIVE_KEY_VAR: &str = "ALPACA_LIVE_API_KEY";
const LIVE_SECRET_VAR: &str = "ALPACA_LIVE_SECRET";

/// API credentials for one trading mode.
///
/// Immutable per session; switching modes means building a new set and
/// re-validating connectivity through [`crate::broker::TradingClient`].
#[derive(Debug, Clone)]
pub struct Credentials {
    /// API key id.
    pub key_id: String,
    /// API secret.
    pub secret: String,
    /// Mode these credentials belong to.
    pub mode: TradingMode,
}

impl Credentials {
    /// Build credentials explicitly.
    #[must_use]
    pub fn new(key_id: impl Into<String>, secret: impl Into<String>, mode: TradingMode) -> Self {
        Self {
            key_id: key_id.into(),
            secret: secret.into(),
            mode,
        }
    }

    /// Load credentials for the mode selected by the `MODE` variable.
    ///
    /// An absent or unrecognized `MODE` selects paper trading; live mode
    /// must be opted into explicitly.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mode = TradingMode::parse_or_paper(&std::env::var(MODE_ENV_VAR).unwrap_or_default());
        Self::from_env_for(mode)
    }

    /// Load credentials for a specific mode.
    pub fn from_env_for(mode: TradingMode) -> Result<Self, ConfigError> {
        let (key_var, secret_var) = match mode {
            TradingMode::Paper => (PAPER_KEY_VAR, PAPER_SECRET_VAR),
            TradingMode::Live => (LIVE_KEY_VAR, LIVE_SECRET_VAR),
        };

        let key_id = std::env::var(key_var).unwrap_or_default();
        let secret = std::env::var(secret_var).unwrap_or_default();

        Self::from_parts(mode, key_id, secret, key_var, secret_var)
    }

    /// Validate a key/secret pair for a mode, naming the source variables
    /// in the error when either is empty.
    fn from_parts(
        mode: TradingMode,
        key_id: String,
        secret: String,
        key_var: &str,
        secret_var: &str,
    ) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        if key_id.is_empty() {
            missing.push(key_var);
        }
        if secret.is_empty() {
            missing.push(secret_var);
        }
        if !missing.is_empty() {
            return Err(ConfigError::MissingCredentials {
                mode: mode.to_string(),
                vars: missing.join(", "),
            });
        }

        Ok(Self {
            key_id,
            secret,
            mode,
        })
    }

    /// Build a broker configuration from these credentials.
    #[must_use]
    pub fn broker_config(&self) -> BrokerConfig {
        BrokerConfig::new(self.key_id.clone(), self.secret.clone(), self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_credentials_build_broker_config() {
        let credentials = Credentials::new("key", "secret", TradingMode::Paper);
        let config = credentials.broker_config();
        assert_eq!(config.api_key, "key");
        assert_eq!(config.api_secret, "secret");
        assert!(!config.mode.is_live());
    }

    #[test]
    fn missing_variables_are_named_in_the_error() {
        let err = Credentials::from_parts(
            TradingMode::Live,
            String::new(),
            String::new(),
            LIVE_KEY_VAR,
            LIVE_SECRET_VAR,
        )
        .unwrap_err();

        match err {
            ConfigError::MissingCredentials { mode, vars } => {
                assert_eq!(mode, "LIVE");
                assert!(vars.contains(LIVE_KEY_VAR));
                assert!(vars.contains(LIVE_SECRET_VAR));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn partial_credentials_name_only_the_missing_variable() {
        let err = Credentials::from_parts(
            TradingMode::Paper,
            "pk-test".to_string(),
            String::new(),
            PAPER_KEY_VAR,
            PAPER_SECRET_VAR,
        )
        .unwrap_err();

        match err {
            ConfigError::MissingCredentials { vars, .. } => {
                assert!(!vars.contains(PAPER_KEY_VAR));
                assert!(vars.contains(PAPER_SECRET_VAR));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
