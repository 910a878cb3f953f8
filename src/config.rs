use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::Rate;
use crate::errors::{LoanError, Result};

/// lending policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingConfig {
    /// rate assigned to every new application, borrowers never choose it
    pub default_annual_rate: Rate,
    /// how many times a posting retries after a lost-update conflict
    pub max_conflict_retries: u32,
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            default_annual_rate: Rate::from_percent(dec!(15.0)),
            max_conflict_retries: 3,
        }
    }
}

impl LendingConfig {
    /// config with a different policy rate
    pub fn with_rate(rate: Rate) -> Self {
        Self {
            default_annual_rate: rate,
            ..Self::default()
        }
    }

    /// load from json, missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LendingConfig =
            serde_json::from_str(json).map_err(|e| LoanError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_annual_rate.is_negative() {
            return Err(LoanError::InvalidConfiguration {
                message: format!("default rate {} is negative", self.default_annual_rate),
            });
        }
        Ok(())
    }
}
