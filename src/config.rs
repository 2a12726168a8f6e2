use rust_decimal::RoundingStrategy;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::Rate;
use crate::errors::{LedgerError, Result};

/// how the calculator rounds a computed total to currency precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RoundingMode {
    /// 0.005 rounds up to 0.01
    #[default]
    HalfUp,
    /// 0.005 rounds to the nearest even cent
    Bankers,
}

impl RoundingMode {
    pub fn strategy(&self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::Bankers => RoundingStrategy::MidpointNearestEven,
        }
    }
}

/// ledger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// simple interest charged per month of term
    pub interest_rate: Rate,
    pub rounding: RoundingMode,
    /// accept payments dated before the most recent recorded payment
    pub allow_backdated_payments: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            interest_rate: Rate::from_decimal(dec!(0.07)),
            rounding: RoundingMode::HalfUp,
            allow_backdated_payments: true,
        }
    }
}

impl LedgerConfig {
    /// default configuration with a different monthly rate
    pub fn new(interest_rate: Rate) -> Self {
        Self {
            interest_rate,
            ..Self::default()
        }
    }

    pub fn with_rounding(mut self, rounding: RoundingMode) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn with_backdated_payments(mut self, allow: bool) -> Self {
        self.allow_backdated_payments = allow;
        self
    }

    /// load from a json document; missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LedgerConfig = serde_json::from_str(json).map_err(|e| {
            LedgerError::InvalidConfiguration {
                message: e.to_string(),
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| LedgerError::InvalidConfiguration {
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.interest_rate.is_negative() {
            return Err(LedgerError::InvalidConfiguration {
                message: format!("interest rate must not be negative, got {}", self.interest_rate),
            });
        }
        Ok(())
    }
}
