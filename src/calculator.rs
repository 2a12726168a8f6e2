//! Simple-interest loan calculator.
//!
//! `total = principal * (1 + rate * term_months)`, rounded once to currency
//! precision with the configured [`RoundingMode`]. Rounding happens a single
//! time on the final product so recomputing from the same inputs is stable.

use rust_decimal::Decimal;

use crate::config::{LedgerConfig, RoundingMode};
use crate::decimal::{Money, Rate, CURRENCY_DP};
use crate::errors::{LedgerError, Result};

/// parse a user-entered term ("12") into whole months
pub fn parse_term(text: &str) -> Result<u32> {
    let trimmed = text.trim();
    let months: u32 = trimmed
        .parse()
        .map_err(|_| LedgerError::invalid_input(format!("'{}' is not a valid term in months", trimmed)))?;
    if months == 0 {
        return Err(LedgerError::invalid_input("term must be at least one month"));
    }
    Ok(months)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanCalculator {
    rate: Rate,
    rounding: RoundingMode,
}

impl LoanCalculator {
    pub fn new(rate: Rate, rounding: RoundingMode) -> Self {
        Self { rate, rounding }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.interest_rate, config.rounding)
    }

    pub fn rate(&self) -> Rate {
        self.rate
    }

    /// total owed over the full term
    pub fn compute_total(&self, principal: Money, term_months: u32) -> Result<Money> {
        compute_total_with(principal, term_months, self.rate, self.rounding)
    }

    /// interest portion of the total
    pub fn interest(&self, principal: Money, term_months: u32) -> Result<Money> {
        Ok(self.compute_total(principal, term_months)? - principal)
    }
}

impl Default for LoanCalculator {
    fn default() -> Self {
        Self::from_config(&LedgerConfig::default())
    }
}

/// compute total with an explicit rate and rounding mode
pub fn compute_total_with(
    principal: Money,
    term_months: u32,
    rate: Rate,
    rounding: RoundingMode,
) -> Result<Money> {
    if !principal.is_positive() {
        return Err(LedgerError::invalid_input(format!(
            "principal must be positive, got {}",
            principal
        )));
    }
    if term_months == 0 {
        return Err(LedgerError::invalid_input("term must be at least one month"));
    }
    if rate.is_negative() {
        return Err(LedgerError::invalid_input(format!("rate must not be negative, got {}", rate)));
    }

    let overflow = || LedgerError::invalid_input("total overflows currency range");
    let factor = rate
        .as_decimal()
        .checked_mul(Decimal::from(term_months))
        .and_then(|interest| interest.checked_add(Decimal::ONE))
        .ok_or_else(overflow)?;
    let total = principal.as_decimal().checked_mul(factor).ok_or_else(overflow)?;

    Ok(Money::from_decimal(total.round_dp_with_strategy(CURRENCY_DP, rounding.strategy())))
}

/// compute total with the default 7% rate, rounding half-up
pub fn compute_total(principal: Money, term_months: u32) -> Result<Money> {
    LoanCalculator::default().compute_total(principal, term_months)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reference_total() {
        let total = compute_total(Money::from_major(1000), 12).unwrap();
        assert_eq!(total, Money::from_decimal(dec!(1840.00)));
        assert_eq!(total.to_string(), "1840.00");
    }

    #[test]
    fn test_interest_portion() {
        let calc = LoanCalculator::default();
        let interest = calc.interest(Money::from_major(5000), 3).unwrap();
        assert_eq!(interest, Money::from_major(1050));
    }

    #[test]
    fn test_rounding_modes_differ_on_midpoint() {
        // 1.50 * 1.05 = 1.575 is an exact midpoint
        let principal = Money::from_minor(150);
        let rate = Rate::from_percentage(5);
        let half_up = compute_total_with(principal, 1, rate, RoundingMode::HalfUp).unwrap();
        let bankers = compute_total_with(principal, 1, rate, RoundingMode::Bankers).unwrap();
        assert_eq!(half_up, Money::from_decimal(dec!(1.58)));
        assert_eq!(bankers, Money::from_decimal(dec!(1.58)));

        // 1.30 * 1.05 = 1.365 rounds to the even cent under bankers
        let principal = Money::from_minor(130);
        let half_up = compute_total_with(principal, 1, rate, RoundingMode::HalfUp).unwrap();
        let bankers = compute_total_with(principal, 1, rate, RoundingMode::Bankers).unwrap();
        assert_eq!(half_up, Money::from_decimal(dec!(1.37)));
        assert_eq!(bankers, Money::from_decimal(dec!(1.36)));
    }

    #[test]
    fn test_repeated_computation_is_stable() {
        let calc = LoanCalculator::default();
        let principal = Money::from_decimal(dec!(1234.56));
        let first = calc.compute_total(principal, 7).unwrap();
        for _ in 0..10 {
            assert_eq!(calc.compute_total(principal, 7).unwrap(), first);
        }
    }

    #[test]
    fn test_invalid_inputs() {
        let err = compute_total(Money::ZERO, 12).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = compute_total(Money::from_major(-5), 12).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = compute_total(Money::from_major(1000), 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_absurd_rate_overflows_cleanly() {
        let rate = Rate::from_decimal(Decimal::MAX);
        let err = compute_total_with(Money::from_major(1), u32::MAX, rate, RoundingMode::HalfUp).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = compute_total_with(Money::from_major(1), 1, rate, RoundingMode::HalfUp).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_parse_term() {
        assert_eq!(parse_term(" 12 ").unwrap(), 12);
        assert!(parse_term("0").is_err());
        assert!(parse_term("-3").is_err());
        assert!(parse_term("twelve").is_err());
        assert!(parse_term("1.5").is_err());
    }
}
