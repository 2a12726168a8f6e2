use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

use crate::errors::{LedgerError, Result};

/// decimal places carried by every currency amount
pub const CURRENCY_DP: u32 = 2;

/// Money type with 2 decimal places, rounded half-up (away from zero)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);
    pub const CENT: Money = Money(Decimal::from_parts(1, 0, 0, false, 2));

    /// create from decimal, rounding half-up to currency precision
    pub fn from_decimal(d: Decimal) -> Self {
        Money::normalize(d.round_dp_with_strategy(CURRENCY_DP, RoundingStrategy::MidpointAwayFromZero))
    }

    /// create from integer amount (pesos, dollars, ...)
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// create from minor amount (cents)
    pub fn from_minor(amount: i64) -> Self {
        Money(Decimal::new(amount, CURRENCY_DP))
    }

    /// parse user-entered text such as "1,250.50"
    ///
    /// Thousands separators and surrounding whitespace are ignored. Anything
    /// that is not a plain decimal number is rejected as invalid input.
    pub fn parse(text: &str) -> Result<Self> {
        let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
        if cleaned.is_empty() {
            return Err(LedgerError::invalid_input("amount is empty"));
        }
        Decimal::from_str(&cleaned)
            .map(Money::from_decimal)
            .map_err(|_| LedgerError::invalid_input(format!("'{}' is not a valid amount", text.trim())))
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// strictly less than zero
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// None on overflow
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Money::normalize)
    }

    /// None on overflow
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Money::normalize)
    }

    /// subtraction that refuses to go below zero
    pub fn checked_sub_non_negative(self, other: Self) -> Option<Self> {
        let result = self.checked_sub(other)?;
        if result.is_negative() {
            None
        } else {
            Some(result)
        }
    }

    /// render with thousands separators at fixed currency precision, e.g. "1,840.00"
    pub fn to_grouped_string(&self) -> String {
        let fixed = format!("{:.2}", self.0);
        let (sign, unsigned) = match fixed.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", fixed.as_str()),
        };
        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        format!("{}{}.{}", sign, grouped, fraction)
    }

    // rust_decimal keeps a sign bit on zero; collapse it so -0.00 never leaks out
    fn normalize(d: Decimal) -> Self {
        if d.is_zero() {
            Money(Decimal::new(0, CURRENCY_DP))
        } else {
            Money(d)
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Money::parse(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl From<i32> for Money {
    fn from(i: i32) -> Self {
        Money::from_major(i as i64)
    }
}

impl From<u32> for Money {
    fn from(i: u32) -> Self {
        Money::from_major(i as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money::normalize(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money::normalize(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        *self = *self - other;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money::normalize(-self.0)
    }
}

impl Mul<Decimal> for Money {
    type Output = Money;

    fn mul(self, other: Decimal) -> Money {
        Money::from_decimal(self.0 * other)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + *m)
    }
}

/// rate type for interest rates (0.07 for 7%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);

    /// create from decimal (e.g., 0.07 for 7%)
    pub fn from_decimal(d: Decimal) -> Self {
        Rate(d)
    }

    /// create from percentage (e.g., 7 for 7%)
    pub fn from_percentage(p: u32) -> Self {
        Rate(Decimal::from(p) / Decimal::from(100))
    }

    /// create from basis points (e.g., 700 for 7%)
    pub fn from_bps(bps: u32) -> Self {
        Rate(Decimal::from(bps) / Decimal::from(10000))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn as_percentage(&self) -> Decimal {
        self.0 * Decimal::from(100)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage().normalize())
    }
}

impl From<Decimal> for Rate {
    fn from(d: Decimal) -> Self {
        Rate::from_decimal(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_precision() {
        let m = Money::from_decimal(dec!(100.125));
        assert_eq!(m.to_string(), "100.13"); // half-up

        let m = Money::from_decimal(dec!(100.124));
        assert_eq!(m.to_string(), "100.12");
    }

    #[test]
    fn test_parse_user_input() {
        assert_eq!(Money::parse("1,250.50").unwrap(), Money::from_minor(125_050));
        assert_eq!(Money::parse("  300 ").unwrap(), Money::from_major(300));
        assert!(Money::parse("abc").is_err());
        assert!(Money::parse("").is_err());
        assert!(Money::parse("12.5.1").is_err());
    }

    #[test]
    fn test_no_negative_zero() {
        let zero = Money::from_major(400) - Money::from_major(400);
        assert_eq!(zero.to_string(), "0.00");

        let neg_zero = -Money::ZERO;
        assert_eq!(neg_zero.to_string(), "0.00");
        assert_eq!(neg_zero.to_grouped_string(), "0.00");
    }

    #[test]
    fn test_grouped_string() {
        assert_eq!(Money::from_major(1840).to_grouped_string(), "1,840.00");
        assert_eq!(Money::from_minor(123_456_789).to_grouped_string(), "1,234,567.89");
        assert_eq!(Money::from_major(999).to_grouped_string(), "999.00");
        assert_eq!(Money::from_major(-1500).to_grouped_string(), "-1,500.00");
    }

    #[test]
    fn test_checked_sub_non_negative() {
        let fifty = Money::from_major(50);
        assert_eq!(fifty.checked_sub_non_negative(Money::from_major(20)), Some(Money::from_major(30)));
        assert_eq!(fifty.checked_sub_non_negative(fifty), Some(Money::ZERO));
        assert_eq!(fifty.checked_sub_non_negative(Money::from_major(100)), None);
    }

    #[test]
    fn test_rate_display() {
        assert_eq!(Rate::from_percentage(7).to_string(), "7%");
        assert_eq!(Rate::from_bps(750).as_decimal(), dec!(0.075));
    }
}
