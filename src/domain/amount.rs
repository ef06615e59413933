//! Monetary value types
//!
//! Domain primitives for amounts, limits and balances.
//! `Amount` and `Limit` are validated at construction time, so an invalid
//! deposit or limit can never reach the aggregate's event stream.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Amount represents a strictly positive monetary value.
///
/// # Invariants
/// - Value is always positive (> 0)
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use cqrs_account::domain::Amount;
///
/// let amount = Amount::new(Decimal::new(100, 0)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(100, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

/// Errors that can occur when creating an Amount or a Limit
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be positive (got {0})")]
    NotPositive(Decimal),

    #[error("Limit cannot be negative (got {0})")]
    Negative(Decimal),

    #[error("Invalid amount format: {0}")]
    ParseError(String),
}

impl Amount {
    /// Create a new Amount with validation.
    ///
    /// # Errors
    /// - `AmountError::NotPositive` if value <= 0
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value));
        }
        Ok(Self(value))
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s).map_err(|e| AmountError::ParseError(e.to_string()))?;
        Amount::new(decimal)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Limit represents a non-negative ceiling (overdraft, daily wire transfer).
///
/// An absent limit is modelled as `Option<Limit>::None` by the aggregate,
/// never as a magic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Limit(Decimal);

impl Limit {
    /// Create a new Limit (zero or positive)
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            return Err(AmountError::Negative(value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Remaining allowance once `used` has been consumed. May be negative
    /// if the limit was lowered after funds were spent.
    pub fn remaining(&self, used: Decimal) -> Decimal {
        self.0 - used
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Limit {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Limit::new(value)
    }
}

impl From<Limit> for Decimal {
    fn from(limit: Limit) -> Self {
        limit.0
    }
}

/// Balance represents an account balance.
/// Unlike Amount, Balance is signed: an overdraft drives it below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Balance(Decimal);

impl Balance {
    /// Create a zero balance
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Get the underlying value
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Check if balance covers the amount without touching any overdraft
    pub fn is_sufficient_for(&self, amount: Amount) -> bool {
        self.0 >= amount.value()
    }

    /// Check if balance plus an overdraft allowance covers the amount
    pub fn is_sufficient_with_overdraft(&self, amount: Amount, overdraft: Limit) -> bool {
        match self.0.checked_add(overdraft.value()) {
            Some(available) => available >= amount.value(),
            // Past Decimal::MAX, so above any amount
            None => true,
        }
    }

    /// Balance after a credit, or `None` if it does not fit in a Decimal
    pub fn checked_credit(&self, value: Decimal) -> Option<Balance> {
        self.0.checked_add(value).map(Balance)
    }

    /// Balance after a debit, or `None` if it does not fit in a Decimal
    pub fn checked_debit(&self, value: Decimal) -> Option<Balance> {
        self.0.checked_sub(value).map(Balance)
    }

    /// Saturating credit for event replay. Commands check with
    /// `checked_credit` before raising.
    pub fn credit(&self, value: Decimal) -> Balance {
        Balance(self.0.saturating_add(value))
    }

    /// Saturating debit for event replay. Commands check with
    /// `checked_debit` before raising.
    pub fn debit(&self, value: Decimal) -> Balance {
        Balance(self.0.saturating_sub(value))
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_positive() {
        let amount = Amount::new(dec!(100));
        assert!(amount.is_ok());
        assert_eq!(amount.unwrap().value(), dec!(100));
    }

    #[test]
    fn test_amount_zero_rejected() {
        let amount = Amount::new(Decimal::ZERO);
        assert!(matches!(amount, Err(AmountError::NotPositive(_))));
    }

    #[test]
    fn test_amount_negative_rejected() {
        let amount = Amount::new(dec!(-0.001));
        assert!(matches!(amount, Err(AmountError::NotPositive(_))));
    }

    #[test]
    fn test_amount_tiny_fraction_ok() {
        let amount = Amount::new(dec!(0.0001));
        assert!(amount.is_ok());
    }

    #[test]
    fn test_amount_from_str() {
        let amount: Result<Amount, _> = "123.456".parse();
        assert_eq!(amount.unwrap().value(), dec!(123.456));

        let invalid: Result<Amount, _> = "abc".parse();
        assert!(matches!(invalid, Err(AmountError::ParseError(_))));
    }

    #[test]
    fn test_amount_deserialize_rejects_non_positive() {
        let ok: Amount = serde_json::from_str(r#""99.99""#).unwrap();
        assert_eq!(ok.value(), dec!(99.99));

        let err = serde_json::from_str::<Amount>(r#""0""#);
        assert!(err.is_err());
    }

    #[test]
    fn test_limit_zero_allowed() {
        let limit = Limit::new(Decimal::ZERO).unwrap();
        assert_eq!(limit.value(), Decimal::ZERO);
    }

    #[test]
    fn test_limit_negative_rejected() {
        let limit = Limit::new(dec!(-1));
        assert!(matches!(limit, Err(AmountError::Negative(_))));
    }

    #[test]
    fn test_limit_remaining() {
        let limit = Limit::new(dec!(500)).unwrap();
        assert_eq!(limit.remaining(dec!(499.99)), dec!(0.01));
        assert_eq!(limit.remaining(dec!(600)), dec!(-100));
    }

    #[test]
    fn test_balance_credit_debit_can_go_negative() {
        let balance = Balance::zero().credit(dec!(100));
        assert_eq!(balance.value(), dec!(100));

        let balance = balance.debit(dec!(130));
        assert_eq!(balance.value(), dec!(-30));
    }

    #[test]
    fn test_balance_sufficiency() {
        let balance = Balance::zero().credit(dec!(1000));
        let exact = Amount::new(dec!(4000)).unwrap();
        let over = Amount::new(dec!(4000.01)).unwrap();
        let overdraft = Limit::new(dec!(3000)).unwrap();

        assert!(!balance.is_sufficient_for(exact));
        assert!(balance.is_sufficient_with_overdraft(exact, overdraft));
        assert!(!balance.is_sufficient_with_overdraft(over, overdraft));
    }

    #[test]
    fn test_balance_checked_arithmetic_at_decimal_bounds() {
        let full = Balance::zero().credit(Decimal::MAX);

        assert_eq!(full.checked_credit(dec!(1)), None);
        assert_eq!(full.checked_debit(dec!(1)).map(|b| b.value()), Some(Decimal::MAX - dec!(1)));
        assert_eq!(Balance::zero().checked_debit(Decimal::MAX).map(|b| b.value()), Some(Decimal::MIN));

        let overdraft = Limit::new(dec!(1)).unwrap();
        assert!(full.is_sufficient_with_overdraft(Amount::new(Decimal::MAX).unwrap(), overdraft));
    }
}
