//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Represents a monetary amount with currency.
///
/// Uses `Decimal` internally to avoid floating-point precision errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount in major currency units (e.g., naira, dollars).
    pub amount: Decimal,
    /// ISO 4217 currency code (e.g., "NGN", "USD").
    pub currency: Currency,
}

/// ISO 4217 currency codes supported by the wallet.
///
/// Accounts hold one balance in their local currency plus fixed
/// USD and GBP balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Nigerian Naira
    Ngn,
    /// US Dollar
    Usd,
    /// British Pound
    Gbp,
    /// Ghanaian Cedi
    Ghs,
    /// Kenyan Shilling
    Kes,
}

impl Money {
    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative()
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }
}

impl Currency {
    /// Returns true if this currency is one of the fixed secondary
    /// balances every account carries (USD, GBP).
    #[must_use]
    pub const fn is_secondary(self) -> bool {
        matches!(self, Self::Usd | Self::Gbp)
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ngn => write!(f, "NGN"),
            Self::Usd => write!(f, "USD"),
            Self::Gbp => write!(f, "GBP"),
            Self::Ghs => write!(f, "GHS"),
            Self::Kes => write!(f, "KES"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NGN" => Ok(Self::Ngn),
            "USD" => Ok(Self::Usd),
            "GBP" => Ok(Self::Gbp),
            "GHS" => Ok(Self::Ghs),
            "KES" => Ok(Self::Kes),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_money_new() {
        let amount = dec!(1000.00);
        let money = Money::new(amount, Currency::Ngn);
        assert_eq!(money.amount, amount);
        assert_eq!(money.currency, Currency::Ngn);
    }

    #[test]
    fn test_money_zero() {
        let money = Money::zero(Currency::Usd);
        assert!(money.is_zero());
        assert_eq!(money.amount, Decimal::ZERO);
        assert_eq!(money.currency, Currency::Usd);
    }

    #[test]
    fn test_money_sign_checks() {
        assert!(Money::new(dec!(10), Currency::Ngn).is_positive());
        assert!(!Money::new(dec!(0), Currency::Ngn).is_positive());
        assert!(Money::new(dec!(-10), Currency::Ngn).is_negative());
        assert!(!Money::new(dec!(10), Currency::Ngn).is_negative());
    }

    #[rstest]
    #[case(Currency::Ngn, "NGN")]
    #[case(Currency::Usd, "USD")]
    #[case(Currency::Gbp, "GBP")]
    #[case(Currency::Ghs, "GHS")]
    #[case(Currency::Kes, "KES")]
    fn test_currency_display_roundtrip(#[case] currency: Currency, #[case] code: &str) {
        assert_eq!(currency.to_string(), code);
        assert_eq!(Currency::from_str(code).unwrap(), currency);
    }

    #[test]
    fn test_currency_from_str_case_insensitive() {
        assert_eq!(Currency::from_str("ngn").unwrap(), Currency::Ngn);
        assert_eq!(Currency::from_str("usd").unwrap(), Currency::Usd);
        assert!(Currency::from_str("XXX").is_err());
        assert!(Currency::from_str("").is_err());
    }

    #[test]
    fn test_secondary_currencies() {
        assert!(Currency::Usd.is_secondary());
        assert!(Currency::Gbp.is_secondary());
        assert!(!Currency::Ngn.is_secondary());
        assert!(!Currency::Ghs.is_secondary());
    }
}
