//! Balance replay and drift reporting.
//!
//! Reconciliation treats the transaction history as the source of truth and
//! the stored balance column as a cached projection; this module holds the
//! pure comparison types the auditor builds its reports from.

use rust_decimal::Decimal;
use serde::Serialize;
use tutorpay_shared::types::Currency;

pub use crate::wallet::balance::replay;

/// Comparison of a stored balance against its recomputed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceDiff {
    /// Currency the balances are denominated in.
    pub currency: Currency,
    /// Balance currently stored on the account row.
    pub stored: Decimal,
    /// Balance recomputed by replaying successful entries.
    pub computed: Decimal,
    /// `stored - computed`; zero when the projection is clean.
    pub delta: Decimal,
}

impl BalanceDiff {
    /// Builds a diff from a stored and a recomputed balance.
    #[must_use]
    pub fn new(currency: Currency, stored: Decimal, computed: Decimal) -> Self {
        Self {
            currency,
            stored,
            computed,
            delta: stored - computed,
        }
    }

    /// Returns true when stored and computed balances agree.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.delta.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_clean_diff() {
        let diff = BalanceDiff::new(Currency::Ngn, dec!(200), dec!(200));
        assert!(diff.is_clean());
        assert_eq!(diff.delta, Decimal::ZERO);
    }

    #[test]
    fn test_drift_is_signed() {
        let over = BalanceDiff::new(Currency::Ngn, dec!(250), dec!(200));
        assert_eq!(over.delta, dec!(50));
        assert!(!over.is_clean());

        let under = BalanceDiff::new(Currency::Ngn, dec!(150), dec!(200));
        assert_eq!(under.delta, dec!(-50));
    }
}
