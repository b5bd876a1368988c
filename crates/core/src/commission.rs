//! Commission split contract for sale credits.
//!
//! The commission calculator itself is an external collaborator; the engine
//! only consumes the split and credits `seller_earnings` to the wallet when
//! a sale completes. A fixed-rate implementation ships for tests and the
//! demo credit path.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tutorpay_shared::types::Money;

/// Result of splitting a gross sale amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSplit {
    /// The platform's cut of the sale.
    pub platform_commission: Money,
    /// The amount credited to the seller's wallet.
    pub seller_earnings: Money,
}

/// Computes the platform/seller split for a gross sale amount.
pub trait CommissionCalculator: Send + Sync {
    /// Splits a gross sale amount into platform commission and seller
    /// earnings, both in the sale currency.
    fn split(&self, gross: Money) -> CommissionSplit;
}

/// Fixed-rate commission: the platform takes a flat percentage of every sale.
#[derive(Debug, Clone, Copy)]
pub struct FixedRateCommission {
    /// Platform cut in basis points (2000 = 20%).
    rate_bps: u32,
}

impl FixedRateCommission {
    /// Creates a calculator with the given platform cut in basis points.
    #[must_use]
    pub const fn new(rate_bps: u32) -> Self {
        Self { rate_bps }
    }
}

impl CommissionCalculator for FixedRateCommission {
    fn split(&self, gross: Money) -> CommissionSplit {
        let commission = (gross.amount * Decimal::from(self.rate_bps) / Decimal::from(10_000u32))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        CommissionSplit {
            platform_commission: Money::new(commission, gross.currency),
            seller_earnings: Money::new(gross.amount - commission, gross.currency),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use tutorpay_shared::types::Currency;

    #[test]
    fn test_twenty_percent_split() {
        let calc = FixedRateCommission::new(2_000);
        let split = calc.split(Money::new(dec!(1000), Currency::Ngn));
        assert_eq!(split.platform_commission.amount, dec!(200.00));
        assert_eq!(split.seller_earnings.amount, dec!(800.00));
        assert_eq!(split.seller_earnings.currency, Currency::Ngn);
    }

    #[test]
    fn test_zero_rate_gives_seller_everything() {
        let calc = FixedRateCommission::new(0);
        let split = calc.split(Money::new(dec!(59.99), Currency::Usd));
        assert_eq!(split.platform_commission.amount, dec!(0.00));
        assert_eq!(split.seller_earnings.amount, dec!(59.99));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Commission plus earnings always reconstructs the gross amount.
        #[test]
        fn prop_split_sums_to_gross(
            amount in (1i64..1_000_000_000i64).prop_map(|n| Decimal::new(n, 2)),
            rate_bps in 0u32..=10_000,
        ) {
            let calc = FixedRateCommission::new(rate_bps);
            let split = calc.split(Money::new(amount, Currency::Ngn));
            prop_assert_eq!(
                split.platform_commission.amount + split.seller_earnings.amount,
                amount
            );
        }

        /// Neither side of the split goes negative for sub-100% rates.
        #[test]
        fn prop_split_non_negative(
            amount in (1i64..1_000_000_000i64).prop_map(|n| Decimal::new(n, 2)),
            rate_bps in 0u32..10_000,
        ) {
            let calc = FixedRateCommission::new(rate_bps);
            let split = calc.split(Money::new(amount, Currency::Ngn));
            prop_assert!(split.platform_commission.amount >= Decimal::ZERO);
            prop_assert!(split.seller_earnings.amount >= Decimal::ZERO);
        }
    }
}
