//! Transfer fee schedule.
//!
//! Fees are proportional, expressed in basis points of the requested amount,
//! and rounded to two decimal places (all supported currencies are 2-dp).

use rust_decimal::{Decimal, RoundingStrategy};

const BPS_DENOMINATOR: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Computes the transfer fee for a payout amount.
#[must_use]
pub fn transfer_fee(amount: Decimal, fee_bps: u32) -> Decimal {
    (amount * Decimal::from(fee_bps) / BPS_DENOMINATOR)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Computes the amount that reaches the destination after the fee.
#[must_use]
pub fn net_amount(amount: Decimal, fee_bps: u32) -> Decimal {
    amount - transfer_fee(amount, fee_bps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(1000), 150, dec!(15.00))]
    #[case(dec!(1000), 0, dec!(0))]
    #[case(dec!(200), 100, dec!(2.00))]
    #[case(dec!(0.01), 150, dec!(0.00))]
    fn test_transfer_fee(#[case] amount: Decimal, #[case] bps: u32, #[case] expected: Decimal) {
        assert_eq!(transfer_fee(amount, bps), expected);
    }

    #[test]
    fn test_net_amount() {
        assert_eq!(net_amount(dec!(1000), 150), dec!(985.00));
        assert_eq!(net_amount(dec!(1000), 0), dec!(1000));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Fee plus net always reconstructs the gross amount.
        #[test]
        fn prop_fee_plus_net_is_gross(
            amount in (1i64..1_000_000_000i64).prop_map(|n| Decimal::new(n, 2)),
            bps in 0u32..10_000,
        ) {
            prop_assert_eq!(transfer_fee(amount, bps) + net_amount(amount, bps), amount);
        }

        /// The fee never exceeds the amount for sub-100% rates.
        #[test]
        fn prop_fee_bounded(
            amount in (1i64..1_000_000_000i64).prop_map(|n| Decimal::new(n, 2)),
            bps in 0u32..10_000,
        ) {
            let fee = transfer_fee(amount, bps);
            prop_assert!(fee >= Decimal::ZERO);
            prop_assert!(net_amount(amount, bps) >= Decimal::ZERO);
        }
    }
}
