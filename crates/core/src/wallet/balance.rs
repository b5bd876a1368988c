//! Balance arithmetic with overdraft protection.
//!
//! Every stored balance is a cached projection of the transaction history;
//! the functions here define the single arithmetic both the mutator and the
//! reconciliation replay agree on.

use rust_decimal::Decimal;
use tutorpay_shared::types::Currency;

use super::entry::{EntryDirection, EntryStatus};
use super::error::LedgerError;

/// Which balance column of the account a currency maps to.
///
/// Accounts carry one local-currency balance plus fixed USD and GBP
/// balances. The local currency wins when it collides with a secondary
/// currency (an account whose local currency is USD keeps USD amounts in
/// its local slot).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceSlot {
    /// The account's local-currency balance.
    Local,
    /// The fixed USD balance.
    Usd,
    /// The fixed GBP balance.
    Gbp,
}

/// Resolves the balance slot for an operation currency.
///
/// # Errors
///
/// Returns `UnsupportedCurrency` when the currency is neither the account's
/// local currency nor one of the fixed secondary currencies.
pub fn balance_slot(local: Currency, currency: Currency) -> Result<BalanceSlot, LedgerError> {
    if currency == local {
        return Ok(BalanceSlot::Local);
    }
    match currency {
        Currency::Usd => Ok(BalanceSlot::Usd),
        Currency::Gbp => Ok(BalanceSlot::Gbp),
        _ => Err(LedgerError::UnsupportedCurrency { currency, local }),
    }
}

/// Returns the signed balance effect of an entry: credits count positive,
/// debits negative.
#[must_use]
pub fn signed_amount(direction: EntryDirection, amount: Decimal) -> Decimal {
    match direction {
        EntryDirection::Credit => amount,
        EntryDirection::Debit => -amount,
    }
}

/// Computes the balance after applying one entry.
///
/// # Errors
///
/// - `NonPositiveAmount` when `amount <= 0`.
/// - `InsufficientFunds` when a debit would drive the balance negative.
///   Overdraft is never permitted and amounts are never clipped.
pub fn balance_after(
    before: Decimal,
    direction: EntryDirection,
    amount: Decimal,
) -> Result<Decimal, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(amount));
    }
    if direction == EntryDirection::Debit && before < amount {
        return Err(LedgerError::InsufficientFunds {
            available: before,
            requested: amount,
        });
    }
    Ok(before + signed_amount(direction, amount))
}

/// Replays a sequence of entries in order, folding only `successful` ones
/// into the balance, starting from zero.
///
/// This is the reconciliation definition of an account balance: pending,
/// failed, and cancelled entries are retained for audit but never counted.
#[must_use]
pub fn replay<I>(entries: I) -> Decimal
where
    I: IntoIterator<Item = (EntryDirection, EntryStatus, Decimal)>,
{
    entries
        .into_iter()
        .filter(|(_, status, _)| status.counts_toward_balance())
        .fold(Decimal::ZERO, |acc, (direction, _, amount)| {
            acc + signed_amount(direction, amount)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..1_000_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn direction_strategy() -> impl Strategy<Value = EntryDirection> {
        prop_oneof![Just(EntryDirection::Credit), Just(EntryDirection::Debit)]
    }

    fn status_strategy() -> impl Strategy<Value = EntryStatus> {
        prop_oneof![
            Just(EntryStatus::Pending),
            Just(EntryStatus::Successful),
            Just(EntryStatus::Failed),
            Just(EntryStatus::Cancelled),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// The balance after any accepted entry is never negative when the
        /// starting balance is non-negative.
        #[test]
        fn prop_no_overdraft(
            before in (0i64..1_000_000_000i64).prop_map(|n| Decimal::new(n, 2)),
            direction in direction_strategy(),
            amount in amount_strategy(),
        ) {
            match balance_after(before, direction, amount) {
                Ok(after) => prop_assert!(after >= Decimal::ZERO),
                Err(LedgerError::InsufficientFunds { available, requested }) => {
                    prop_assert_eq!(available, before);
                    prop_assert_eq!(requested, amount);
                    prop_assert!(direction == EntryDirection::Debit && before < amount);
                }
                Err(e) => prop_assert!(false, "unexpected error: {e}"),
            }
        }

        /// A debit fails exactly when it exceeds the available balance.
        #[test]
        fn prop_debit_boundary(
            before in (0i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2)),
            amount in amount_strategy(),
        ) {
            let result = balance_after(before, EntryDirection::Debit, amount);
            prop_assert_eq!(result.is_ok(), amount <= before);
        }

        /// Credit then equal debit restores the starting balance.
        #[test]
        fn prop_credit_debit_roundtrip(
            before in (0i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2)),
            amount in amount_strategy(),
        ) {
            let credited = balance_after(before, EntryDirection::Credit, amount).unwrap();
            let restored = balance_after(credited, EntryDirection::Debit, amount).unwrap();
            prop_assert_eq!(restored, before);
        }

        /// Replay counts successful entries only.
        #[test]
        fn prop_replay_ignores_non_successful(
            entries in prop::collection::vec(
                (direction_strategy(), status_strategy(), amount_strategy()),
                0..30,
            ),
        ) {
            let expected: Decimal = entries
                .iter()
                .filter(|(_, s, _)| *s == EntryStatus::Successful)
                .map(|(d, _, a)| signed_amount(*d, *a))
                .sum();
            prop_assert_eq!(replay(entries), expected);
        }

        /// Non-positive amounts are always rejected.
        #[test]
        fn prop_non_positive_rejected(
            before in (0i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2)),
            direction in direction_strategy(),
            amount in (-1_000_000i64..=0i64).prop_map(|n| Decimal::new(n, 2)),
        ) {
            prop_assert!(matches!(
                balance_after(before, direction, amount),
                Err(LedgerError::NonPositiveAmount(_))
            ));
        }
    }

    #[test]
    fn test_slot_resolution() {
        assert_eq!(
            balance_slot(Currency::Ngn, Currency::Ngn).unwrap(),
            BalanceSlot::Local
        );
        assert_eq!(
            balance_slot(Currency::Ngn, Currency::Usd).unwrap(),
            BalanceSlot::Usd
        );
        assert_eq!(
            balance_slot(Currency::Ngn, Currency::Gbp).unwrap(),
            BalanceSlot::Gbp
        );
        assert!(balance_slot(Currency::Ngn, Currency::Kes).is_err());
    }

    #[test]
    fn test_local_currency_wins_over_secondary_slot() {
        // A USD-local account keeps USD amounts in its local slot.
        assert_eq!(
            balance_slot(Currency::Usd, Currency::Usd).unwrap(),
            BalanceSlot::Local
        );
        assert_eq!(
            balance_slot(Currency::Usd, Currency::Gbp).unwrap(),
            BalanceSlot::Gbp
        );
    }

    #[test]
    fn test_exact_balance_debit_allowed() {
        let after = balance_after(dec!(600), EntryDirection::Debit, dec!(600)).unwrap();
        assert_eq!(after, Decimal::ZERO);
    }

    #[test]
    fn test_replay_pending_excluded() {
        // One successful credit of 200 and one pending debit of 50
        // computes to 200.
        let computed = replay(vec![
            (EntryDirection::Credit, EntryStatus::Successful, dec!(200)),
            (EntryDirection::Debit, EntryStatus::Pending, dec!(50)),
        ]);
        assert_eq!(computed, dec!(200));
    }
}
