//! Error types for ledger rule violations.

use rust_decimal::Decimal;
use thiserror::Error;
use tutorpay_shared::types::Currency;

use super::entry::EntryStatus;

/// Errors raised by the pure ledger rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Entry amount must be strictly positive.
    #[error("Entry amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Debit exceeds the available balance. Never silently clipped.
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        /// Balance available in the requested currency.
        available: Decimal,
        /// Amount the debit asked for.
        requested: Decimal,
    },

    /// The currency has no balance slot on this account.
    #[error("Currency {currency} is not supported for an account with local currency {local}")]
    UnsupportedCurrency {
        /// Currency the operation named.
        currency: Currency,
        /// The account's local currency.
        local: Currency,
    },

    /// A terminal ledger entry can never change status again.
    #[error("Cannot move entry from {from} to {to}: only pending entries may be finalized")]
    EntryNotPending {
        /// Current status of the entry.
        from: EntryStatus,
        /// Status the caller asked for.
        to: EntryStatus,
    },

    /// Finalization must land on a terminal status.
    #[error("Cannot finalize entry to non-terminal status {0}")]
    NonTerminalTarget(EntryStatus),
}
