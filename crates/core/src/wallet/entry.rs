//! Ledger entry direction and status rules.

use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Direction of a ledger entry relative to the account balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryDirection {
    /// Increases the balance (earnings, refunds).
    Credit,
    /// Decreases the balance (payouts).
    Debit,
}

impl std::fmt::Display for EntryDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Credit => write!(f, "credit"),
            Self::Debit => write!(f, "debit"),
        }
    }
}

/// Status of a ledger entry.
///
/// Only `Successful` entries count toward the account balance; the other
/// statuses are retained for audit but excluded from balance computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Outcome not yet known; no balance movement has happened.
    Pending,
    /// Applied to the balance.
    Successful,
    /// Terminal without balance movement.
    Failed,
    /// Terminal without balance movement, operator-initiated.
    Cancelled,
}

impl EntryStatus {
    /// Returns true once the entry can never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Successful | Self::Failed | Self::Cancelled)
    }

    /// Returns true if entries with this status count toward the balance.
    #[must_use]
    pub const fn counts_toward_balance(self) -> bool {
        matches!(self, Self::Successful)
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Successful => write!(f, "successful"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Validates a status finalization: only pending entries move, and only to a
/// terminal status. Terminal entries are immutable; corrections happen via
/// new, linked entries.
pub const fn validate_finalization(from: EntryStatus, to: EntryStatus) -> Result<(), LedgerError> {
    if !matches!(from, EntryStatus::Pending) {
        return Err(LedgerError::EntryNotPending { from, to });
    }
    if !to.is_terminal() {
        return Err(LedgerError::NonTerminalTarget(to));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn status_strategy() -> impl Strategy<Value = EntryStatus> {
        prop_oneof![
            Just(EntryStatus::Pending),
            Just(EntryStatus::Successful),
            Just(EntryStatus::Failed),
            Just(EntryStatus::Cancelled),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Terminal entries reject every finalization attempt.
        #[test]
        fn prop_terminal_entries_immutable(
            from in status_strategy(),
            to in status_strategy(),
        ) {
            prop_assume!(from.is_terminal());
            prop_assert!(validate_finalization(from, to).is_err());
        }

        /// Pending entries finalize to any terminal status and nothing else.
        #[test]
        fn prop_pending_finalizes_to_terminal_only(to in status_strategy()) {
            let result = validate_finalization(EntryStatus::Pending, to);
            prop_assert_eq!(result.is_ok(), to.is_terminal());
        }
    }

    #[test]
    fn test_only_successful_counts() {
        assert!(EntryStatus::Successful.counts_toward_balance());
        assert!(!EntryStatus::Pending.counts_toward_balance());
        assert!(!EntryStatus::Failed.counts_toward_balance());
        assert!(!EntryStatus::Cancelled.counts_toward_balance());
    }

    #[test]
    fn test_pending_is_not_terminal() {
        assert!(!EntryStatus::Pending.is_terminal());
        assert!(EntryStatus::Successful.is_terminal());
        assert!(EntryStatus::Failed.is_terminal());
        assert!(EntryStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_finalize_pending_to_failed() {
        assert!(validate_finalization(EntryStatus::Pending, EntryStatus::Failed).is_ok());
    }

    #[test]
    fn test_finalize_to_pending_rejected() {
        let err = validate_finalization(EntryStatus::Pending, EntryStatus::Pending).unwrap_err();
        assert!(matches!(err, super::LedgerError::NonTerminalTarget(_)));
    }
}
