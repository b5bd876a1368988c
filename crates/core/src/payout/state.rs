//! Payout state machine.
//!
//! States: `pending → processing → {successful | failed}`. A pending payout
//! may also fail directly (provider rejected before dispatch) or be cancelled
//! by an operator. Once processing, the external transfer is in flight and
//! the only exits are successful or failed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status of a payout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    /// Created; wallet debited; external transfer not yet dispatched.
    Pending,
    /// External transfer dispatched and in flight.
    Processing,
    /// Funds left the ledger permanently.
    Successful,
    /// Transfer failed; funds must return via refund.
    Failed,
    /// Operator cancelled before dispatch; funds returned via refund.
    Cancelled,
}

/// Rejected payout state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid payout transition: {from} -> {to}")]
pub struct InvalidTransition {
    /// Status the payout is currently in.
    pub from: PayoutStatus,
    /// Status the caller asked for.
    pub to: PayoutStatus,
}

impl PayoutStatus {
    /// Returns true once the payout can never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Successful | Self::Failed | Self::Cancelled)
    }

    /// Returns true if a payout in this status must end with a refund when
    /// it leaves the happy path.
    #[must_use]
    pub const fn holds_debited_funds(self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    /// Returns true when the transition is allowed by the state machine.
    #[must_use]
    pub const fn can_transition(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Processing)
                | (Self::Pending, Self::Failed)
                | (Self::Pending, Self::Cancelled)
                | (Self::Processing, Self::Successful)
                | (Self::Processing, Self::Failed)
        )
    }

    /// Validates a transition, returning the offending pair on rejection.
    pub const fn validate_transition(self, to: Self) -> Result<(), InvalidTransition> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(InvalidTransition { from: self, to })
        }
    }
}

impl std::fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Successful => write!(f, "successful"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for PayoutStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "successful" => Ok(Self::Successful),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown payout status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn status_strategy() -> impl Strategy<Value = PayoutStatus> {
        prop_oneof![
            Just(PayoutStatus::Pending),
            Just(PayoutStatus::Processing),
            Just(PayoutStatus::Successful),
            Just(PayoutStatus::Failed),
            Just(PayoutStatus::Cancelled),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Terminal payouts admit no further transitions.
        #[test]
        fn prop_terminal_states_frozen(
            from in status_strategy(),
            to in status_strategy(),
        ) {
            prop_assume!(from.is_terminal());
            prop_assert!(from.validate_transition(to).is_err());
        }

        /// Cancellation is only reachable from pending.
        #[test]
        fn prop_cancel_only_from_pending(from in status_strategy()) {
            let allowed = from.can_transition(PayoutStatus::Cancelled);
            prop_assert_eq!(allowed, from == PayoutStatus::Pending);
        }

        /// Success is only reachable from processing.
        #[test]
        fn prop_success_requires_processing(from in status_strategy()) {
            let allowed = from.can_transition(PayoutStatus::Successful);
            prop_assert_eq!(allowed, from == PayoutStatus::Processing);
        }

        /// Failure is reachable exactly while the payout still holds
        /// debited funds.
        #[test]
        fn prop_failure_while_funds_held(from in status_strategy()) {
            let allowed = from.can_transition(PayoutStatus::Failed);
            prop_assert_eq!(allowed, from.holds_debited_funds());
        }

        /// No transition ever targets pending.
        #[test]
        fn prop_nothing_returns_to_pending(from in status_strategy()) {
            prop_assert!(!from.can_transition(PayoutStatus::Pending));
        }
    }

    #[test]
    fn test_happy_path() {
        assert!(PayoutStatus::Pending
            .validate_transition(PayoutStatus::Processing)
            .is_ok());
        assert!(PayoutStatus::Processing
            .validate_transition(PayoutStatus::Successful)
            .is_ok());
    }

    #[test]
    fn test_processing_cannot_cancel() {
        let err = PayoutStatus::Processing
            .validate_transition(PayoutStatus::Cancelled)
            .unwrap_err();
        assert_eq!(err.from, PayoutStatus::Processing);
        assert_eq!(err.to, PayoutStatus::Cancelled);
    }

    #[test]
    fn test_successful_on_pending_rejected() {
        assert!(PayoutStatus::Pending
            .validate_transition(PayoutStatus::Successful)
            .is_err());
    }

    #[test]
    fn test_status_parse_roundtrip() {
        use std::str::FromStr;
        for status in [
            PayoutStatus::Pending,
            PayoutStatus::Processing,
            PayoutStatus::Successful,
            PayoutStatus::Failed,
            PayoutStatus::Cancelled,
        ] {
            assert_eq!(PayoutStatus::from_str(&status.to_string()).unwrap(), status);
        }
    }
}
