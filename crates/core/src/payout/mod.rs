//! Payout domain logic.
//!
//! - State machine transitions for the withdrawal lifecycle
//! - Transfer fee schedule
//! - Deterministic ledger references and service labels for payout entries

pub mod fee;
pub mod state;

pub use fee::{net_amount, transfer_fee};
pub use state::{InvalidTransition, PayoutStatus};

use tutorpay_shared::types::PayoutId;

/// Service label on the debit entry created by a payout request.
pub const PAYOUT_SERVICE: &str = "Payout";

/// Service label on the compensating credit for a failed or cancelled payout.
pub const PAYOUT_REFUND_SERVICE: &str = "Payout Refund";

/// Metadata key linking a refund entry back to its payout.
pub const PAYOUT_METADATA_KEY: &str = "payout_id";

/// Idempotency reference for the debit entry of a payout.
#[must_use]
pub fn payout_reference(payout_id: PayoutId) -> String {
    format!("PAYOUT-{payout_id}")
}

/// Idempotency reference for the compensating credit of a payout.
///
/// Derived deterministically from the payout id so that retried failure
/// notifications can never produce a second refund.
#[must_use]
pub fn refund_reference(payout_id: PayoutId) -> String {
    format!("REFUND-{payout_id}")
}

/// Ledger entry metadata linking an entry to its payout.
#[must_use]
pub fn payout_metadata(payout_id: PayoutId) -> serde_json::Value {
    serde_json::json!({ "payout_id": payout_id })
}

/// Extracts the payout link from ledger entry metadata, if present.
#[must_use]
pub fn payout_id_from_metadata(metadata: &serde_json::Value) -> Option<PayoutId> {
    metadata
        .get(PAYOUT_METADATA_KEY)?
        .as_str()?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_references_are_deterministic() {
        let id = PayoutId::new();
        assert_eq!(refund_reference(id), refund_reference(id));
        assert_eq!(payout_reference(id), payout_reference(id));
        assert_ne!(payout_reference(id), refund_reference(id));
    }

    #[test]
    fn test_reference_embeds_payout_id() {
        let id = PayoutId::new();
        assert!(refund_reference(id).ends_with(&id.to_string()));
        assert!(refund_reference(id).starts_with("REFUND-"));
    }

    #[test]
    fn test_metadata_roundtrip() {
        let id = PayoutId::new();
        let metadata = payout_metadata(id);
        assert_eq!(payout_id_from_metadata(&metadata), Some(id));
    }

    #[test]
    fn test_metadata_missing_or_malformed() {
        assert_eq!(payout_id_from_metadata(&serde_json::json!({})), None);
        assert_eq!(
            payout_id_from_metadata(&serde_json::json!({ "payout_id": "nope" })),
            None
        );
    }
}
