//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `PayoutId` where a
//! `TransactionId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(OwnerId, "Unique identifier for a wallet owner (tutor or organization).");
typed_id!(AccountId, "Unique identifier for a wallet account.");
typed_id!(TransactionId, "Unique identifier for a ledger transaction.");
typed_id!(PayoutId, "Unique identifier for a payout request.");
typed_id!(BankAccountId, "Unique identifier for a verified bank destination.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(AccountId::new(), AccountId::new());
        assert_ne!(PayoutId::new(), PayoutId::new());
    }

    #[test]
    fn test_id_display_parse_roundtrip() {
        let id = TransactionId::new();
        let parsed = TransactionId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        assert_eq!(OwnerId::from_uuid(uuid).into_inner(), uuid);
    }

    #[test]
    fn test_invalid_id_rejected() {
        assert!(PayoutId::from_str("not-a-uuid").is_err());
    }
}
