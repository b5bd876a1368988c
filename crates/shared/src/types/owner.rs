//! Wallet owner identity.
//!
//! An account belongs to exactly one `(owner id, owner kind)` pair; the kind
//! disambiguates a tutor and an organization that share a UUID space.

use serde::{Deserialize, Serialize};

use super::id::OwnerId;

/// The kind of seller that owns a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    /// An individual tutor selling courses or coaching.
    Tutor,
    /// An organization selling under a shared storefront.
    Organization,
}

impl std::fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tutor => write!(f, "tutor"),
            Self::Organization => write!(f, "organization"),
        }
    }
}

impl std::str::FromStr for OwnerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tutor" => Ok(Self::Tutor),
            "organization" => Ok(Self::Organization),
            _ => Err(format!("Unknown owner kind: {s}")),
        }
    }
}

/// Key identifying one wallet: owner identity plus kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletOwner {
    /// The owner's identity.
    pub id: OwnerId,
    /// Whether the owner is a tutor or an organization.
    pub kind: OwnerKind,
}

impl WalletOwner {
    /// Creates a new wallet owner key.
    #[must_use]
    pub const fn new(id: OwnerId, kind: OwnerKind) -> Self {
        Self { id, kind }
    }

    /// Convenience constructor for a tutor-owned wallet.
    #[must_use]
    pub const fn tutor(id: OwnerId) -> Self {
        Self::new(id, OwnerKind::Tutor)
    }

    /// Convenience constructor for an organization-owned wallet.
    #[must_use]
    pub const fn organization(id: OwnerId) -> Self {
        Self::new(id, OwnerKind::Organization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_owner_kind_roundtrip() {
        assert_eq!(OwnerKind::from_str("tutor").unwrap(), OwnerKind::Tutor);
        assert_eq!(
            OwnerKind::from_str("ORGANIZATION").unwrap(),
            OwnerKind::Organization
        );
        assert!(OwnerKind::from_str("student").is_err());
    }

    #[test]
    fn test_same_id_different_kind_distinct() {
        let id = OwnerId::new();
        assert_ne!(WalletOwner::tutor(id), WalletOwner::organization(id));
    }
}
