//! Database enum mappings for wallet and payout statuses.
//!
//! Each enum mirrors a Postgres `CREATE TYPE ... AS ENUM` from the initial
//! migration, with conversions to and from the pure domain enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The kind of seller that owns a wallet.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "owner_kind")]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    /// An individual tutor.
    #[sea_orm(string_value = "tutor")]
    Tutor,
    /// An organization.
    #[sea_orm(string_value = "organization")]
    Organization,
}

/// Direction of a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_direction")]
#[serde(rename_all = "lowercase")]
pub enum EntryDirection {
    /// Increases the balance.
    #[sea_orm(string_value = "credit")]
    Credit,
    /// Decreases the balance.
    #[sea_orm(string_value = "debit")]
    Debit,
}

/// Status of a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_status")]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Outcome not yet known.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Applied to the balance.
    #[sea_orm(string_value = "successful")]
    Successful,
    /// Terminal without balance movement.
    #[sea_orm(string_value = "failed")]
    Failed,
    /// Terminal without balance movement, operator-initiated.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Status of a payout request.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payout_status")]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    /// Created; wallet debited; transfer not yet dispatched.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// External transfer in flight.
    #[sea_orm(string_value = "processing")]
    Processing,
    /// Funds left the ledger permanently.
    #[sea_orm(string_value = "successful")]
    Successful,
    /// Transfer failed; funds return via refund.
    #[sea_orm(string_value = "failed")]
    Failed,
    /// Cancelled before dispatch; funds returned via refund.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl From<tutorpay_shared::types::OwnerKind> for OwnerKind {
    fn from(kind: tutorpay_shared::types::OwnerKind) -> Self {
        match kind {
            tutorpay_shared::types::OwnerKind::Tutor => Self::Tutor,
            tutorpay_shared::types::OwnerKind::Organization => Self::Organization,
        }
    }
}

impl From<OwnerKind> for tutorpay_shared::types::OwnerKind {
    fn from(kind: OwnerKind) -> Self {
        match kind {
            OwnerKind::Tutor => Self::Tutor,
            OwnerKind::Organization => Self::Organization,
        }
    }
}

impl From<tutorpay_core::wallet::EntryDirection> for EntryDirection {
    fn from(direction: tutorpay_core::wallet::EntryDirection) -> Self {
        match direction {
            tutorpay_core::wallet::EntryDirection::Credit => Self::Credit,
            tutorpay_core::wallet::EntryDirection::Debit => Self::Debit,
        }
    }
}

impl From<EntryDirection> for tutorpay_core::wallet::EntryDirection {
    fn from(direction: EntryDirection) -> Self {
        match direction {
            EntryDirection::Credit => Self::Credit,
            EntryDirection::Debit => Self::Debit,
        }
    }
}

impl From<tutorpay_core::wallet::EntryStatus> for EntryStatus {
    fn from(status: tutorpay_core::wallet::EntryStatus) -> Self {
        match status {
            tutorpay_core::wallet::EntryStatus::Pending => Self::Pending,
            tutorpay_core::wallet::EntryStatus::Successful => Self::Successful,
            tutorpay_core::wallet::EntryStatus::Failed => Self::Failed,
            tutorpay_core::wallet::EntryStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<EntryStatus> for tutorpay_core::wallet::EntryStatus {
    fn from(status: EntryStatus) -> Self {
        match status {
            EntryStatus::Pending => Self::Pending,
            EntryStatus::Successful => Self::Successful,
            EntryStatus::Failed => Self::Failed,
            EntryStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<tutorpay_core::payout::PayoutStatus> for PayoutStatus {
    fn from(status: tutorpay_core::payout::PayoutStatus) -> Self {
        match status {
            tutorpay_core::payout::PayoutStatus::Pending => Self::Pending,
            tutorpay_core::payout::PayoutStatus::Processing => Self::Processing,
            tutorpay_core::payout::PayoutStatus::Successful => Self::Successful,
            tutorpay_core::payout::PayoutStatus::Failed => Self::Failed,
            tutorpay_core::payout::PayoutStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<PayoutStatus> for tutorpay_core::payout::PayoutStatus {
    fn from(status: PayoutStatus) -> Self {
        match status {
            PayoutStatus::Pending => Self::Pending,
            PayoutStatus::Processing => Self::Processing,
            PayoutStatus::Successful => Self::Successful,
            PayoutStatus::Failed => Self::Failed,
            PayoutStatus::Cancelled => Self::Cancelled,
        }
    }
}
