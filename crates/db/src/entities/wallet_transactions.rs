//! `SeaORM` Entity for the wallet_transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{EntryDirection, EntryStatus};

/// One immutable ledger entry per credit or debit. `status` is the only
/// column that ever changes, and only while the entry is pending.
/// `balance_before`/`balance_after` are stamped when the entry becomes
/// successful and form the linearized audit chain for the account.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "wallet_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Monotone insertion sequence; entries for one account are inserted
    /// under the account row lock, so per-account `seq` order is the
    /// linearized ledger order.
    pub seq: i64,
    pub account_id: Uuid,
    pub direction: EntryDirection,
    pub amount: Decimal,
    pub currency: String,
    pub service: String,
    #[sea_orm(unique)]
    pub reference: String,
    pub balance_before: Option<Decimal>,
    pub balance_after: Option<Decimal>,
    pub status: EntryStatus,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub metadata: Option<Json>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wallet_accounts::Entity",
        from = "Column::AccountId",
        to = "super::wallet_accounts::Column::Id"
    )]
    WalletAccounts,
}

impl Related<super::wallet_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WalletAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
