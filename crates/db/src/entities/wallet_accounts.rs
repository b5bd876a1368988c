//! `SeaORM` Entity for the wallet_accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::OwnerKind;

/// One wallet per (owner, owner kind), holding a local-currency balance plus
/// fixed USD and GBP balances. Balance columns are cached projections of the
/// transaction history and are mutated only under a row lock.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "wallet_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_kind: OwnerKind,
    pub local_currency: String,
    pub local_balance: Decimal,
    pub usd_balance: Decimal,
    pub gbp_balance: Decimal,
    pub total_credited: Decimal,
    pub total_paid_out: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::wallet_transactions::Entity")]
    WalletTransactions,
    #[sea_orm(has_many = "super::payouts::Entity")]
    Payouts,
}

impl Related<super::wallet_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WalletTransactions.def()
    }
}

impl Related<super::payouts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payouts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
