//! `SeaORM` Entity for the payouts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::PayoutStatus;

/// One withdrawal request. The wallet debit happens in the same database
/// transaction that inserts this row; `refunded` records whether the
/// compensating credit for a failed or cancelled payout has been written.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payouts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub fee: Decimal,
    pub net_amount: Decimal,
    pub bank_account_id: Uuid,
    pub provider_reference: Option<String>,
    pub status: PayoutStatus,
    pub failure_reason: Option<String>,
    pub refunded: bool,
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
