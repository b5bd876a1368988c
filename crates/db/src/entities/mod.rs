//! `SeaORM` entity definitions.

pub mod payouts;
pub mod sea_orm_active_enums;
pub mod wallet_accounts;
pub mod wallet_transactions;
