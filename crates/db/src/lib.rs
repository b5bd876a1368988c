//! Database layer with `SeaORM` entities and wallet repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for accounts, ledger entries, and payouts
//! - Repository abstractions for balance mutation, payouts, and reconciliation
//! - Port traits for the external transfer provider and bank account registry
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod ports;
pub mod repositories;

pub use ports::{BankAccountRegistry, TransferError, TransferProvider, TransferRequest};
pub use repositories::{PayoutRepository, ReconciliationRepository, WalletRepository};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
