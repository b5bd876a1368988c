//! Port traits for external collaborators.
//!
//! The engine consumes the transfer provider and the bank account registry
//! as black boxes; only their contracts are defined here. Implementations
//! live with the integrations (and in the test suites).

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use tutorpay_shared::types::{BankAccountId, Currency, WalletOwner};

/// Request handed to the external transfer provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    /// Amount reaching the destination (net of the transfer fee).
    pub amount: Decimal,
    /// Currency of the transfer.
    pub currency: Currency,
    /// Verified destination bank account.
    pub destination: BankAccountId,
}

/// The external transfer provider rejected or failed a request.
#[derive(Debug, Clone, Error)]
#[error("Transfer provider error: {0}")]
pub struct TransferError(pub String);

/// Executes bank transfers.
///
/// `initiate` returns the provider's reference synchronously; the eventual
/// success or failure arrives asynchronously (webhook or polling) and is
/// applied through the payout state machine.
#[async_trait]
pub trait TransferProvider: Send + Sync {
    /// Starts a transfer and returns the provider reference.
    async fn initiate(&self, request: TransferRequest) -> Result<String, TransferError>;
}

/// Supplies verified bank destinations for wallet owners.
#[async_trait]
pub trait BankAccountRegistry: Send + Sync {
    /// Returns true when the bank account is a verified destination for the
    /// owner. Payout requests fail with `NoVerifiedDestination` otherwise.
    async fn is_verified(&self, owner: WalletOwner, bank_account: BankAccountId) -> bool;
}
