//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations, hiding
//! the `SeaORM` implementation details from the rest of the application.
//! All balance mutation funnels through `WalletRepository::apply_entry`.

pub mod payout;
pub mod reconcile;
pub mod wallet;

pub use payout::{PayoutError, PayoutRepository, RequestPayoutInput};
pub use reconcile::{DuplicateRefundGroup, ReconcileError, ReconciliationRepository};
pub use wallet::{ApplyEntryInput, PendingEntryInput, WalletError, WalletRepository};
