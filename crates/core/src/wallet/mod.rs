//! Wallet balance and ledger entry rules.
//!
//! This module implements the pure pieces of the ledger:
//! - Ledger entry direction and status rules
//! - Balance arithmetic with overdraft protection
//! - Currency-to-balance-slot resolution
//! - Error types for ledger rule violations

pub mod balance;
pub mod entry;
pub mod error;

pub use balance::{balance_after, balance_slot, replay, signed_amount, BalanceSlot};
pub use entry::{EntryDirection, EntryStatus};
pub use error::LedgerError;
