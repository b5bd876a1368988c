//! Wallet repository: the single choke point for balance mutation.
//!
//! Every change to a stored balance goes through `apply_entry` (or the
//! pending-entry path finalized here). The algorithm is always the same:
//! open a transaction, bound the lock wait, take the account row lock,
//! compute the new balance, write the ledger entry and the updated
//! projection together, commit. Any failure rolls the whole unit back.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use tutorpay_core::payout::{PAYOUT_REFUND_SERVICE, PAYOUT_SERVICE};
use tutorpay_core::wallet::{
    balance::{balance_after, balance_slot, BalanceSlot},
    entry::validate_finalization,
    EntryDirection, EntryStatus, LedgerError,
};
use tutorpay_shared::config::WalletConfig;
use tutorpay_shared::types::{
    Currency, OwnerKind, PageRequest, PageResponse, TransactionId, WalletOwner,
};

use crate::entities::{sea_orm_active_enums, wallet_accounts, wallet_transactions};

/// Error types for wallet operations.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// No wallet exists for the owner (debits never create one).
    #[error("Wallet account not found for owner {owner_id} ({owner_kind})")]
    AccountNotFound {
        /// Owner identity.
        owner_id: Uuid,
        /// Owner kind.
        owner_kind: OwnerKind,
    },

    /// Ledger entry not found.
    #[error("Ledger entry not found: {0}")]
    EntryNotFound(TransactionId),

    /// Debit exceeds the available balance. Never silently clipped.
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        /// Balance available in the requested currency.
        available: Decimal,
        /// Amount the debit asked for.
        requested: Decimal,
    },

    /// The idempotency reference belongs to an operation that terminated
    /// without success; reusing it would resurrect a dead operation.
    #[error("Idempotency reference '{0}' was already used by a terminated operation")]
    DuplicateIdempotencyRef(String),

    /// Bounded wait for the account row lock expired. Retryable.
    #[error("Timed out waiting for the account row lock")]
    LockTimeout,

    /// The currency has no balance slot on this account.
    #[error("Currency {currency} is not supported for an account with local currency {local}")]
    UnsupportedCurrency {
        /// Currency the operation named.
        currency: Currency,
        /// The account's local currency.
        local: Currency,
    },

    /// A stored currency code failed to parse. Indicates corrupt data.
    #[error("Stored currency code '{0}' is not recognized")]
    InvalidCurrencyCode(String),

    /// Entry amount must be strictly positive.
    #[error("Entry amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Only pending entries may be finalized.
    #[error("Cannot move entry from {from} to {to}: only pending entries may be finalized")]
    EntryNotPending {
        /// Current status of the entry.
        from: EntryStatus,
        /// Status the caller asked for.
        to: EntryStatus,
    },

    /// Finalization must land on a terminal status.
    #[error("Cannot finalize entry to non-terminal status {0}")]
    NonTerminalFinalization(EntryStatus),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<LedgerError> for WalletError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NonPositiveAmount(amount) => Self::NonPositiveAmount(amount),
            LedgerError::InsufficientFunds {
                available,
                requested,
            } => Self::InsufficientFunds {
                available,
                requested,
            },
            LedgerError::UnsupportedCurrency { currency, local } => {
                Self::UnsupportedCurrency { currency, local }
            }
            LedgerError::EntryNotPending { from, to } => Self::EntryNotPending { from, to },
            LedgerError::NonTerminalTarget(status) => Self::NonTerminalFinalization(status),
        }
    }
}

/// Input for applying a successful ledger entry.
#[derive(Debug, Clone)]
pub struct ApplyEntryInput {
    /// The wallet owner.
    pub owner: WalletOwner,
    /// Currency of the entry.
    pub currency: Currency,
    /// Credit or debit.
    pub direction: EntryDirection,
    /// Positive amount.
    pub amount: Decimal,
    /// Free-text label for the causing business event.
    pub service: String,
    /// Caller-supplied idempotency reference, unique per logical operation.
    pub reference: String,
    /// Optional structured metadata (e.g. a payout link).
    pub metadata: Option<JsonValue>,
}

/// Input for recording a pending ledger entry whose outcome is not yet known.
#[derive(Debug, Clone)]
pub struct PendingEntryInput {
    /// The wallet owner.
    pub owner: WalletOwner,
    /// Currency of the entry.
    pub currency: Currency,
    /// Credit or debit.
    pub direction: EntryDirection,
    /// Positive amount.
    pub amount: Decimal,
    /// Free-text label for the causing business event.
    pub service: String,
    /// Caller-supplied idempotency reference, unique per logical operation.
    pub reference: String,
    /// Optional structured metadata.
    pub metadata: Option<JsonValue>,
}

/// Filter options for listing ledger entries.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Filter by currency.
    pub currency: Option<Currency>,
    /// Filter by entry status.
    pub status: Option<EntryStatus>,
}

/// Wallet repository: ledger store, balance mutator, and transaction
/// recorder in one place, so the locking discipline cannot be bypassed.
#[derive(Debug, Clone)]
pub struct WalletRepository {
    db: DatabaseConnection,
    config: WalletConfig,
}

impl WalletRepository {
    /// Creates a new wallet repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, config: WalletConfig) -> Self {
        Self { db, config }
    }

    /// Returns the wallet account for an owner, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_account(
        &self,
        owner: WalletOwner,
    ) -> Result<Option<wallet_accounts::Model>, WalletError> {
        let account = wallet_accounts::Entity::find()
            .filter(wallet_accounts::Column::OwnerId.eq(owner.id.into_inner()))
            .filter(
                wallet_accounts::Column::OwnerKind
                    .eq(sea_orm_active_enums::OwnerKind::from(owner.kind)),
            )
            .one(&self.db)
            .await?;
        Ok(account)
    }

    /// Applies one successful ledger entry and updates the balance
    /// projection, atomically.
    ///
    /// If the idempotency reference was already recorded, the prior entry is
    /// returned without re-applying the mutation.
    ///
    /// # Errors
    ///
    /// - `InsufficientFunds` when a debit exceeds the balance
    /// - `AccountNotFound` when debiting an owner with no wallet
    /// - `LockTimeout` when the row lock wait expires (retryable)
    /// - `DuplicateIdempotencyRef` when the reference belongs to a
    ///   terminated operation
    pub async fn apply_entry(
        &self,
        input: ApplyEntryInput,
    ) -> Result<wallet_transactions::Model, WalletError> {
        // Fast path: a committed entry with this reference short-circuits
        // without taking the row lock.
        if let Some(existing) = find_by_reference(&self.db, &input.reference).await? {
            return dedupe_result(existing);
        }

        let txn = self.db.begin().await?;
        self.set_lock_timeout(&txn).await?;
        let entry = self.apply_entry_in(&txn, &input).await?;
        txn.commit().await?;
        Ok(entry)
    }

    /// `apply_entry` with bounded retries on `LockTimeout`.
    ///
    /// # Errors
    ///
    /// Same as `apply_entry`; `LockTimeout` is returned once the configured
    /// retry budget is exhausted.
    pub async fn apply_entry_with_retries(
        &self,
        input: ApplyEntryInput,
    ) -> Result<wallet_transactions::Model, WalletError> {
        let mut attempt = 0u32;
        loop {
            match self.apply_entry(input.clone()).await {
                Err(WalletError::LockTimeout) if attempt < self.config.lock_retries => {
                    attempt += 1;
                    let backoff = self.config.retry_backoff_ms * u64::from(attempt);
                    tracing::debug!(
                        reference = %input.reference,
                        attempt,
                        backoff_ms = backoff,
                        "account row lock timed out, retrying"
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(backoff)).await;
                }
                other => return other,
            }
        }
    }

    /// Applies an entry inside a caller-owned transaction.
    ///
    /// The caller is responsible for `SET LOCAL lock_timeout` and the final
    /// commit; this is how the payout request couples its debit with the
    /// payout row insert.
    pub(crate) async fn apply_entry_in(
        &self,
        txn: &DatabaseTransaction,
        input: &ApplyEntryInput,
    ) -> Result<wallet_transactions::Model, WalletError> {
        if input.amount <= Decimal::ZERO {
            return Err(WalletError::NonPositiveAmount(input.amount));
        }

        let account = self.lock_or_create_account(txn, input).await?;

        // Re-check the reference under the lock: same-account retries are
        // serialized here, so this check is race-free.
        if let Some(existing) = find_by_reference(txn, &input.reference).await? {
            return dedupe_result(existing);
        }

        let local = parse_currency(&account.local_currency)?;
        let slot = balance_slot(local, input.currency)?;
        let before = slot_value(&account, slot);
        let after = balance_after(before, input.direction, input.amount)?;

        let now = Utc::now().into();
        let entry = wallet_transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(account.id),
            direction: Set(input.direction.into()),
            amount: Set(input.amount),
            currency: Set(input.currency.to_string()),
            service: Set(input.service.clone()),
            reference: Set(input.reference.clone()),
            balance_before: Set(Some(before)),
            balance_after: Set(Some(after)),
            status: Set(sea_orm_active_enums::EntryStatus::Successful),
            metadata: Set(input.metadata.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let entry = match entry.insert(txn).await {
            Ok(entry) => entry,
            // A reference collision across accounts is a caller bug; the
            // same-account case was handled under the lock above.
            Err(err) if is_unique_violation(&err) => {
                return Err(WalletError::DuplicateIdempotencyRef(input.reference.clone()));
            }
            Err(err) => return Err(err.into()),
        };

        self.project_balance(
            txn,
            account,
            slot,
            after,
            input.direction,
            &input.service,
            input.amount,
        )
        .await?;

        Ok(entry)
    }

    /// Records a pending entry with no balance movement.
    ///
    /// The entry is later finalized by `finalize_entry`; until then it is
    /// excluded from every balance computation.
    ///
    /// # Errors
    ///
    /// Same dedup and account-resolution rules as `apply_entry`.
    pub async fn record_pending_entry(
        &self,
        input: PendingEntryInput,
    ) -> Result<wallet_transactions::Model, WalletError> {
        if input.amount <= Decimal::ZERO {
            return Err(WalletError::NonPositiveAmount(input.amount));
        }

        if let Some(existing) = find_by_reference(&self.db, &input.reference).await? {
            return dedupe_result(existing);
        }

        let txn = self.db.begin().await?;
        self.set_lock_timeout(&txn).await?;

        let apply_input = ApplyEntryInput {
            owner: input.owner,
            currency: input.currency,
            direction: input.direction,
            amount: input.amount,
            service: input.service.clone(),
            reference: input.reference.clone(),
            metadata: input.metadata.clone(),
        };
        let account = self.lock_or_create_account(&txn, &apply_input).await?;

        if let Some(existing) = find_by_reference(&txn, &input.reference).await? {
            txn.commit().await?;
            return dedupe_result(existing);
        }

        // Validate the currency is representable even though no balance
        // moves yet; a pending entry in an unsupported currency could never
        // be finalized.
        let local = parse_currency(&account.local_currency)?;
        balance_slot(local, input.currency)?;

        let now = Utc::now().into();
        let entry = wallet_transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(account.id),
            direction: Set(input.direction.into()),
            amount: Set(input.amount),
            currency: Set(input.currency.to_string()),
            service: Set(input.service),
            reference: Set(input.reference.clone()),
            balance_before: Set(None),
            balance_after: Set(None),
            status: Set(sea_orm_active_enums::EntryStatus::Pending),
            metadata: Set(input.metadata),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let entry = match entry.insert(&txn).await {
            Ok(entry) => entry,
            Err(err) if is_unique_violation(&err) => {
                return Err(WalletError::DuplicateIdempotencyRef(input.reference));
            }
            Err(err) => return Err(err.into()),
        };

        txn.commit().await?;
        Ok(entry)
    }

    /// Finalizes a pending entry to a terminal status.
    ///
    /// Finalizing to `successful` applies the balance movement under the
    /// account row lock and stamps `balance_before`/`balance_after`;
    /// finalizing to `failed` or `cancelled` marks the entry terminal with
    /// no movement. Terminal entries are immutable.
    ///
    /// # Errors
    ///
    /// - `EntryNotFound` for an unknown id
    /// - `EntryNotPending` when the entry is already terminal
    /// - `InsufficientFunds` when a pending debit no longer fits the balance
    pub async fn finalize_entry(
        &self,
        entry_id: TransactionId,
        outcome: EntryStatus,
    ) -> Result<wallet_transactions::Model, WalletError> {
        let txn = self.db.begin().await?;
        self.set_lock_timeout(&txn).await?;

        let entry = wallet_transactions::Entity::find_by_id(entry_id.into_inner())
            .one(&txn)
            .await?
            .ok_or(WalletError::EntryNotFound(entry_id))?;

        validate_finalization(entry.status.clone().into(), outcome)?;

        let now = Utc::now().into();
        let updated = if outcome == EntryStatus::Successful {
            let account = lock_account_by_id(&txn, entry.account_id).await?;
            let local = parse_currency(&account.local_currency)?;
            let currency = parse_currency(&entry.currency)?;
            let direction: EntryDirection = entry.direction.clone().into();
            let amount = entry.amount;
            let service = entry.service.clone();

            let slot = balance_slot(local, currency)?;
            let before = slot_value(&account, slot);
            let after = balance_after(before, direction, amount)?;

            let mut active: wallet_transactions::ActiveModel = entry.into();
            active.status = Set(sea_orm_active_enums::EntryStatus::Successful);
            active.balance_before = Set(Some(before));
            active.balance_after = Set(Some(after));
            active.updated_at = Set(now);
            let updated = active.update(&txn).await?;

            self.project_balance(&txn, account, slot, after, direction, &service, amount)
                .await?;
            updated
        } else {
            let mut active: wallet_transactions::ActiveModel = entry.into();
            active.status = Set(sea_orm_active_enums::EntryStatus::from(outcome));
            active.updated_at = Set(now);
            active.update(&txn).await?
        };

        txn.commit().await?;
        Ok(updated)
    }

    /// Lists all ledger entries for an account in replay order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_transactions(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<wallet_transactions::Model>, WalletError> {
        let entries = wallet_transactions::Entity::find()
            .filter(wallet_transactions::Column::AccountId.eq(account_id))
            .order_by_asc(wallet_transactions::Column::Seq)
            .all(&self.db)
            .await?;
        Ok(entries)
    }

    /// Lists ledger entries for an account with filters and pagination,
    /// newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_transactions_page(
        &self,
        account_id: Uuid,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<PageResponse<wallet_transactions::Model>, WalletError> {
        let mut query = wallet_transactions::Entity::find()
            .filter(wallet_transactions::Column::AccountId.eq(account_id));

        if let Some(currency) = filter.currency {
            query = query.filter(wallet_transactions::Column::Currency.eq(currency.to_string()));
        }
        if let Some(status) = filter.status {
            query = query.filter(
                wallet_transactions::Column::Status
                    .eq(sea_orm_active_enums::EntryStatus::from(status)),
            );
        }

        let total = query.clone().count(&self.db).await?;
        let entries = query
            .order_by_desc(wallet_transactions::Column::Seq)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(entries, page.page, page.per_page, total))
    }

    /// Bounds how long statements in this transaction wait for row locks.
    pub(crate) async fn set_lock_timeout(
        &self,
        txn: &DatabaseTransaction,
    ) -> Result<(), WalletError> {
        txn.execute_unprepared(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.config.lock_timeout_ms
        ))
        .await?;
        Ok(())
    }

    /// Locks the account row for an owner, creating the wallet on first
    /// credit. Debits never create accounts.
    async fn lock_or_create_account(
        &self,
        txn: &DatabaseTransaction,
        input: &ApplyEntryInput,
    ) -> Result<wallet_accounts::Model, WalletError> {
        if let Some(account) = lock_account(txn, input.owner).await? {
            return Ok(account);
        }

        if input.direction == EntryDirection::Debit {
            return Err(WalletError::AccountNotFound {
                owner_id: input.owner.id.into_inner(),
                owner_kind: input.owner.kind,
            });
        }

        // First credit creates the wallet; the credited currency becomes
        // the account's local currency. ON CONFLICT absorbs the race where
        // two first credits arrive together, after which the lock below is
        // guaranteed to find the row.
        let now = Utc::now().into();
        let account = wallet_accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(input.owner.id.into_inner()),
            owner_kind: Set(input.owner.kind.into()),
            local_currency: Set(input.currency.to_string()),
            local_balance: Set(Decimal::ZERO),
            usd_balance: Set(Decimal::ZERO),
            gbp_balance: Set(Decimal::ZERO),
            total_credited: Set(Decimal::ZERO),
            total_paid_out: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
        };

        wallet_accounts::Entity::insert(account)
            .on_conflict(
                OnConflict::columns([
                    wallet_accounts::Column::OwnerId,
                    wallet_accounts::Column::OwnerKind,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(txn)
            .await?;

        lock_account(txn, input.owner)
            .await?
            .ok_or(WalletError::AccountNotFound {
                owner_id: input.owner.id.into_inner(),
                owner_kind: input.owner.kind,
            })
    }

    /// Writes the updated balance projection and lifetime counters.
    #[allow(clippy::too_many_arguments)]
    async fn project_balance(
        &self,
        txn: &DatabaseTransaction,
        account: wallet_accounts::Model,
        slot: BalanceSlot,
        after: Decimal,
        direction: EntryDirection,
        service: &str,
        amount: Decimal,
    ) -> Result<(), WalletError> {
        let total_credited = account.total_credited;
        let total_paid_out = account.total_paid_out;

        let mut active: wallet_accounts::ActiveModel = account.into();
        match slot {
            BalanceSlot::Local => active.local_balance = Set(after),
            BalanceSlot::Usd => active.usd_balance = Set(after),
            BalanceSlot::Gbp => active.gbp_balance = Set(after),
        }
        match lifetime_counter(direction, service) {
            Some(LifetimeCounter::Credited) => {
                active.total_credited = Set(total_credited + amount);
            }
            Some(LifetimeCounter::PaidOut) => {
                active.total_paid_out = Set(total_paid_out + amount);
            }
            None => {}
        }
        active.updated_at = Set(Utc::now().into());
        active.update(txn).await?;
        Ok(())
    }
}

// ============================================================================
// Locking and lookup helpers
// ============================================================================

/// Takes the row lock for an owner's account inside an active transaction.
///
/// Blocks until the current holder commits or rolls back, bounded by the
/// transaction's `lock_timeout`.
pub(crate) async fn lock_account(
    txn: &DatabaseTransaction,
    owner: WalletOwner,
) -> Result<Option<wallet_accounts::Model>, WalletError> {
    let result = wallet_accounts::Entity::find()
        .filter(wallet_accounts::Column::OwnerId.eq(owner.id.into_inner()))
        .filter(
            wallet_accounts::Column::OwnerKind
                .eq(sea_orm_active_enums::OwnerKind::from(owner.kind)),
        )
        .lock_exclusive()
        .one(txn)
        .await;

    match result {
        Ok(account) => Ok(account),
        Err(err) if is_lock_timeout(&err) => Err(WalletError::LockTimeout),
        Err(err) => Err(err.into()),
    }
}

/// Takes the row lock for an account by primary key.
pub(crate) async fn lock_account_by_id(
    txn: &DatabaseTransaction,
    account_id: Uuid,
) -> Result<wallet_accounts::Model, WalletError> {
    let result = wallet_accounts::Entity::find_by_id(account_id)
        .lock_exclusive()
        .one(txn)
        .await;

    match result {
        Ok(Some(account)) => Ok(account),
        // Ledger entries carry a foreign key to the account, so a miss here
        // means the row itself is gone.
        Ok(None) => Err(WalletError::Database(DbErr::RecordNotFound(format!(
            "wallet account {account_id}"
        )))),
        Err(err) if is_lock_timeout(&err) => Err(WalletError::LockTimeout),
        Err(err) => Err(err.into()),
    }
}

async fn find_by_reference<C: ConnectionTrait>(
    conn: &C,
    reference: &str,
) -> Result<Option<wallet_transactions::Model>, WalletError> {
    let entry = wallet_transactions::Entity::find()
        .filter(wallet_transactions::Column::Reference.eq(reference))
        .one(conn)
        .await?;
    Ok(entry)
}

// ============================================================================
// Pure helpers, separated for unit testing
// ============================================================================

/// Lifetime counters an entry contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifetimeCounter {
    Credited,
    PaidOut,
}

/// Decides which lifetime counter an entry feeds. Refund credits are
/// reversals, not earnings, so they feed neither.
fn lifetime_counter(direction: EntryDirection, service: &str) -> Option<LifetimeCounter> {
    match direction {
        EntryDirection::Credit if service != PAYOUT_REFUND_SERVICE => {
            Some(LifetimeCounter::Credited)
        }
        EntryDirection::Debit if service == PAYOUT_SERVICE => Some(LifetimeCounter::PaidOut),
        _ => None,
    }
}

/// Resolves a prior entry found under an idempotency reference.
///
/// Successful and in-flight entries are the prior result; terminated
/// entries make the reference unusable.
fn dedupe_result(
    existing: wallet_transactions::Model,
) -> Result<wallet_transactions::Model, WalletError> {
    match existing.status {
        sea_orm_active_enums::EntryStatus::Successful
        | sea_orm_active_enums::EntryStatus::Pending => Ok(existing),
        sea_orm_active_enums::EntryStatus::Failed
        | sea_orm_active_enums::EntryStatus::Cancelled => {
            Err(WalletError::DuplicateIdempotencyRef(existing.reference))
        }
    }
}

/// Reads the balance column a slot maps to.
fn slot_value(account: &wallet_accounts::Model, slot: BalanceSlot) -> Decimal {
    match slot {
        BalanceSlot::Local => account.local_balance,
        BalanceSlot::Usd => account.usd_balance,
        BalanceSlot::Gbp => account.gbp_balance,
    }
}

/// Returns the balance an account holds in a currency.
///
/// # Errors
///
/// Returns an error when the currency has no slot on this account or the
/// stored local-currency code is corrupt.
pub fn balance_of(
    account: &wallet_accounts::Model,
    currency: Currency,
) -> Result<Decimal, WalletError> {
    let local = parse_currency(&account.local_currency)?;
    let slot = balance_slot(local, currency)?;
    Ok(slot_value(account, slot))
}

fn parse_currency(code: &str) -> Result<Currency, WalletError> {
    code.trim()
        .parse()
        .map_err(|_| WalletError::InvalidCurrencyCode(code.to_string()))
}

fn is_lock_timeout(err: &DbErr) -> bool {
    let text = err.to_string();
    text.contains("lock timeout") || text.contains("55P03")
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account_model(local: &str) -> wallet_accounts::Model {
        wallet_accounts::Model {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            owner_kind: sea_orm_active_enums::OwnerKind::Tutor,
            local_currency: local.to_string(),
            local_balance: dec!(1000),
            usd_balance: dec!(25),
            gbp_balance: dec!(10),
            total_credited: dec!(5000),
            total_paid_out: dec!(4000),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn entry_model(status: sea_orm_active_enums::EntryStatus) -> wallet_transactions::Model {
        wallet_transactions::Model {
            id: Uuid::new_v4(),
            seq: 1,
            account_id: Uuid::new_v4(),
            direction: sea_orm_active_enums::EntryDirection::Credit,
            amount: dec!(100),
            currency: "NGN".to_string(),
            service: "Course Purchase".to_string(),
            reference: "tx-1".to_string(),
            balance_before: None,
            balance_after: None,
            status,
            metadata: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_balance_of_resolves_slots() {
        let account = account_model("NGN");
        assert_eq!(balance_of(&account, Currency::Ngn).unwrap(), dec!(1000));
        assert_eq!(balance_of(&account, Currency::Usd).unwrap(), dec!(25));
        assert_eq!(balance_of(&account, Currency::Gbp).unwrap(), dec!(10));
        assert!(matches!(
            balance_of(&account, Currency::Kes),
            Err(WalletError::UnsupportedCurrency { .. })
        ));
    }

    #[test]
    fn test_balance_of_rejects_corrupt_local_currency() {
        let account = account_model("XXX");
        assert!(matches!(
            balance_of(&account, Currency::Usd),
            Err(WalletError::InvalidCurrencyCode(_))
        ));
    }

    #[test]
    fn test_balance_of_trims_char_padding() {
        // CHAR(3) columns come back space-padded from some drivers.
        let account = account_model("NGN ");
        assert_eq!(balance_of(&account, Currency::Ngn).unwrap(), dec!(1000));
    }

    #[test]
    fn test_dedupe_returns_prior_result() {
        let entry = entry_model(sea_orm_active_enums::EntryStatus::Successful);
        assert!(dedupe_result(entry).is_ok());

        let entry = entry_model(sea_orm_active_enums::EntryStatus::Pending);
        assert!(dedupe_result(entry).is_ok());
    }

    #[test]
    fn test_dedupe_rejects_terminated_references() {
        for status in [
            sea_orm_active_enums::EntryStatus::Failed,
            sea_orm_active_enums::EntryStatus::Cancelled,
        ] {
            let entry = entry_model(status);
            assert!(matches!(
                dedupe_result(entry),
                Err(WalletError::DuplicateIdempotencyRef(_))
            ));
        }
    }

    #[test]
    fn test_lifetime_counter_rules() {
        assert_eq!(
            lifetime_counter(EntryDirection::Credit, "Course Purchase"),
            Some(LifetimeCounter::Credited)
        );
        assert_eq!(
            lifetime_counter(EntryDirection::Debit, PAYOUT_SERVICE),
            Some(LifetimeCounter::PaidOut)
        );
        // Refund credits are reversals, not earnings.
        assert_eq!(lifetime_counter(EntryDirection::Credit, PAYOUT_REFUND_SERVICE), None);
        // Non-payout debits feed neither counter.
        assert_eq!(lifetime_counter(EntryDirection::Debit, "Manual Adjustment"), None);
    }

    #[test]
    fn test_lock_timeout_detection() {
        let err = DbErr::Custom("canceling statement due to lock timeout".to_string());
        assert!(is_lock_timeout(&err));

        let err = DbErr::Custom("SQLSTATE 55P03: lock not available".to_string());
        assert!(is_lock_timeout(&err));

        let err = DbErr::Custom("duplicate key value".to_string());
        assert!(!is_lock_timeout(&err));
    }
}
