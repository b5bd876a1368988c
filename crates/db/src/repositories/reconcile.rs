//! Reconciliation auditor: recomputes balances from transaction history,
//! surfaces drift and refund anomalies, and performs the guarded fix.
//!
//! The auditor reads with non-locking snapshots and never writes except
//! through the explicit `fix` action, which re-locks the account row and
//! re-verifies the submitted value before touching the projection.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use tutorpay_core::payout::{self, PayoutStatus, PAYOUT_REFUND_SERVICE};
use tutorpay_core::reconcile::BalanceDiff;
use tutorpay_core::wallet::balance::replay;
use tutorpay_shared::types::{Currency, PayoutId, WalletOwner};

use crate::entities::{payouts, sea_orm_active_enums, wallet_accounts, wallet_transactions};
use crate::repositories::payout::{PayoutError, PayoutRepository};
use crate::repositories::wallet::{self, balance_of, WalletError, WalletRepository};

/// Error types for reconciliation operations.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// No wallet exists for the owner.
    #[error("Wallet account not found for owner {0}")]
    AccountNotFound(Uuid),

    /// The guarded fix rejected a stale computed balance.
    ///
    /// The submitted value must match a fresh recomputation performed under
    /// the account row lock; a mismatch means the report went stale or a
    /// mutation slipped in between.
    #[error(
        "Guarded fix rejected: submitted computed balance {submitted} \
         does not match fresh recomputation {fresh}"
    )]
    StaleComputation {
        /// The balance the operator submitted.
        submitted: Decimal,
        /// The balance recomputed under the lock.
        fresh: Decimal,
    },

    /// Wallet-level error (lock timeout, unsupported currency).
    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// Completing a missing refund failed; the payout stays unrefunded.
    #[error(transparent)]
    Refund(#[from] PayoutError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Successful refund entries sharing one payout link.
#[derive(Debug, Clone)]
pub struct DuplicateRefundGroup {
    /// The payout the refunds point at.
    pub payout_id: PayoutId,
    /// The refund entries; more than one is a correctness violation.
    pub entries: Vec<wallet_transactions::Model>,
}

/// Reconciliation repository: read-only recomputation plus the guarded fix.
#[derive(Debug, Clone)]
pub struct ReconciliationRepository {
    db: DatabaseConnection,
    wallet: WalletRepository,
}

impl ReconciliationRepository {
    /// Creates a new reconciliation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, wallet: WalletRepository) -> Self {
        Self { db, wallet }
    }

    /// Recomputes an account balance by replaying all successful entries
    /// for the currency in creation order, starting from zero.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` when the owner has no wallet.
    pub async fn recompute(
        &self,
        owner: WalletOwner,
        currency: Currency,
    ) -> Result<Decimal, ReconcileError> {
        let account = self.require_account(owner).await?;
        recompute_in(&self.db, account.id, currency).await
    }

    /// Compares the stored balance against the recomputed one.
    ///
    /// Drift is reported, never raised as an error.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` when the owner has no wallet.
    pub async fn diff(
        &self,
        owner: WalletOwner,
        currency: Currency,
    ) -> Result<BalanceDiff, ReconcileError> {
        let account = self.require_account(owner).await?;
        let stored = balance_of(&account, currency)?;
        let computed = recompute_in(&self.db, account.id, currency).await?;
        Ok(BalanceDiff::new(currency, stored, computed))
    }

    /// Finds successful refund entries that share a payout link.
    ///
    /// More than one refund per payout means the exactly-once guarantee was
    /// violated (historical data predating the deterministic references, or
    /// an operator bypass).
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` when the owner has no wallet.
    pub async fn find_duplicate_refunds(
        &self,
        owner: WalletOwner,
    ) -> Result<Vec<DuplicateRefundGroup>, ReconcileError> {
        let account = self.require_account(owner).await?;

        let refunds = wallet_transactions::Entity::find()
            .filter(wallet_transactions::Column::AccountId.eq(account.id))
            .filter(wallet_transactions::Column::Service.eq(PAYOUT_REFUND_SERVICE))
            .filter(
                wallet_transactions::Column::Status
                    .eq(sea_orm_active_enums::EntryStatus::Successful),
            )
            .order_by_asc(wallet_transactions::Column::Seq)
            .all(&self.db)
            .await?;

        Ok(group_duplicate_refunds(refunds))
    }

    /// Finds failed payouts with no successful refund entry.
    ///
    /// Checks the ledger itself rather than the `refunded` marker, since
    /// the marker is only a cache of the same fact.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` when the owner has no wallet.
    pub async fn find_unrefunded_failed_payouts(
        &self,
        owner: WalletOwner,
    ) -> Result<Vec<payouts::Model>, ReconcileError> {
        let account = self.require_account(owner).await?;

        let failed = payouts::Entity::find()
            .filter(payouts::Column::AccountId.eq(account.id))
            .filter(
                payouts::Column::Status
                    .eq(sea_orm_active_enums::PayoutStatus::from(PayoutStatus::Failed)),
            )
            .order_by_asc(payouts::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let mut unrefunded = Vec::new();
        for p in failed {
            let reference = payout::refund_reference(PayoutId::from_uuid(p.id));
            let refund = wallet_transactions::Entity::find()
                .filter(wallet_transactions::Column::Reference.eq(reference))
                .filter(
                    wallet_transactions::Column::Status
                        .eq(sea_orm_active_enums::EntryStatus::Successful),
                )
                .one(&self.db)
                .await?;
            if refund.is_none() {
                unrefunded.push(p);
            }
        }

        Ok(unrefunded)
    }

    /// Sets the stored balance to the computed value, under the same locked
    /// transaction discipline as every other balance mutation.
    ///
    /// The submitted value must match a fresh recomputation performed under
    /// the lock; the correction is logged with before/after values.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` when the owner has no wallet
    /// - `StaleComputation` when the submitted value no longer matches
    /// - `LockTimeout` (via `Wallet`) when the row lock wait expires
    pub async fn fix(
        &self,
        owner: WalletOwner,
        currency: Currency,
        computed: Decimal,
    ) -> Result<BalanceDiff, ReconcileError> {
        let txn = self.db.begin().await?;
        self.wallet.set_lock_timeout(&txn).await?;

        let account = wallet::lock_account(&txn, owner)
            .await?
            .ok_or(ReconcileError::AccountNotFound(owner.id.into_inner()))?;

        let stored = balance_of(&account, currency)?;
        let fresh = recompute_in(&txn, account.id, currency).await?;
        if fresh != computed {
            return Err(ReconcileError::StaleComputation {
                submitted: computed,
                fresh,
            });
        }

        let diff = BalanceDiff::new(currency, stored, fresh);
        if diff.is_clean() {
            // Nothing to correct; leave the row untouched.
            txn.commit().await?;
            return Ok(diff);
        }

        tracing::warn!(
            owner_id = %owner.id,
            owner_kind = %owner.kind,
            %currency,
            before = %stored,
            after = %fresh,
            delta = %diff.delta,
            "correcting balance drift"
        );

        let local: Currency = account
            .local_currency
            .trim()
            .parse()
            .map_err(|_| WalletError::InvalidCurrencyCode(account.local_currency.clone()))?;
        let slot = tutorpay_core::wallet::balance::balance_slot(local, currency)
            .map_err(WalletError::from)?;

        let mut active: wallet_accounts::ActiveModel = account.into();
        match slot {
            tutorpay_core::wallet::balance::BalanceSlot::Local => {
                active.local_balance = Set(fresh);
            }
            tutorpay_core::wallet::balance::BalanceSlot::Usd => active.usd_balance = Set(fresh),
            tutorpay_core::wallet::balance::BalanceSlot::Gbp => active.gbp_balance = Set(fresh),
        }
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?;

        txn.commit().await?;
        Ok(diff)
    }

    /// Completes the missing refund for every failed payout the ledger has
    /// no compensating credit for.
    ///
    /// Refunds lost to transient errors are re-driven through the payout
    /// state machine, so the deterministic reference still guarantees
    /// exactly-once.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` when the owner has no wallet
    /// - `Refund` when a refund credit still cannot be written; payouts
    ///   completed before the failure stay completed
    pub async fn complete_missing_refunds(
        &self,
        owner: WalletOwner,
        payout_repo: &PayoutRepository,
    ) -> Result<Vec<payouts::Model>, ReconcileError> {
        let unrefunded = self.find_unrefunded_failed_payouts(owner).await?;

        let mut completed = Vec::with_capacity(unrefunded.len());
        for payout in unrefunded {
            let payout_id = PayoutId::from_uuid(payout.id);
            let refunded = payout_repo.retry_refund(payout_id).await?;
            tracing::info!(
                owner_id = %owner.id,
                payout_id = %payout_id,
                amount = %refunded.amount,
                "completed missing refund"
            );
            completed.push(refunded);
        }
        Ok(completed)
    }

    async fn require_account(
        &self,
        owner: WalletOwner,
    ) -> Result<wallet_accounts::Model, ReconcileError> {
        self.wallet
            .get_account(owner)
            .await?
            .ok_or(ReconcileError::AccountNotFound(owner.id.into_inner()))
    }
}

/// Replays the ledger for one account/currency on any connection.
async fn recompute_in<C: ConnectionTrait>(
    conn: &C,
    account_id: Uuid,
    currency: Currency,
) -> Result<Decimal, ReconcileError> {
    let entries = wallet_transactions::Entity::find()
        .filter(wallet_transactions::Column::AccountId.eq(account_id))
        .filter(wallet_transactions::Column::Currency.eq(currency.to_string()))
        .order_by_asc(wallet_transactions::Column::Seq)
        .all(conn)
        .await?;

    Ok(replay(entries.into_iter().map(|e| {
        (e.direction.into(), e.status.into(), e.amount)
    })))
}

/// Groups refund entries by their payout link and keeps groups with more
/// than one member.
fn group_duplicate_refunds(
    refunds: Vec<wallet_transactions::Model>,
) -> Vec<DuplicateRefundGroup> {
    let mut by_payout: HashMap<PayoutId, Vec<wallet_transactions::Model>> = HashMap::new();
    for entry in refunds {
        let Some(payout_id) = entry
            .metadata
            .as_ref()
            .and_then(payout::payout_id_from_metadata)
        else {
            continue;
        };
        by_payout.entry(payout_id).or_default().push(entry);
    }

    let mut groups: Vec<DuplicateRefundGroup> = by_payout
        .into_iter()
        .filter(|(_, entries)| entries.len() > 1)
        .map(|(payout_id, entries)| DuplicateRefundGroup { payout_id, entries })
        .collect();
    groups.sort_by_key(|g| g.entries[0].seq);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn refund_entry(payout_id: Option<PayoutId>, seq: i64) -> wallet_transactions::Model {
        wallet_transactions::Model {
            id: Uuid::new_v4(),
            seq,
            account_id: Uuid::new_v4(),
            direction: sea_orm_active_enums::EntryDirection::Credit,
            amount: dec!(1000),
            currency: "NGN".to_string(),
            service: PAYOUT_REFUND_SERVICE.to_string(),
            reference: format!("ref-{seq}"),
            balance_before: None,
            balance_after: None,
            status: sea_orm_active_enums::EntryStatus::Successful,
            metadata: payout_id.map(payout::payout_metadata),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_no_duplicates_for_distinct_payouts() {
        let groups = group_duplicate_refunds(vec![
            refund_entry(Some(PayoutId::new()), 1),
            refund_entry(Some(PayoutId::new()), 2),
        ]);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_duplicate_refunds_grouped() {
        let dup = PayoutId::new();
        let groups = group_duplicate_refunds(vec![
            refund_entry(Some(dup), 1),
            refund_entry(Some(PayoutId::new()), 2),
            refund_entry(Some(dup), 3),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].payout_id, dup);
        assert_eq!(groups[0].entries.len(), 2);
    }

    #[test]
    fn test_entries_without_link_ignored() {
        let groups = group_duplicate_refunds(vec![
            refund_entry(None, 1),
            refund_entry(None, 2),
        ]);
        assert!(groups.is_empty());
    }
}
