//! Payout repository: drives a withdrawal from request through the external
//! transfer to its terminal state, including the automatic refund.
//!
//! The wallet debit for a request and the payout row commit in one database
//! transaction; the compensating credit for a failed or cancelled payout is
//! deduplicated structurally by its deterministic idempotency reference.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use tutorpay_core::payout::{
    self, fee, InvalidTransition, PayoutStatus, PAYOUT_REFUND_SERVICE, PAYOUT_SERVICE,
};
use tutorpay_core::wallet::EntryDirection;
use tutorpay_shared::types::{BankAccountId, Currency, PayoutId, WalletOwner};

use crate::entities::{payouts, sea_orm_active_enums, wallet_accounts};
use crate::ports::{BankAccountRegistry, TransferError, TransferProvider, TransferRequest};
use crate::repositories::wallet::{ApplyEntryInput, WalletError, WalletRepository};

/// Error types for payout operations.
#[derive(Debug, thiserror::Error)]
pub enum PayoutError {
    /// The owner has no verified bank destination matching the request.
    #[error("No verified bank destination for owner {0}")]
    NoVerifiedDestination(Uuid),

    /// Payout not found.
    #[error("Payout not found: {0}")]
    PayoutNotFound(PayoutId),

    /// The requested state change is not allowed by the state machine.
    #[error(transparent)]
    InvalidStateTransition(#[from] InvalidTransition),

    /// The compensating credit for a failed payout could not be written.
    /// The payout stays `failed` and unrefunded; the reconciliation auditor
    /// is the safety net that completes it.
    #[error("Refund for payout {payout_id} failed: {source}")]
    RefundFailed {
        /// The payout awaiting its refund.
        payout_id: PayoutId,
        /// Why the compensating credit was not written.
        #[source]
        source: Box<WalletError>,
    },

    /// The external transfer provider rejected the dispatch.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Wallet-level error (insufficient funds, lock timeout, dedup).
    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for requesting a payout.
#[derive(Debug, Clone)]
pub struct RequestPayoutInput {
    /// The wallet owner withdrawing funds.
    pub owner: WalletOwner,
    /// Amount to withdraw (gross; the transfer fee comes out of it).
    pub amount: Decimal,
    /// Currency to withdraw from.
    pub currency: Currency,
    /// Destination bank account; must be verified for the owner.
    pub bank_account: BankAccountId,
}

/// Payout repository driving the withdrawal state machine.
#[derive(Clone)]
pub struct PayoutRepository {
    db: DatabaseConnection,
    wallet: WalletRepository,
    registry: Arc<dyn BankAccountRegistry>,
    fee_bps: u32,
}

impl PayoutRepository {
    /// Creates a new payout repository.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        wallet: WalletRepository,
        registry: Arc<dyn BankAccountRegistry>,
        fee_bps: u32,
    ) -> Self {
        Self {
            db,
            wallet,
            registry,
            fee_bps,
        }
    }

    /// Requests a payout: verifies the destination, then atomically debits
    /// the wallet and creates the payout row in `pending`.
    ///
    /// The debit cannot succeed without the payout row, and vice versa.
    ///
    /// # Errors
    ///
    /// - `NoVerifiedDestination` when the registry does not vouch for the
    ///   bank account
    /// - `InsufficientFunds` (via `Wallet`) when the balance cannot cover
    ///   the amount
    pub async fn request_payout(
        &self,
        input: RequestPayoutInput,
    ) -> Result<payouts::Model, PayoutError> {
        if !self
            .registry
            .is_verified(input.owner, input.bank_account)
            .await
        {
            return Err(PayoutError::NoVerifiedDestination(
                input.owner.id.into_inner(),
            ));
        }

        let payout_id = PayoutId::new();
        let transfer_fee = fee::transfer_fee(input.amount, self.fee_bps);
        let net_amount = input.amount - transfer_fee;

        let txn = self.db.begin().await?;
        self.wallet.set_lock_timeout(&txn).await?;

        let debit = self
            .wallet
            .apply_entry_in(
                &txn,
                &ApplyEntryInput {
                    owner: input.owner,
                    currency: input.currency,
                    direction: EntryDirection::Debit,
                    amount: input.amount,
                    service: PAYOUT_SERVICE.to_string(),
                    reference: payout::payout_reference(payout_id),
                    metadata: Some(payout::payout_metadata(payout_id)),
                },
            )
            .await?;

        let now = Utc::now().into();
        let payout = payouts::ActiveModel {
            id: Set(payout_id.into_inner()),
            account_id: Set(debit.account_id),
            amount: Set(input.amount),
            currency: Set(input.currency.to_string()),
            fee: Set(transfer_fee),
            net_amount: Set(net_amount),
            bank_account_id: Set(input.bank_account.into_inner()),
            provider_reference: Set(None),
            status: Set(sea_orm_active_enums::PayoutStatus::Pending),
            failure_reason: Set(None),
            refunded: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let payout = payout.insert(&txn).await?;

        txn.commit().await?;

        tracing::info!(
            payout_id = %payout_id,
            owner_id = %input.owner.id,
            amount = %input.amount,
            currency = %input.currency,
            "payout requested, wallet debited"
        );

        Ok(payout)
    }

    /// Dispatches a pending payout to the external transfer provider and
    /// records the provider reference.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless the payout is `pending`
    /// - `Transfer` when the provider rejects the request
    pub async fn dispatch(
        &self,
        payout_id: PayoutId,
        provider: &dyn TransferProvider,
    ) -> Result<payouts::Model, PayoutError> {
        let payout = self.get_payout(payout_id).await?;
        let status: PayoutStatus = payout.status.clone().into();
        status.validate_transition(PayoutStatus::Processing)?;

        let currency: Currency = payout
            .currency
            .trim()
            .parse()
            .map_err(|_| WalletError::InvalidCurrencyCode(payout.currency.clone()))?;

        let reference = provider
            .initiate(TransferRequest {
                amount: payout.net_amount,
                currency,
                destination: BankAccountId::from_uuid(payout.bank_account_id),
            })
            .await?;

        self.mark_processing(payout_id, &reference).await
    }

    /// Marks a pending payout as processing and attaches the provider
    /// reference. Repeated calls with the same reference are no-ops.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` for any other state change.
    pub async fn mark_processing(
        &self,
        payout_id: PayoutId,
        provider_reference: &str,
    ) -> Result<payouts::Model, PayoutError> {
        let payout = self.get_payout(payout_id).await?;
        let status: PayoutStatus = payout.status.clone().into();

        // Idempotent redelivery of the same dispatch notification.
        if status == PayoutStatus::Processing
            && payout.provider_reference.as_deref() == Some(provider_reference)
        {
            return Ok(payout);
        }

        status.validate_transition(PayoutStatus::Processing)?;

        let mut active: payouts::ActiveModel = payout.into();
        active.status = Set(sea_orm_active_enums::PayoutStatus::Processing);
        active.provider_reference = Set(Some(provider_reference.to_string()));
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Marks a processing payout as successful. Terminal; the funds left
    /// the ledger with the original debit, so no further ledger action.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` unless the payout is `processing`.
    pub async fn mark_successful(&self, payout_id: PayoutId) -> Result<payouts::Model, PayoutError> {
        let payout = self.get_payout(payout_id).await?;
        let status: PayoutStatus = payout.status.clone().into();
        status.validate_transition(PayoutStatus::Successful)?;

        let mut active: payouts::ActiveModel = payout.into();
        active.status = Set(sea_orm_active_enums::PayoutStatus::Successful);
        active.updated_at = Set(Utc::now().into());
        let payout = active.update(&self.db).await?;

        tracing::info!(payout_id = %payout_id, "payout completed");
        Ok(payout)
    }

    /// Marks a payout as failed and writes exactly one compensating credit.
    ///
    /// The failed status commits first, so a crash or refund error never
    /// loses the failure; the refund then commits together with the
    /// `refunded` marker. Redelivered failure notifications are no-ops once
    /// the refund exists, and re-attempt it while it is missing.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` when the payout is already successful or
    ///   cancelled
    /// - `RefundFailed` when the compensating credit could not be written;
    ///   the payout stays `failed` with `refunded = false`
    pub async fn mark_failed(
        &self,
        payout_id: PayoutId,
        reason: &str,
    ) -> Result<payouts::Model, PayoutError> {
        let payout = self.get_payout(payout_id).await?;
        let status: PayoutStatus = payout.status.clone().into();

        let payout = if status == PayoutStatus::Failed {
            // Redelivered failure notification.
            if payout.refunded {
                return Ok(payout);
            }
            payout
        } else {
            status.validate_transition(PayoutStatus::Failed)?;

            let mut active: payouts::ActiveModel = payout.into();
            active.status = Set(sea_orm_active_enums::PayoutStatus::Failed);
            active.failure_reason = Set(Some(reason.to_string()));
            active.updated_at = Set(Utc::now().into());
            let payout = active.update(&self.db).await?;

            tracing::warn!(payout_id = %payout_id, reason, "payout failed, refunding");
            payout
        };

        self.refund(payout).await
    }

    /// Re-attempts the compensating credit for a failed payout.
    ///
    /// Used by the reconciliation auditor to complete refunds that were
    /// lost to transient errors. No-op when the refund already exists.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless the payout is `failed`
    /// - `RefundFailed` when the credit still cannot be written
    pub async fn retry_refund(&self, payout_id: PayoutId) -> Result<payouts::Model, PayoutError> {
        let payout = self.get_payout(payout_id).await?;
        let status: PayoutStatus = payout.status.clone().into();

        if status != PayoutStatus::Failed {
            return Err(InvalidTransition {
                from: status,
                to: PayoutStatus::Failed,
            }
            .into());
        }
        if payout.refunded {
            return Ok(payout);
        }

        self.refund(payout).await
    }

    /// Cancels a pending payout and returns the debited funds.
    ///
    /// Once a payout is `processing` the external transfer is in flight and
    /// cancellation is no longer permitted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` unless the payout is `pending`.
    pub async fn cancel(&self, payout_id: PayoutId) -> Result<payouts::Model, PayoutError> {
        let payout = self.get_payout(payout_id).await?;
        let status: PayoutStatus = payout.status.clone().into();
        status.validate_transition(PayoutStatus::Cancelled)?;

        // Cancellation is atomic: status, refund credit, and the refunded
        // marker commit together, or the payout stays pending.
        let txn = self.db.begin().await?;
        self.wallet.set_lock_timeout(&txn).await?;

        self.refund_in(&txn, &payout).await?;

        let mut active: payouts::ActiveModel = payout.into();
        active.status = Set(sea_orm_active_enums::PayoutStatus::Cancelled);
        active.refunded = Set(true);
        active.updated_at = Set(Utc::now().into());
        let payout = active.update(&txn).await?;

        txn.commit().await?;

        tracing::info!(payout_id = %payout_id, "payout cancelled, funds returned");
        Ok(payout)
    }

    /// Gets a payout by ID.
    ///
    /// # Errors
    ///
    /// Returns `PayoutNotFound` for an unknown id.
    pub async fn get_payout(&self, payout_id: PayoutId) -> Result<payouts::Model, PayoutError> {
        payouts::Entity::find_by_id(payout_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(PayoutError::PayoutNotFound(payout_id))
    }

    /// Lists payouts for an account, newest first, optionally filtered by
    /// status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_payouts(
        &self,
        account_id: Uuid,
        status: Option<PayoutStatus>,
    ) -> Result<Vec<payouts::Model>, PayoutError> {
        let mut query =
            payouts::Entity::find().filter(payouts::Column::AccountId.eq(account_id));

        if let Some(status) = status {
            query = query
                .filter(payouts::Column::Status.eq(sea_orm_active_enums::PayoutStatus::from(status)));
        }

        let payouts = query
            .order_by_desc(payouts::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(payouts)
    }

    /// Writes the compensating credit for a failed payout and marks it
    /// refunded, in one transaction.
    async fn refund(&self, payout: payouts::Model) -> Result<payouts::Model, PayoutError> {
        let payout_id = PayoutId::from_uuid(payout.id);

        let txn = match self.db.begin().await {
            Ok(txn) => txn,
            Err(err) => {
                return Err(PayoutError::RefundFailed {
                    payout_id,
                    source: Box::new(WalletError::Database(err)),
                });
            }
        };

        let result = async {
            self.wallet.set_lock_timeout(&txn).await?;
            self.refund_in(&txn, &payout).await
        }
        .await;

        if let Err(err) = result {
            return Err(PayoutError::RefundFailed {
                payout_id,
                source: Box::new(err),
            });
        }

        let mut active: payouts::ActiveModel = payout.into();
        active.refunded = Set(true);
        active.updated_at = Set(Utc::now().into());
        let update_result = async {
            let payout = active.update(&txn).await?;
            txn.commit().await?;
            Ok::<_, DbErr>(payout)
        }
        .await;

        match update_result {
            Ok(payout) => {
                tracing::info!(payout_id = %payout_id, amount = %payout.amount, "payout refunded");
                Ok(payout)
            }
            Err(err) => Err(PayoutError::RefundFailed {
                payout_id,
                source: Box::new(WalletError::Database(err)),
            }),
        }
    }

    /// Applies the refund credit inside an existing transaction.
    ///
    /// The idempotency reference is derived from the payout id, so the
    /// mutator's dedup makes a second refund structurally impossible.
    async fn refund_in(
        &self,
        txn: &DatabaseTransaction,
        payout: &payouts::Model,
    ) -> Result<(), WalletError> {
        let payout_id = PayoutId::from_uuid(payout.id);
        let owner = account_owner(txn, payout.account_id).await?;
        let currency: Currency = payout
            .currency
            .trim()
            .parse()
            .map_err(|_| WalletError::InvalidCurrencyCode(payout.currency.clone()))?;

        self.wallet
            .apply_entry_in(
                txn,
                &ApplyEntryInput {
                    owner,
                    currency,
                    direction: EntryDirection::Credit,
                    amount: payout.amount,
                    service: PAYOUT_REFUND_SERVICE.to_string(),
                    reference: payout::refund_reference(payout_id),
                    metadata: Some(payout::payout_metadata(payout_id)),
                },
            )
            .await?;
        Ok(())
    }
}

/// Resolves the owner key for an account id.
async fn account_owner(
    txn: &DatabaseTransaction,
    account_id: Uuid,
) -> Result<WalletOwner, WalletError> {
    let account = wallet_accounts::Entity::find_by_id(account_id)
        .one(txn)
        .await?
        .ok_or(WalletError::Database(DbErr::RecordNotFound(format!(
            "wallet account {account_id}"
        ))))?;

    Ok(WalletOwner::new(
        tutorpay_shared::types::OwnerId::from_uuid(account.owner_id),
        account.owner_kind.into(),
    ))
}
