//! Initial database migration.
//!
//! Creates the wallet ledger tables: accounts, transactions, and payouts,
//! together with the enums, constraints, and indexes the repositories rely
//! on. Non-negativity of every balance column is enforced here as a backstop
//! to the application-level mutator.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: WALLET ACCOUNTS
        // ============================================================
        db.execute_unprepared(WALLET_ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 3: WALLET TRANSACTIONS (append-mostly ledger)
        // ============================================================
        db.execute_unprepared(WALLET_TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 4: PAYOUTS
        // ============================================================
        db.execute_unprepared(PAYOUTS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Wallet owner kinds
CREATE TYPE owner_kind AS ENUM (
    'tutor',
    'organization'
);

-- Ledger entry direction
CREATE TYPE entry_direction AS ENUM (
    'credit',
    'debit'
);

-- Ledger entry status; only 'successful' entries count toward balances
CREATE TYPE entry_status AS ENUM (
    'pending',
    'successful',
    'failed',
    'cancelled'
);

-- Payout lifecycle status
CREATE TYPE payout_status AS ENUM (
    'pending',
    'processing',
    'successful',
    'failed',
    'cancelled'
);
";

const WALLET_ACCOUNTS_SQL: &str = r"
-- One wallet per (owner, kind). Balance columns are cached projections of
-- wallet_transactions; mutation happens only under SELECT ... FOR UPDATE.
CREATE TABLE wallet_accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    owner_id UUID NOT NULL,
    owner_kind owner_kind NOT NULL,
    local_currency CHAR(3) NOT NULL,
    local_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    usd_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    gbp_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total_credited NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total_paid_out NUMERIC(19, 4) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_wallet_owner UNIQUE (owner_id, owner_kind),
    CONSTRAINT chk_local_balance_non_negative CHECK (local_balance >= 0),
    CONSTRAINT chk_usd_balance_non_negative CHECK (usd_balance >= 0),
    CONSTRAINT chk_gbp_balance_non_negative CHECK (gbp_balance >= 0),
    CONSTRAINT chk_totals_non_negative CHECK (total_credited >= 0 AND total_paid_out >= 0)
);

CREATE INDEX idx_wallet_accounts_owner ON wallet_accounts(owner_id, owner_kind);
";

const WALLET_TRANSACTIONS_SQL: &str = r"
-- Append-mostly ledger. Rows are immutable once terminal; status is the
-- only column ever updated, and only while pending.
CREATE TABLE wallet_transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    seq BIGINT GENERATED ALWAYS AS IDENTITY,
    account_id UUID NOT NULL REFERENCES wallet_accounts(id),
    direction entry_direction NOT NULL,
    amount NUMERIC(19, 4) NOT NULL,
    currency CHAR(3) NOT NULL,
    service VARCHAR(120) NOT NULL,
    reference VARCHAR(120) NOT NULL,
    balance_before NUMERIC(19, 4),
    balance_after NUMERIC(19, 4),
    status entry_status NOT NULL,
    metadata JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_wallet_transactions_reference UNIQUE (reference),
    CONSTRAINT chk_amount_positive CHECK (amount > 0)
);

-- Replay order for reconciliation
CREATE INDEX idx_wt_account_seq ON wallet_transactions(account_id, seq);

-- Balance recomputation per currency
CREATE INDEX idx_wt_account_currency_status ON wallet_transactions(account_id, currency, status);

-- Refund lookups by service label
CREATE INDEX idx_wt_account_service ON wallet_transactions(account_id, service) WHERE status = 'successful';
";

const PAYOUTS_SQL: &str = r"
-- One row per withdrawal request. The debit entry referencing the payout
-- commits in the same transaction that inserts this row.
CREATE TABLE payouts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    account_id UUID NOT NULL REFERENCES wallet_accounts(id),
    amount NUMERIC(19, 4) NOT NULL,
    currency CHAR(3) NOT NULL,
    fee NUMERIC(19, 4) NOT NULL DEFAULT 0,
    net_amount NUMERIC(19, 4) NOT NULL,
    bank_account_id UUID NOT NULL,
    provider_reference VARCHAR(120),
    status payout_status NOT NULL DEFAULT 'pending',
    failure_reason TEXT,
    refunded BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_payout_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_payout_fee_non_negative CHECK (fee >= 0),
    CONSTRAINT chk_payout_net_non_negative CHECK (net_amount >= 0)
);

CREATE INDEX idx_payouts_account_status ON payouts(account_id, status);

-- The auditor's safety-net scan for failed payouts still awaiting refund
CREATE INDEX idx_payouts_unrefunded ON payouts(account_id) WHERE status = 'failed' AND refunded = FALSE;
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS payouts CASCADE;
DROP TABLE IF EXISTS wallet_transactions CASCADE;
DROP TABLE IF EXISTS wallet_accounts CASCADE;
DROP TYPE IF EXISTS payout_status;
DROP TYPE IF EXISTS entry_status;
DROP TYPE IF EXISTS entry_direction;
DROP TYPE IF EXISTS owner_kind;
";
