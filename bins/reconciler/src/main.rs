//! Reconciliation command for Tutorpay wallets.
//!
//! Reports drift between the stored balance projection and the transaction
//! history for one wallet, plus refund anomalies. With `--apply` it performs
//! the guarded fix and completes missing refunds for failed payouts.
//!
//! Usage:
//!   reconciler --owner-id <uuid> --owner-kind <tutor|organization> \
//!              [--currency <code>] [--apply]

use std::str::FromStr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tutorpay_db::{connect, BankAccountRegistry, PayoutRepository, ReconciliationRepository, WalletRepository};
use tutorpay_shared::types::{BankAccountId, Currency, OwnerId, OwnerKind, WalletOwner};
use tutorpay_shared::AppConfig;

/// Registry that vouches for nothing. The reconciler only completes refunds
/// and never requests payouts, so no destination is ever consulted.
struct NoDestinations;

#[async_trait::async_trait]
impl BankAccountRegistry for NoDestinations {
    async fn is_verified(&self, _owner: WalletOwner, _bank_account: BankAccountId) -> bool {
        false
    }
}

struct Args {
    owner: WalletOwner,
    currency: Option<Currency>,
    apply: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut owner_id: Option<OwnerId> = None;
    let mut owner_kind: Option<OwnerKind> = None;
    let mut currency: Option<Currency> = None;
    let mut apply = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--owner-id" => {
                let value = args.next().ok_or("--owner-id requires a value")?;
                owner_id = Some(OwnerId::from_str(&value).map_err(|e| e.to_string())?);
            }
            "--owner-kind" => {
                let value = args.next().ok_or("--owner-kind requires a value")?;
                owner_kind = Some(OwnerKind::from_str(&value)?);
            }
            "--currency" => {
                let value = args.next().ok_or("--currency requires a value")?;
                currency = Some(Currency::from_str(&value)?);
            }
            "--apply" => apply = true,
            other => return Err(format!("Unknown argument: {other}")),
        }
    }

    let owner = WalletOwner::new(
        owner_id.ok_or("--owner-id is required")?,
        owner_kind.ok_or("--owner-kind is required")?,
    );

    Ok(Args {
        owner,
        currency,
        apply,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tutorpay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            eprintln!(
                "Usage: reconciler --owner-id <uuid> --owner-kind <tutor|organization> \
                 [--currency <code>] [--apply]"
            );
            std::process::exit(2);
        }
    };

    // Load configuration and connect
    let config = AppConfig::load()?;
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    let wallet = WalletRepository::new(db.clone(), config.wallet.clone());
    let reconcile = ReconciliationRepository::new(db.clone(), wallet.clone());
    let payouts = PayoutRepository::new(
        db,
        wallet.clone(),
        Arc::new(NoDestinations),
        config.payout.fee_bps,
    );

    let account = wallet
        .get_account(args.owner)
        .await?
        .ok_or_else(|| anyhow::anyhow!("No wallet account for owner {}", args.owner.id))?;

    // The currencies to audit: the requested one, or every slot the
    // account carries.
    let currencies = match args.currency {
        Some(currency) => vec![currency],
        None => {
            let local = Currency::from_str(account.local_currency.trim())
                .map_err(|e| anyhow::anyhow!(e))?;
            let mut all = vec![local];
            for secondary in [Currency::Usd, Currency::Gbp] {
                if secondary != local {
                    all.push(secondary);
                }
            }
            all
        }
    };

    println!(
        "Reconciling wallet {} (owner {} / {})",
        account.id, args.owner.id, args.owner.kind
    );

    let mut drift_found = false;
    for currency in currencies {
        let diff = reconcile.diff(args.owner, currency).await?;
        if diff.is_clean() {
            println!("  {currency}: stored {} == computed {}", diff.stored, diff.computed);
            continue;
        }

        drift_found = true;
        println!(
            "  {currency}: DRIFT stored {} != computed {} (delta {})",
            diff.stored, diff.computed, diff.delta
        );

        if args.apply {
            let fixed = reconcile.fix(args.owner, currency, diff.computed).await?;
            println!(
                "  {currency}: fixed, balance set to {} (was {})",
                fixed.computed, fixed.stored
            );
        }
    }

    let duplicates = reconcile.find_duplicate_refunds(args.owner).await?;
    for group in &duplicates {
        println!(
            "  DUPLICATE REFUNDS: payout {} has {} refund entries",
            group.payout_id,
            group.entries.len()
        );
    }

    let unrefunded = reconcile.find_unrefunded_failed_payouts(args.owner).await?;
    for payout in &unrefunded {
        println!(
            "  UNREFUNDED: payout {} failed ({}) with no refund entry",
            payout.id,
            payout.failure_reason.as_deref().unwrap_or("no reason recorded")
        );
    }
    if args.apply && !unrefunded.is_empty() {
        let completed = reconcile
            .complete_missing_refunds(args.owner, &payouts)
            .await?;
        for payout in &completed {
            println!("  UNREFUNDED: payout {} refund completed", payout.id);
        }
    }

    if !drift_found && duplicates.is_empty() && unrefunded.is_empty() {
        println!("  Clean: no drift, no refund anomalies");
    } else if !args.apply {
        println!("Run again with --apply to fix drift and complete missing refunds");
    }

    Ok(())
}
