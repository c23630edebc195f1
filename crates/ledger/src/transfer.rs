//! Ledger transfer engine.

use std::time::Instant;

use common::{Money, TransactionId, WalletId};
use store::{MarketStore, NewTransaction, TransactionTitle, UnitOfWork, Wallet};

use crate::wallet_store::{credit, debit};
use crate::{LedgerError, Result};

/// Moves money between two wallets as one ledger entry.
///
/// [`TransferEngine::transfer`] owns its unit of work. Callers that need the
/// transfer to commit together with other writes use [`transfer_within`].
#[derive(Clone)]
pub struct TransferEngine<S> {
    store: S,
}

impl<S: MarketStore> TransferEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Transfers `amount` from one wallet to another and commits.
    #[tracing::instrument(skip(self))]
    pub async fn transfer(
        &self,
        from: WalletId,
        to: WalletId,
        amount: Money,
        title: TransactionTitle,
    ) -> Result<TransactionId> {
        let mut uow = self.store.begin().await?;
        let transaction_id = transfer_within(&mut uow, from, to, amount, title).await?;
        uow.commit().await?;

        tracing::info!(%transaction_id, %title, "transfer committed");
        Ok(transaction_id)
    }
}

async fn lock_active<U: UnitOfWork>(uow: &mut U, wallet_id: WalletId) -> Result<Wallet> {
    match uow.lock_wallet(wallet_id).await? {
        Some(wallet) if wallet.is_active => Ok(wallet),
        _ => Err(LedgerError::InactiveWallet { wallet_id }),
    }
}

/// Transfers `amount` inside the caller's unit of work.
///
/// Both wallets are locked in ascending id order before the balance check.
/// The transaction row is written before the balance updates; if either
/// update fails the caller must drop the unit, which discards the row too.
pub async fn transfer_within<U: UnitOfWork>(
    uow: &mut U,
    from: WalletId,
    to: WalletId,
    amount: Money,
    title: TransactionTitle,
) -> Result<TransactionId> {
    let started = Instant::now();
    let result = apply_transfer(uow, from, to, amount, title).await;

    metrics::histogram!("ledger_transfer_duration_seconds")
        .record(started.elapsed().as_secs_f64());
    match &result {
        Ok(_) => {
            metrics::counter!("ledger_transfers_total", "title" => title.as_str()).increment(1);
        }
        Err(e) => {
            metrics::counter!("ledger_transfer_failures_total").increment(1);
            tracing::warn!(%from, %to, amount = %amount, error = %e, "transfer rejected");
        }
    }
    result
}

/// Rejects amounts that are not positive or that the ledger cannot store
/// exactly.
pub(crate) fn check_amount(amount: Money) -> Result<()> {
    if !amount.is_positive() || !amount.fits_storage() {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}

async fn apply_transfer<U: UnitOfWork>(
    uow: &mut U,
    from: WalletId,
    to: WalletId,
    amount: Money,
    title: TransactionTitle,
) -> Result<TransactionId> {
    check_amount(amount)?;
    if from == to {
        return Err(LedgerError::SameWallet(from));
    }

    let (source, target) = if from < to {
        let source = lock_active(uow, from).await?;
        let target = lock_active(uow, to).await?;
        (source, target)
    } else {
        let target = lock_active(uow, to).await?;
        let source = lock_active(uow, from).await?;
        (source, target)
    };

    if source.balance < amount {
        return Err(LedgerError::InsufficientBalance {
            required: amount,
            available: source.balance,
        });
    }

    let transaction = uow
        .insert_transaction(NewTransaction {
            title,
            amount,
            from_wallet_id: Some(source.id),
            to_wallet_id: target.id,
        })
        .await?;

    debit(uow, source.id, source.purpose, amount).await?;
    credit(uow, target.id, target.purpose, amount).await?;

    Ok(transaction.id)
}
