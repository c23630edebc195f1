//! Wallet store: resolving active wallets and applying balance changes.
//!
//! Every function here runs inside a caller-owned unit of work and never
//! commits. Balance updates are conditional on the wallet still being active
//! with the expected purpose; an update that touches no row is an error.

use common::{AccountId, Money, WalletId};
use store::{Wallet, WalletPurpose, WalletRepository};

use crate::{LedgerError, Result};

fn require_active(
    wallet: Option<Wallet>,
    account_id: AccountId,
    purpose: WalletPurpose,
) -> Result<Wallet> {
    match wallet {
        Some(wallet) if wallet.is_active => Ok(wallet),
        _ => Err(LedgerError::WalletNotActivated {
            account_id,
            purpose,
        }),
    }
}

/// Resolves the active wallet of an account.
pub async fn find_active<U: WalletRepository>(
    uow: &mut U,
    account_id: AccountId,
    purpose: WalletPurpose,
) -> Result<Wallet> {
    let wallet = uow.find_wallet(account_id, purpose).await?;
    require_active(wallet, account_id, purpose)
}

/// Resolves the active wallet of an account and locks its row.
pub async fn find_active_for_update<U: WalletRepository>(
    uow: &mut U,
    account_id: AccountId,
    purpose: WalletPurpose,
) -> Result<Wallet> {
    let wallet = uow.find_wallet_for_update(account_id, purpose).await?;
    require_active(wallet, account_id, purpose)
}

/// Resolves and locks two active wallets of one account.
///
/// Rows are locked in ascending wallet id order, the same order transfers
/// use, whatever order the purposes are passed in.
pub async fn lock_active_pair<U: WalletRepository>(
    uow: &mut U,
    account_id: AccountId,
    first: WalletPurpose,
    second: WalletPurpose,
) -> Result<(Wallet, Wallet)> {
    let a = find_active(uow, account_id, first).await?;
    let b = find_active(uow, account_id, second).await?;

    let (low, high) = if a.id <= b.id { (&a, &b) } else { (&b, &a) };
    let low = lock_by_id(uow, account_id, low).await?;
    let high = lock_by_id(uow, account_id, high).await?;

    if low.purpose == first {
        Ok((low, high))
    } else {
        Ok((high, low))
    }
}

async fn lock_by_id<U: WalletRepository>(
    uow: &mut U,
    account_id: AccountId,
    wallet: &Wallet,
) -> Result<Wallet> {
    let locked = uow.lock_wallet(wallet.id).await?;
    require_active(locked, account_id, wallet.purpose)
}

/// Removes `amount` from a wallet, refusing to go below zero.
pub async fn debit<U: WalletRepository>(
    uow: &mut U,
    wallet_id: WalletId,
    purpose: WalletPurpose,
    amount: Money,
) -> Result<()> {
    let wallet = uow
        .lock_wallet(wallet_id)
        .await?
        .ok_or(LedgerError::InactiveWallet { wallet_id })?;

    if wallet.balance < amount {
        return Err(LedgerError::InsufficientBalance {
            required: amount,
            available: wallet.balance,
        });
    }

    let rows = uow.apply_balance_delta(wallet_id, purpose, -amount).await?;
    if rows == 0 {
        return Err(LedgerError::InactiveWallet { wallet_id });
    }
    Ok(())
}

/// Adds `amount` to a wallet.
pub async fn credit<U: WalletRepository>(
    uow: &mut U,
    wallet_id: WalletId,
    purpose: WalletPurpose,
    amount: Money,
) -> Result<()> {
    let rows = uow.apply_balance_delta(wallet_id, purpose, amount).await?;
    if rows == 0 {
        return Err(LedgerError::InactiveWallet { wallet_id });
    }
    Ok(())
}
