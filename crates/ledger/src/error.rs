use common::{AccountId, Money, WalletId};
use store::{StoreError, WalletPurpose};
use thiserror::Error;

/// Errors raised while moving money between wallets.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The account has no active wallet with this purpose.
    #[error("Wallet not activated: {purpose} wallet of account {account_id}")]
    WalletNotActivated {
        account_id: AccountId,
        purpose: WalletPurpose,
    },

    /// A balance update touched no row: the wallet is inactive or its
    /// purpose does not match.
    #[error("Inactive wallet: {wallet_id}")]
    InactiveWallet { wallet_id: WalletId },

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Money, available: Money },

    #[error("Invalid amount: {0}")]
    InvalidAmount(Money),

    #[error("Cannot transfer from wallet {0} to itself")]
    SameWallet(WalletId),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
