//! Wallet ledger: the only code path that changes a wallet balance.
//!
//! - [`wallet_store`] resolves active wallets and applies conditional
//!   balance updates inside a unit of work.
//! - [`transfer`] moves money between two wallets as one ledger entry.
//! - [`WalletService`] covers activation, top-up, withdraw, balances and
//!   history.

pub mod error;
pub mod history;
pub mod service;
pub mod transfer;
pub mod wallet_store;

pub use error::{LedgerError, Result};
pub use history::{HISTORY_PAGE_SIZE, HistoryKind, HistoryPage, HistoryRequest};
pub use service::WalletService;
pub use transfer::{TransferEngine, transfer_within};
