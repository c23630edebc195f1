//! Wallet lifecycle and balance operations exposed to the HTTP layer.

use common::{AccountId, Money, TransactionId};
use store::{
    HistoryQuery, MarketStore, NewTransaction, Pagination, TransactionRepository,
    TransactionTitle, UnitOfWork, Wallet, WalletPurpose, WalletRepository,
};

use crate::history::{HISTORY_PAGE_SIZE, HistoryPage, HistoryRequest};
use crate::transfer::{check_amount, transfer_within};
use crate::wallet_store::{credit, find_active, find_active_for_update};
use crate::{LedgerError, Result};

/// Service for managing an account's wallets.
#[derive(Clone)]
pub struct WalletService<S> {
    store: S,
}

impl<S: MarketStore> WalletService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates the account's inactive PERSONAL, ESCROW and SHOP wallets.
    /// Existing wallets are returned unchanged.
    #[tracing::instrument(skip(self))]
    pub async fn open_wallets(&self, account_id: AccountId) -> Result<Vec<Wallet>> {
        let mut uow = self.store.begin().await?;
        let mut wallets = Vec::with_capacity(WalletPurpose::ALL.len());
        for purpose in WalletPurpose::ALL {
            wallets.push(uow.open_wallet(account_id, purpose).await?);
        }
        uow.commit().await?;
        Ok(wallets)
    }

    /// Activates the PERSONAL and ESCROW wallets together.
    #[tracing::instrument(skip(self))]
    pub async fn activate_personal(&self, account_id: AccountId) -> Result<()> {
        let mut uow = self.store.begin().await?;
        for purpose in [WalletPurpose::Personal, WalletPurpose::Escrow] {
            uow.open_wallet(account_id, purpose).await?;
            uow.set_wallet_active(account_id, purpose, true).await?;
        }
        uow.commit().await?;

        tracing::info!(%account_id, "personal wallet activated");
        Ok(())
    }

    /// Activates the SHOP wallet.
    #[tracing::instrument(skip(self))]
    pub async fn activate_shop(&self, account_id: AccountId) -> Result<()> {
        let mut uow = self.store.begin().await?;
        uow.open_wallet(account_id, WalletPurpose::Shop).await?;
        uow.set_wallet_active(account_id, WalletPurpose::Shop, true)
            .await?;
        uow.commit().await?;

        tracing::info!(%account_id, "shop wallet activated");
        Ok(())
    }

    /// Credits external funds to the PERSONAL wallet.
    #[tracing::instrument(skip(self))]
    pub async fn top_up(&self, account_id: AccountId, amount: Money) -> Result<TransactionId> {
        check_amount(amount)?;

        let mut uow = self.store.begin().await?;
        let wallet = find_active_for_update(&mut uow, account_id, WalletPurpose::Personal).await?;
        let transaction = uow
            .insert_transaction(NewTransaction {
                title: TransactionTitle::TopUp,
                amount,
                from_wallet_id: None,
                to_wallet_id: wallet.id,
            })
            .await?;
        credit(&mut uow, wallet.id, wallet.purpose, amount).await?;
        uow.commit().await?;

        metrics::counter!("ledger_transfers_total", "title" => TransactionTitle::TopUp.as_str())
            .increment(1);
        tracing::info!(%account_id, amount = %amount, "top up committed");
        Ok(transaction.id)
    }

    /// Moves shop proceeds into the same account's PERSONAL wallet.
    #[tracing::instrument(skip(self))]
    pub async fn withdraw(&self, account_id: AccountId, amount: Money) -> Result<TransactionId> {
        let mut uow = self.store.begin().await?;
        let shop = find_active(&mut uow, account_id, WalletPurpose::Shop).await?;
        let personal = find_active(&mut uow, account_id, WalletPurpose::Personal).await?;
        let transaction_id =
            transfer_within(&mut uow, shop.id, personal.id, amount, TransactionTitle::Withdraw)
                .await?;
        uow.commit().await?;

        tracing::info!(%account_id, amount = %amount, "withdraw committed");
        Ok(transaction_id)
    }

    pub async fn personal_balance(&self, account_id: AccountId) -> Result<Wallet> {
        self.active_wallet(account_id, WalletPurpose::Personal).await
    }

    pub async fn shop_balance(&self, account_id: AccountId) -> Result<Wallet> {
        self.active_wallet(account_id, WalletPurpose::Shop).await
    }

    /// One page of entries touching the PERSONAL wallet, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn history(
        &self,
        account_id: AccountId,
        request: HistoryRequest,
    ) -> Result<HistoryPage> {
        let wallet = self
            .active_wallet(account_id, WalletPurpose::Personal)
            .await?;
        let page = Pagination::new(request.page, HISTORY_PAGE_SIZE);

        let mut query = HistoryQuery::for_wallet(wallet.id);
        if let Some(from) = request.from {
            query = query.from_timestamp(from);
        }
        if let Some(to) = request.to {
            query = query.to_timestamp(to);
        }
        if let Some(titles) = request.kind.titles() {
            query = query.titles(titles);
        }

        let total = self.store.count_wallet_history(&query).await?;
        let entries = self.store.wallet_history(&query.page(page)).await?;

        Ok(HistoryPage {
            entries,
            page: page.page,
            total_pages: page.total_pages(total),
        })
    }

    async fn active_wallet(&self, account_id: AccountId, purpose: WalletPurpose) -> Result<Wallet> {
        match self.store.wallet(account_id, purpose).await? {
            Some(wallet) if wallet.is_active => Ok(wallet),
            _ => Err(LedgerError::WalletNotActivated {
                account_id,
                purpose,
            }),
        }
    }
}
