//! Repository traits and the unit-of-work transaction context.
//!
//! Every write goes through a [`UnitOfWork`] opened with [`MarketStore::begin`].
//! Functions that must take part in the same atomic unit receive `&mut U`
//! and never commit; only the outermost caller commits or rolls back.
//! Dropping an uncommitted unit discards its changes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{
    AccountId, CartId, Money, OrderId, ProductId, PromotionId, ShopId, TransactionId, VariantId,
    WalletId,
};

use crate::Result;
use crate::model::{
    CartLine, HistoryEntry, NewOrder, NewOrderDetail, NewTransaction, Order, OrderDetail,
    OrderStatus, Promotion, Transaction, Wallet, WalletPurpose,
};
use crate::query::{HistoryQuery, OrderQuery};

/// Wallet rows. Balance changes are only reachable through a unit of work.
#[async_trait]
pub trait WalletRepository: Send {
    /// Creates an inactive zero-balance wallet, or returns the existing one.
    async fn open_wallet(&mut self, account_id: AccountId, purpose: WalletPurpose)
    -> Result<Wallet>;

    /// Reads an account's wallet regardless of its activation state.
    async fn find_wallet(
        &mut self,
        account_id: AccountId,
        purpose: WalletPurpose,
    ) -> Result<Option<Wallet>>;

    /// Reads an account's wallet and holds its row lock until the unit ends.
    async fn find_wallet_for_update(
        &mut self,
        account_id: AccountId,
        purpose: WalletPurpose,
    ) -> Result<Option<Wallet>>;

    /// Locks a wallet by id and returns its current state.
    async fn lock_wallet(&mut self, wallet_id: WalletId) -> Result<Option<Wallet>>;

    /// Flips the activation flag. Returns the number of rows changed.
    async fn set_wallet_active(
        &mut self,
        account_id: AccountId,
        purpose: WalletPurpose,
        active: bool,
    ) -> Result<u64>;

    /// Adds `delta` to the balance of an active wallet with the given purpose.
    ///
    /// Returns the number of rows changed; zero means the wallet is inactive
    /// or does not have that purpose.
    async fn apply_balance_delta(
        &mut self,
        wallet_id: WalletId,
        purpose: WalletPurpose,
        delta: Money,
    ) -> Result<u64>;
}

/// Append-only ledger entries.
#[async_trait]
pub trait TransactionRepository: Send {
    async fn insert_transaction(&mut self, transaction: NewTransaction) -> Result<Transaction>;

    async fn find_transaction(&mut self, id: TransactionId) -> Result<Option<Transaction>>;
}

#[async_trait]
pub trait OrderRepository: Send {
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order>;

    async fn insert_order_detail(&mut self, detail: NewOrderDetail) -> Result<OrderDetail>;

    /// Reads an order and holds its row lock until the unit ends.
    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>>;

    async fn find_order_details(&mut self, order_id: OrderId) -> Result<Vec<OrderDetail>>;

    /// Moves an order from `from` to `to`.
    ///
    /// Returns the number of rows changed; zero means the order was not in
    /// `from`.
    async fn update_order_status(
        &mut self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        estimated_arrival: Option<DateTime<Utc>>,
    ) -> Result<u64>;
}

#[async_trait]
pub trait CartRepository: Send {
    /// Checked cart rows of `buyer_id` for products sold by `shop_id`.
    async fn find_checked_lines(
        &mut self,
        buyer_id: AccountId,
        shop_id: ShopId,
    ) -> Result<Vec<CartLine>>;

    async fn delete_cart_rows(&mut self, ids: &[CartId]) -> Result<u64>;
}

#[async_trait]
pub trait CatalogRepository: Send {
    async fn variant_stock(&mut self, variant_id: VariantId) -> Result<Option<u32>>;

    /// Removes `quantity` units from stock. Returns zero rows changed when
    /// the variant is missing or holds fewer units.
    async fn decrement_stock(&mut self, variant_id: VariantId, quantity: u32) -> Result<u64>;

    async fn product_weight(&mut self, product_id: ProductId) -> Result<Option<u32>>;

    /// Resolves a variant from its product code and two type names.
    async fn find_variant_by_types(
        &mut self,
        product_code: &str,
        first_type: &str,
        second_type: &str,
    ) -> Result<Option<VariantId>>;
}

#[async_trait]
pub trait PromotionRepository: Send {
    async fn find_promotion(
        &mut self,
        shop_id: ShopId,
        promotion_id: PromotionId,
    ) -> Result<Option<Promotion>>;

    /// Consumes one redemption. Returns zero rows changed when the
    /// promotion does not exist or has no quota left.
    async fn decrement_quota(&mut self, promotion_id: PromotionId) -> Result<u64>;
}

/// One all-or-nothing transaction context spanning every repository.
#[async_trait]
pub trait UnitOfWork:
    WalletRepository
    + TransactionRepository
    + OrderRepository
    + CartRepository
    + CatalogRepository
    + PromotionRepository
    + Send
    + Sized
{
    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}

/// Entry point to the relational store.
///
/// Read methods run outside any unit of work and must not be called while
/// the same task holds an open unit.
#[async_trait]
pub trait MarketStore: Send + Sync {
    type Uow: UnitOfWork;

    /// Opens a new unit of work.
    async fn begin(&self) -> Result<Self::Uow>;

    async fn wallet(&self, account_id: AccountId, purpose: WalletPurpose)
    -> Result<Option<Wallet>>;

    async fn order(&self, id: OrderId) -> Result<Option<Order>>;

    async fn order_details(&self, order_id: OrderId) -> Result<Vec<OrderDetail>>;

    /// Orders matching the query, newest first.
    async fn orders(&self, query: &OrderQuery) -> Result<Vec<Order>>;

    /// Number of orders matching the query, ignoring its page window.
    async fn count_orders(&self, query: &OrderQuery) -> Result<u64>;

    /// Entries touching the queried wallet, newest first.
    async fn wallet_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryEntry>>;

    /// Number of entries matching the query, ignoring its page window.
    async fn count_wallet_history(&self, query: &HistoryQuery) -> Result<u64>;

    /// Sum of every wallet balance in the system.
    async fn total_balance(&self) -> Result<Money>;
}
