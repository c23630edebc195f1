use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{
    AccountId, CartId, Money, OrderDetailId, OrderId, ProductId, PromotionId, ShopId,
    TransactionId, VariantId, WalletId,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::model::{
    CartItem, CartLine, HistoryEntry, NewOrder, NewOrderDetail, NewProduct, NewPromotion,
    NewTransaction, NewVariant, Order, OrderDetail, OrderStatus, Product, Promotion, Shop,
    Transaction, Variant, Wallet, WalletPurpose,
};
use crate::query::{HistoryQuery, OrderParty, OrderQuery};
use crate::repository::{
    CartRepository, CatalogRepository, MarketStore, OrderRepository, PromotionRepository,
    TransactionRepository, UnitOfWork, WalletRepository,
};
use crate::{Result, StoreError};

#[derive(Debug, Clone, Default)]
struct MarketState {
    sequence: i64,
    wallets: BTreeMap<WalletId, Wallet>,
    transactions: BTreeMap<TransactionId, Transaction>,
    orders: BTreeMap<OrderId, Order>,
    order_details: BTreeMap<OrderDetailId, OrderDetail>,
    shops: BTreeMap<ShopId, Shop>,
    products: BTreeMap<ProductId, Product>,
    variants: BTreeMap<VariantId, Variant>,
    carts: BTreeMap<CartId, CartItem>,
    promotions: BTreeMap<PromotionId, Promotion>,
}

impl MarketState {
    fn next_id(&mut self) -> i64 {
        self.sequence += 1;
        self.sequence
    }

    fn wallet_of(&self, account_id: AccountId, purpose: WalletPurpose) -> Option<&Wallet> {
        self.wallets
            .values()
            .find(|w| w.account_id == account_id && w.purpose == purpose)
    }

    fn history(&self, query: &HistoryQuery) -> Vec<HistoryEntry> {
        let wallet_id = query.wallet_id;
        let mut entries: Vec<_> = self
            .transactions
            .values()
            .filter(|t| t.to_wallet_id == wallet_id || t.from_wallet_id == Some(wallet_id))
            .filter(|t| query.accepts(t.title, t.created_at))
            .map(|t| HistoryEntry {
                transaction_id: t.id,
                title: t.title,
                amount: t.amount,
                incoming: t.to_wallet_id == wallet_id,
                order_id: self
                    .orders
                    .values()
                    .find(|o| o.transaction_id == t.id)
                    .map(|o| o.id),
                created_at: t.created_at,
            })
            .collect();

        entries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.transaction_id.cmp(&a.transaction_id))
        });
        entries
    }

    fn matching_orders(&self, query: &OrderQuery) -> Vec<Order> {
        let mut orders: Vec<_> = self
            .orders
            .values()
            .filter(|o| match query.party {
                OrderParty::Buyer(id) => o.buyer_id == id,
                OrderParty::Seller(id) => o.seller_id == id,
            })
            .filter(|o| query.status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        orders
    }
}

fn page<T>(rows: Vec<T>, limit: Option<usize>, offset: Option<usize>) -> Vec<T> {
    let rows = rows.into_iter().skip(offset.unwrap_or(0));
    match limit {
        Some(limit) => rows.take(limit).collect(),
        None => rows.collect(),
    }
}

/// In-memory store for tests and local runs.
///
/// Units of work are serialized behind a single lock and operate on a
/// private copy of the state, which replaces the shared state on commit.
/// This gives every unit full isolation and all-or-nothing visibility.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MarketState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a shop owned by `account_id`.
    pub async fn add_shop(&self, account_id: AccountId, name: impl Into<String>) -> Shop {
        let mut state = self.state.lock().await;
        let shop = Shop {
            id: ShopId::new(state.next_id()),
            account_id,
            name: name.into(),
        };
        state.shops.insert(shop.id, shop.clone());
        shop
    }

    pub async fn add_product(&self, product: NewProduct) -> Product {
        let mut state = self.state.lock().await;
        let product = Product {
            id: ProductId::new(state.next_id()),
            shop_id: product.shop_id,
            code: product.code,
            name: product.name,
            thumbnail_url: product.thumbnail_url,
            weight: product.weight,
        };
        state.products.insert(product.id, product.clone());
        product
    }

    pub async fn add_variant(&self, variant: NewVariant) -> Variant {
        let mut state = self.state.lock().await;
        let variant = Variant {
            id: VariantId::new(state.next_id()),
            product_id: variant.product_id,
            first_type: variant.first_type,
            second_type: variant.second_type,
            price: variant.price,
            discount_percent: variant.discount_percent,
            stock: variant.stock,
        };
        state.variants.insert(variant.id, variant.clone());
        variant
    }

    pub async fn add_cart_item(
        &self,
        account_id: AccountId,
        variant_id: VariantId,
        quantity: u32,
        is_checked: bool,
    ) -> CartItem {
        let mut state = self.state.lock().await;
        let item = CartItem {
            id: CartId::new(state.next_id()),
            account_id,
            variant_id,
            quantity,
            is_checked,
        };
        state.carts.insert(item.id, item.clone());
        item
    }

    pub async fn add_promotion(&self, promotion: NewPromotion) -> Promotion {
        let mut state = self.state.lock().await;
        let promotion = Promotion {
            id: PromotionId::new(state.next_id()),
            shop_id: promotion.shop_id,
            name: promotion.name,
            percentage: promotion.percentage,
            exact_price: promotion.exact_price,
            minimum_spend: promotion.minimum_spend,
            quota: promotion.quota,
            started_at: promotion.started_at,
            expired_at: promotion.expired_at,
        };
        state.promotions.insert(promotion.id, promotion.clone());
        promotion
    }

    pub async fn variant(&self, id: VariantId) -> Option<Variant> {
        self.state.lock().await.variants.get(&id).cloned()
    }

    pub async fn promotion(&self, id: PromotionId) -> Option<Promotion> {
        self.state.lock().await.promotions.get(&id).cloned()
    }

    /// Cart rows of an account, checked or not.
    pub async fn cart_items(&self, account_id: AccountId) -> Vec<CartItem> {
        self.state
            .lock()
            .await
            .carts
            .values()
            .filter(|c| c.account_id == account_id)
            .cloned()
            .collect()
    }

    /// Every ledger entry, in insertion order.
    pub async fn transactions(&self) -> Vec<Transaction> {
        self.state
            .lock()
            .await
            .transactions
            .values()
            .cloned()
            .collect()
    }

    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }
}

/// A unit of work against [`InMemoryStore`].
pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<MarketState>,
    staged: MarketState,
}

#[async_trait]
impl MarketStore for InMemoryStore {
    type Uow = InMemoryUnitOfWork;

    async fn begin(&self) -> Result<Self::Uow> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(InMemoryUnitOfWork { guard, staged })
    }

    async fn wallet(
        &self,
        account_id: AccountId,
        purpose: WalletPurpose,
    ) -> Result<Option<Wallet>> {
        let state = self.state.lock().await;
        Ok(state.wallet_of(account_id, purpose).cloned())
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.lock().await.orders.get(&id).cloned())
    }

    async fn order_details(&self, order_id: OrderId) -> Result<Vec<OrderDetail>> {
        let state = self.state.lock().await;
        Ok(state
            .order_details
            .values()
            .filter(|d| d.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        let state = self.state.lock().await;
        Ok(page(state.matching_orders(query), query.limit, query.offset))
    }

    async fn count_orders(&self, query: &OrderQuery) -> Result<u64> {
        let state = self.state.lock().await;
        Ok(state.matching_orders(query).len() as u64)
    }

    async fn wallet_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryEntry>> {
        let state = self.state.lock().await;
        Ok(page(state.history(query), query.limit, query.offset))
    }

    async fn count_wallet_history(&self, query: &HistoryQuery) -> Result<u64> {
        let state = self.state.lock().await;
        Ok(state.history(query).len() as u64)
    }

    async fn total_balance(&self) -> Result<Money> {
        let state = self.state.lock().await;
        Ok(state.wallets.values().map(|w| w.balance).sum())
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn commit(self) -> Result<()> {
        let InMemoryUnitOfWork { mut guard, staged } = self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl WalletRepository for InMemoryUnitOfWork {
    async fn open_wallet(
        &mut self,
        account_id: AccountId,
        purpose: WalletPurpose,
    ) -> Result<Wallet> {
        if let Some(existing) = self.staged.wallet_of(account_id, purpose) {
            return Ok(existing.clone());
        }

        let now = Utc::now();
        let wallet = Wallet {
            id: WalletId::new(self.staged.next_id()),
            account_id,
            purpose,
            balance: Money::ZERO,
            is_active: false,
            created_at: now,
            updated_at: now,
        };
        self.staged.wallets.insert(wallet.id, wallet.clone());
        Ok(wallet)
    }

    async fn find_wallet(
        &mut self,
        account_id: AccountId,
        purpose: WalletPurpose,
    ) -> Result<Option<Wallet>> {
        Ok(self.staged.wallet_of(account_id, purpose).cloned())
    }

    async fn find_wallet_for_update(
        &mut self,
        account_id: AccountId,
        purpose: WalletPurpose,
    ) -> Result<Option<Wallet>> {
        // The whole unit already holds the store lock.
        self.find_wallet(account_id, purpose).await
    }

    async fn lock_wallet(&mut self, wallet_id: WalletId) -> Result<Option<Wallet>> {
        Ok(self.staged.wallets.get(&wallet_id).cloned())
    }

    async fn set_wallet_active(
        &mut self,
        account_id: AccountId,
        purpose: WalletPurpose,
        active: bool,
    ) -> Result<u64> {
        let wallet = self
            .staged
            .wallets
            .values_mut()
            .find(|w| w.account_id == account_id && w.purpose == purpose);

        match wallet {
            Some(wallet) => {
                wallet.is_active = active;
                wallet.updated_at = Utc::now();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn apply_balance_delta(
        &mut self,
        wallet_id: WalletId,
        purpose: WalletPurpose,
        delta: Money,
    ) -> Result<u64> {
        match self.staged.wallets.get_mut(&wallet_id) {
            Some(wallet) if wallet.purpose == purpose && wallet.is_active => {
                wallet.balance = wallet
                    .balance
                    .checked_add(delta)
                    .filter(Money::fits_storage)
                    .ok_or(StoreError::BalanceOutOfRange(wallet_id.as_i64()))?;
                wallet.updated_at = Utc::now();
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

#[async_trait]
impl TransactionRepository for InMemoryUnitOfWork {
    async fn insert_transaction(&mut self, transaction: NewTransaction) -> Result<Transaction> {
        let transaction = Transaction {
            id: TransactionId::new(self.staged.next_id()),
            title: transaction.title,
            amount: transaction.amount,
            from_wallet_id: transaction.from_wallet_id,
            to_wallet_id: transaction.to_wallet_id,
            created_at: Utc::now(),
        };
        self.staged
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    async fn find_transaction(&mut self, id: TransactionId) -> Result<Option<Transaction>> {
        Ok(self.staged.transactions.get(&id).cloned())
    }
}

#[async_trait]
impl OrderRepository for InMemoryUnitOfWork {
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(self.staged.next_id()),
            status: OrderStatus::New,
            buyer_id: order.buyer_id,
            seller_id: order.seller_id,
            shop_id: order.shop_id,
            courier_id: order.courier_id,
            delivery_cost: order.delivery_cost,
            transaction_id: order.transaction_id,
            promotion_id: order.promotion_id,
            promotion_name: order.promotion_name,
            promotion_amount: order.promotion_amount,
            estimated_arrival: None,
            created_at: now,
            updated_at: now,
        };
        self.staged.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn insert_order_detail(&mut self, detail: NewOrderDetail) -> Result<OrderDetail> {
        let detail = OrderDetail {
            id: OrderDetailId::new(self.staged.next_id()),
            order_id: detail.order_id,
            product_code: detail.product_code,
            product_name: detail.product_name,
            thumbnail_url: detail.thumbnail_url,
            variant_id: detail.variant_id,
            variant_name: detail.variant_name,
            quantity: detail.quantity,
            sub_total_price: detail.sub_total_price,
            created_at: Utc::now(),
        };
        self.staged.order_details.insert(detail.id, detail.clone());
        Ok(detail)
    }

    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.staged.orders.get(&id).cloned())
    }

    async fn find_order_details(&mut self, order_id: OrderId) -> Result<Vec<OrderDetail>> {
        Ok(self
            .staged
            .order_details
            .values()
            .filter(|d| d.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn update_order_status(
        &mut self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        estimated_arrival: Option<DateTime<Utc>>,
    ) -> Result<u64> {
        match self.staged.orders.get_mut(&id) {
            Some(order) if order.status == from => {
                order.status = to;
                if estimated_arrival.is_some() {
                    order.estimated_arrival = estimated_arrival;
                }
                order.updated_at = Utc::now();
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

#[async_trait]
impl CartRepository for InMemoryUnitOfWork {
    async fn find_checked_lines(
        &mut self,
        buyer_id: AccountId,
        shop_id: ShopId,
    ) -> Result<Vec<CartLine>> {
        let state = &self.staged;
        let lines = state
            .carts
            .values()
            .filter(|c| c.account_id == buyer_id && c.is_checked)
            .filter_map(|cart| {
                let variant = state.variants.get(&cart.variant_id)?;
                let product = state.products.get(&variant.product_id)?;
                if product.shop_id != shop_id {
                    return None;
                }
                let shop = state.shops.get(&product.shop_id)?;
                Some(CartLine {
                    cart_id: cart.id,
                    shop_id: shop.id,
                    seller_id: shop.account_id,
                    product_id: product.id,
                    product_code: product.code.clone(),
                    product_name: product.name.clone(),
                    thumbnail_url: product.thumbnail_url.clone(),
                    variant_id: variant.id,
                    first_type: variant.first_type.clone(),
                    second_type: variant.second_type.clone(),
                    base_price: variant.price,
                    discount_percent: variant.discount_percent,
                    quantity: cart.quantity,
                })
            })
            .collect();
        Ok(lines)
    }

    async fn delete_cart_rows(&mut self, ids: &[CartId]) -> Result<u64> {
        let mut removed = 0;
        for id in ids {
            if self.staged.carts.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl CatalogRepository for InMemoryUnitOfWork {
    async fn variant_stock(&mut self, variant_id: VariantId) -> Result<Option<u32>> {
        Ok(self.staged.variants.get(&variant_id).map(|v| v.stock))
    }

    async fn decrement_stock(&mut self, variant_id: VariantId, quantity: u32) -> Result<u64> {
        match self.staged.variants.get_mut(&variant_id) {
            Some(variant) if variant.stock >= quantity => {
                variant.stock -= quantity;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn product_weight(&mut self, product_id: ProductId) -> Result<Option<u32>> {
        Ok(self.staged.products.get(&product_id).map(|p| p.weight))
    }

    async fn find_variant_by_types(
        &mut self,
        product_code: &str,
        first_type: &str,
        second_type: &str,
    ) -> Result<Option<VariantId>> {
        let state = &self.staged;
        Ok(state
            .variants
            .values()
            .find(|v| {
                v.first_type == first_type
                    && v.second_type == second_type
                    && state
                        .products
                        .get(&v.product_id)
                        .is_some_and(|p| p.code == product_code)
            })
            .map(|v| v.id))
    }
}

#[async_trait]
impl PromotionRepository for InMemoryUnitOfWork {
    async fn find_promotion(
        &mut self,
        shop_id: ShopId,
        promotion_id: PromotionId,
    ) -> Result<Option<Promotion>> {
        Ok(self
            .staged
            .promotions
            .get(&promotion_id)
            .filter(|p| p.shop_id == shop_id)
            .cloned())
    }

    async fn decrement_quota(&mut self, promotion_id: PromotionId) -> Result<u64> {
        match self.staged.promotions.get_mut(&promotion_id) {
            Some(promotion) if promotion.quota > 0 => {
                promotion.quota -= 1;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewOrder, TransactionTitle};
    use common::ShopCourierId;
    use rust_decimal::Decimal;

    async fn active_wallet(
        store: &InMemoryStore,
        account: i64,
        purpose: WalletPurpose,
        balance: Money,
    ) -> Wallet {
        let mut uow = store.begin().await.unwrap();
        let wallet = uow
            .open_wallet(AccountId::new(account), purpose)
            .await
            .unwrap();
        uow.set_wallet_active(AccountId::new(account), purpose, true)
            .await
            .unwrap();
        uow.apply_balance_delta(wallet.id, purpose, balance)
            .await
            .unwrap();
        uow.commit().await.unwrap();
        store
            .wallet(AccountId::new(account), purpose)
            .await
            .unwrap()
            .unwrap()
    }

    fn new_order(transaction_id: TransactionId) -> NewOrder {
        NewOrder {
            buyer_id: AccountId::new(1),
            seller_id: AccountId::new(2),
            shop_id: ShopId::new(3),
            courier_id: ShopCourierId::new(4),
            delivery_cost: Money::from_major(10_000),
            transaction_id,
            promotion_id: None,
            promotion_name: None,
            promotion_amount: None,
        }
    }

    #[tokio::test]
    async fn commit_publishes_staged_changes() {
        let store = InMemoryStore::new();
        let wallet = active_wallet(&store, 1, WalletPurpose::Personal, Money::from_major(500)).await;

        assert!(wallet.is_active);
        assert_eq!(wallet.balance, Money::from_major(500));
    }

    #[tokio::test]
    async fn balance_outside_storage_range_is_refused() {
        let store = InMemoryStore::new();
        let wallet = active_wallet(
            &store,
            1,
            WalletPurpose::Personal,
            Money::from_major(9_999_999_999_999),
        )
        .await;

        let mut uow = store.begin().await.unwrap();
        let result = uow
            .apply_balance_delta(wallet.id, WalletPurpose::Personal, Money::from_major(1))
            .await;
        assert!(matches!(result, Err(StoreError::BalanceOutOfRange(id)) if id == wallet.id.as_i64()));

        let result = uow
            .apply_balance_delta(wallet.id, WalletPurpose::Personal, Money::new(Decimal::MAX))
            .await;
        assert!(matches!(result, Err(StoreError::BalanceOutOfRange(_))));
    }

    #[tokio::test]
    async fn rollback_discards_staged_changes() {
        let store = InMemoryStore::new();
        let wallet = active_wallet(&store, 1, WalletPurpose::Personal, Money::from_major(500)).await;

        let mut uow = store.begin().await.unwrap();
        uow.apply_balance_delta(wallet.id, WalletPurpose::Personal, Money::from_major(-200))
            .await
            .unwrap();
        uow.rollback().await.unwrap();

        let after = store
            .wallet(AccountId::new(1), WalletPurpose::Personal)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.balance, Money::from_major(500));
    }

    #[tokio::test]
    async fn dropped_unit_discards_staged_changes() {
        let store = InMemoryStore::new();
        {
            let mut uow = store.begin().await.unwrap();
            uow.open_wallet(AccountId::new(1), WalletPurpose::Personal)
                .await
                .unwrap();
        }

        assert!(
            store
                .wallet(AccountId::new(1), WalletPurpose::Personal)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn open_wallet_is_idempotent() {
        let store = InMemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let first = uow
            .open_wallet(AccountId::new(1), WalletPurpose::Shop)
            .await
            .unwrap();
        let second = uow
            .open_wallet(AccountId::new(1), WalletPurpose::Shop)
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert!(!first.is_active);
    }

    #[tokio::test]
    async fn balance_delta_requires_active_wallet_with_matching_purpose() {
        let store = InMemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let wallet = uow
            .open_wallet(AccountId::new(1), WalletPurpose::Escrow)
            .await
            .unwrap();

        let inactive = uow
            .apply_balance_delta(wallet.id, WalletPurpose::Escrow, Money::from_major(1))
            .await
            .unwrap();
        assert_eq!(inactive, 0);

        uow.set_wallet_active(AccountId::new(1), WalletPurpose::Escrow, true)
            .await
            .unwrap();
        let mismatched = uow
            .apply_balance_delta(wallet.id, WalletPurpose::Personal, Money::from_major(1))
            .await
            .unwrap();
        assert_eq!(mismatched, 0);

        let applied = uow
            .apply_balance_delta(wallet.id, WalletPurpose::Escrow, Money::from_major(1))
            .await
            .unwrap();
        assert_eq!(applied, 1);
    }

    #[tokio::test]
    async fn status_update_is_conditional_on_current_status() {
        let store = InMemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let order = uow
            .insert_order(new_order(TransactionId::new(99)))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::New);

        let wrong = uow
            .update_order_status(order.id, OrderStatus::Process, OrderStatus::Deliver, None)
            .await
            .unwrap();
        assert_eq!(wrong, 0);

        let moved = uow
            .update_order_status(order.id, OrderStatus::New, OrderStatus::Process, None)
            .await
            .unwrap();
        assert_eq!(moved, 1);
        uow.commit().await.unwrap();

        let stored = store.order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Process);
    }

    #[tokio::test]
    async fn checked_lines_join_catalog_and_filter_by_shop() {
        let store = InMemoryStore::new();
        let buyer = AccountId::new(100);
        let shop = store.add_shop(AccountId::new(200), "Oren Shop").await;
        let other_shop = store.add_shop(AccountId::new(300), "Other").await;

        let product = store
            .add_product(NewProduct {
                shop_id: shop.id,
                code: "P-1".into(),
                name: "Kettle".into(),
                thumbnail_url: "kettle.png".into(),
                weight: 500,
            })
            .await;
        let other_product = store
            .add_product(NewProduct {
                shop_id: other_shop.id,
                code: "P-2".into(),
                name: "Mug".into(),
                thumbnail_url: "mug.png".into(),
                weight: 200,
            })
            .await;
        let variant = store
            .add_variant(NewVariant {
                product_id: product.id,
                first_type: "red".into(),
                second_type: "default".into(),
                price: Money::from_major(20_000),
                discount_percent: Decimal::ZERO,
                stock: 5,
            })
            .await;
        let other_variant = store
            .add_variant(NewVariant {
                product_id: other_product.id,
                first_type: "default".into(),
                second_type: "default".into(),
                price: Money::from_major(5_000),
                discount_percent: Decimal::ZERO,
                stock: 5,
            })
            .await;

        store.add_cart_item(buyer, variant.id, 2, true).await;
        store.add_cart_item(buyer, variant.id, 1, false).await;
        store.add_cart_item(buyer, other_variant.id, 1, true).await;

        let mut uow = store.begin().await.unwrap();
        let lines = uow.find_checked_lines(buyer, shop.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].seller_id, AccountId::new(200));
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].first_type, "red");
    }

    #[tokio::test]
    async fn stock_decrement_never_goes_negative() {
        let store = InMemoryStore::new();
        let variant = store
            .add_variant(NewVariant {
                product_id: ProductId::new(1),
                first_type: "default".into(),
                second_type: "default".into(),
                price: Money::from_major(1),
                discount_percent: Decimal::ZERO,
                stock: 3,
            })
            .await;

        let mut uow = store.begin().await.unwrap();
        assert_eq!(uow.decrement_stock(variant.id, 2).await.unwrap(), 1);
        assert_eq!(uow.decrement_stock(variant.id, 2).await.unwrap(), 0);
        assert_eq!(uow.variant_stock(variant.id).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn quota_decrement_stops_at_zero() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let promotion = store
            .add_promotion(NewPromotion {
                shop_id: ShopId::new(1),
                name: "Launch".into(),
                percentage: Some(Decimal::from(10)),
                exact_price: None,
                minimum_spend: Money::ZERO,
                quota: 1,
                started_at: now,
                expired_at: now + chrono::Duration::days(1),
            })
            .await;

        let mut uow = store.begin().await.unwrap();
        assert_eq!(uow.decrement_quota(promotion.id).await.unwrap(), 1);
        assert_eq!(uow.decrement_quota(promotion.id).await.unwrap(), 0);
        assert_eq!(uow.decrement_quota(PromotionId::new(999)).await.unwrap(), 0);
        uow.commit().await.unwrap();

        assert_eq!(store.promotion(promotion.id).await.unwrap().quota, 0);
    }

    #[tokio::test]
    async fn history_lists_entries_for_wallet_newest_first() {
        let store = InMemoryStore::new();
        let personal =
            active_wallet(&store, 1, WalletPurpose::Personal, Money::from_major(0)).await;
        let escrow = active_wallet(&store, 1, WalletPurpose::Escrow, Money::from_major(0)).await;

        let mut uow = store.begin().await.unwrap();
        let top_up = uow
            .insert_transaction(NewTransaction {
                title: TransactionTitle::TopUp,
                amount: Money::from_major(100),
                from_wallet_id: None,
                to_wallet_id: personal.id,
            })
            .await
            .unwrap();
        let payment = uow
            .insert_transaction(NewTransaction {
                title: TransactionTitle::PaymentOrder,
                amount: Money::from_major(40),
                from_wallet_id: Some(personal.id),
                to_wallet_id: escrow.id,
            })
            .await
            .unwrap();
        let order = uow.insert_order(new_order(payment.id)).await.unwrap();
        uow.commit().await.unwrap();

        let query = HistoryQuery::for_wallet(personal.id);
        let history = store.wallet_history(&query).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].transaction_id, payment.id);
        assert!(!history[0].incoming);
        assert_eq!(history[0].order_id, Some(order.id));
        assert_eq!(history[1].transaction_id, top_up.id);
        assert!(history[1].incoming);
        assert_eq!(store.count_wallet_history(&query).await.unwrap(), 2);

        let topups_only = query.titles(vec![TransactionTitle::TopUp]);
        assert_eq!(store.wallet_history(&topups_only).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn total_balance_sums_every_wallet() {
        let store = InMemoryStore::new();
        active_wallet(&store, 1, WalletPurpose::Personal, Money::from_major(70)).await;
        active_wallet(&store, 2, WalletPurpose::Shop, Money::from_major(30)).await;

        assert_eq!(store.total_balance().await.unwrap(), Money::from_major(100));
    }
}
