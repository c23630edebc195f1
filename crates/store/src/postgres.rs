use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{
    AccountId, CartId, Money, OrderDetailId, OrderId, ProductId, PromotionId, ShopCourierId,
    ShopId, TransactionId, VariantId, WalletId,
};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row, Transaction as PgTransaction};

use crate::model::{
    CartLine, HistoryEntry, NewOrder, NewOrderDetail, NewTransaction, Order, OrderDetail,
    OrderStatus, Promotion, Transaction, Wallet, WalletPurpose,
};
use crate::query::{HistoryQuery, OrderParty, OrderQuery};
use crate::repository::{
    CartRepository, CatalogRepository, MarketStore, OrderRepository, PromotionRepository,
    TransactionRepository, UnitOfWork, WalletRepository,
};
use crate::{Result, StoreError};

const WALLET_COLUMNS: &str = "id, account_id, purpose, balance, is_active, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, status, buyer_id, seller_id, shop_id, courier_id, delivery_cost, \
     transaction_id, promotion_id, promotion_name, promotion_amount, estimated_arrival, \
     created_at, updated_at";

const DETAIL_COLUMNS: &str = "id, order_id, product_code, product_name, thumbnail_url, \
     variant_id, variant_name, quantity, sub_total_price, created_at";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// A unit of work backed by one database transaction.
///
/// Dropping it without calling [`UnitOfWork::commit`] rolls the
/// transaction back.
pub struct PgUnitOfWork {
    tx: PgTransaction<'static, Postgres>,
}

fn to_u32(value: i32, column: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("negative {column}: {value}")))
}

fn row_to_wallet(row: &PgRow) -> Result<Wallet> {
    Ok(Wallet {
        id: WalletId::new(row.try_get("id")?),
        account_id: AccountId::new(row.try_get("account_id")?),
        purpose: row.try_get::<String, _>("purpose")?.parse()?,
        balance: Money::new(row.try_get("balance")?),
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_transaction(row: &PgRow) -> Result<Transaction> {
    Ok(Transaction {
        id: TransactionId::new(row.try_get("id")?),
        title: row.try_get::<String, _>("title")?.parse()?,
        amount: Money::new(row.try_get("amount")?),
        from_wallet_id: row
            .try_get::<Option<i64>, _>("from_wallet_id")?
            .map(WalletId::new),
        to_wallet_id: WalletId::new(row.try_get("to_wallet_id")?),
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_order(row: &PgRow) -> Result<Order> {
    Ok(Order {
        id: OrderId::new(row.try_get("id")?),
        status: row.try_get::<String, _>("status")?.parse()?,
        buyer_id: AccountId::new(row.try_get("buyer_id")?),
        seller_id: AccountId::new(row.try_get("seller_id")?),
        shop_id: ShopId::new(row.try_get("shop_id")?),
        courier_id: ShopCourierId::new(row.try_get("courier_id")?),
        delivery_cost: Money::new(row.try_get("delivery_cost")?),
        transaction_id: TransactionId::new(row.try_get("transaction_id")?),
        promotion_id: row
            .try_get::<Option<i64>, _>("promotion_id")?
            .map(PromotionId::new),
        promotion_name: row.try_get("promotion_name")?,
        promotion_amount: row
            .try_get::<Option<Decimal>, _>("promotion_amount")?
            .map(Money::new),
        estimated_arrival: row.try_get("estimated_arrival")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_detail(row: &PgRow) -> Result<OrderDetail> {
    Ok(OrderDetail {
        id: OrderDetailId::new(row.try_get("id")?),
        order_id: OrderId::new(row.try_get("order_id")?),
        product_code: row.try_get("product_code")?,
        product_name: row.try_get("product_name")?,
        thumbnail_url: row.try_get("thumbnail_url")?,
        variant_id: row
            .try_get::<Option<i64>, _>("variant_id")?
            .map(VariantId::new),
        variant_name: row.try_get("variant_name")?,
        quantity: to_u32(row.try_get("quantity")?, "quantity")?,
        sub_total_price: Money::new(row.try_get("sub_total_price")?),
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_history(row: &PgRow) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
        transaction_id: TransactionId::new(row.try_get("id")?),
        title: row.try_get::<String, _>("title")?.parse()?,
        amount: Money::new(row.try_get("amount")?),
        incoming: row.try_get("incoming")?,
        order_id: row.try_get::<Option<i64>, _>("order_id")?.map(OrderId::new),
        created_at: row.try_get("created_at")?,
    })
}

/// Appends the history filters to `sql`, numbering parameters from `$2`.
fn history_filters(query: &HistoryQuery, sql: &mut String) -> usize {
    let mut param_count = 1;
    if query.from_timestamp.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND t.created_at >= ${param_count}"));
    }
    if query.to_timestamp.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND t.created_at <= ${param_count}"));
    }
    if query.titles.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND t.title = ANY(${param_count})"));
    }
    param_count
}

fn bind_history<'q>(
    mut sqlx_query: Query<'q, Postgres, PgArguments>,
    query: &HistoryQuery,
) -> Query<'q, Postgres, PgArguments> {
    sqlx_query = sqlx_query.bind(query.wallet_id.as_i64());
    if let Some(from) = query.from_timestamp {
        sqlx_query = sqlx_query.bind(from);
    }
    if let Some(to) = query.to_timestamp {
        sqlx_query = sqlx_query.bind(to);
    }
    if let Some(ref titles) = query.titles {
        let titles: Vec<String> = titles.iter().map(|t| t.as_str().to_string()).collect();
        sqlx_query = sqlx_query.bind(titles);
    }
    sqlx_query
}

/// Appends the order filters to `sql`, numbering parameters from `$2`.
fn order_filters(query: &OrderQuery, sql: &mut String) -> usize {
    let column = match query.party {
        OrderParty::Buyer(_) => "buyer_id",
        OrderParty::Seller(_) => "seller_id",
    };
    sql.push_str(&format!(" WHERE {column} = $1"));

    let mut param_count = 1;
    if query.status.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND status = ${param_count}"));
    }
    param_count
}

fn bind_orders<'q>(
    mut sqlx_query: Query<'q, Postgres, PgArguments>,
    query: &OrderQuery,
) -> Query<'q, Postgres, PgArguments> {
    let party = match query.party {
        OrderParty::Buyer(id) | OrderParty::Seller(id) => id,
    };
    sqlx_query = sqlx_query.bind(party.as_i64());
    if let Some(status) = query.status {
        sqlx_query = sqlx_query.bind(status.as_str());
    }
    sqlx_query
}

fn push_page(sql: &mut String, mut param_count: usize, limit: Option<usize>, offset: Option<usize>) {
    if limit.is_some() {
        param_count += 1;
        sql.push_str(&format!(" LIMIT ${param_count}"));
    }
    if offset.is_some() {
        param_count += 1;
        sql.push_str(&format!(" OFFSET ${param_count}"));
    }
}

fn bind_page<'q>(
    mut sqlx_query: Query<'q, Postgres, PgArguments>,
    limit: Option<usize>,
    offset: Option<usize>,
) -> Query<'q, Postgres, PgArguments> {
    if let Some(limit) = limit {
        sqlx_query = sqlx_query.bind(limit as i64);
    }
    if let Some(offset) = offset {
        sqlx_query = sqlx_query.bind(offset as i64);
    }
    sqlx_query
}

#[async_trait]
impl MarketStore for PostgresStore {
    type Uow = PgUnitOfWork;

    #[tracing::instrument(skip(self))]
    async fn begin(&self) -> Result<Self::Uow> {
        let tx = self.pool.begin().await?;
        Ok(PgUnitOfWork { tx })
    }

    async fn wallet(
        &self,
        account_id: AccountId,
        purpose: WalletPurpose,
    ) -> Result<Option<Wallet>> {
        let row = sqlx::query(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets WHERE account_id = $1 AND purpose = $2"
        ))
        .bind(account_id.as_i64())
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_wallet).transpose()
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_order).transpose()
    }

    async fn order_details(&self, order_id: OrderId) -> Result<Vec<OrderDetail>> {
        let rows = sqlx::query(&format!(
            "SELECT {DETAIL_COLUMNS} FROM order_details WHERE order_id = $1 ORDER BY id ASC"
        ))
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_detail).collect()
    }

    async fn orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        let mut sql = format!("SELECT {ORDER_COLUMNS} FROM orders");
        let param_count = order_filters(query, &mut sql);
        sql.push_str(" ORDER BY created_at DESC, id DESC");
        push_page(&mut sql, param_count, query.limit, query.offset);

        let sqlx_query = bind_orders(sqlx::query(&sql), query);
        let rows = bind_page(sqlx_query, query.limit, query.offset)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_order).collect()
    }

    async fn count_orders(&self, query: &OrderQuery) -> Result<u64> {
        let mut sql = String::from("SELECT COUNT(*) AS total FROM orders");
        order_filters(query, &mut sql);

        let row = bind_orders(sqlx::query(&sql), query)
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = row.try_get("total")?;
        Ok(total as u64)
    }

    async fn wallet_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryEntry>> {
        let mut sql = String::from(
            r#"
            SELECT t.id, t.title, t.amount, t.created_at,
                   t.to_wallet_id = $1 AS incoming,
                   (SELECT o.id FROM orders o WHERE o.transaction_id = t.id ORDER BY o.id LIMIT 1) AS order_id
            FROM transactions t
            WHERE (t.from_wallet_id = $1 OR t.to_wallet_id = $1)
            "#,
        );
        let param_count = history_filters(query, &mut sql);
        sql.push_str(" ORDER BY t.created_at DESC, t.id DESC");
        push_page(&mut sql, param_count, query.limit, query.offset);

        let sqlx_query = bind_history(sqlx::query(&sql), query);
        let rows = bind_page(sqlx_query, query.limit, query.offset)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_history).collect()
    }

    async fn count_wallet_history(&self, query: &HistoryQuery) -> Result<u64> {
        let mut sql = String::from(
            "SELECT COUNT(*) AS total FROM transactions t \
             WHERE (t.from_wallet_id = $1 OR t.to_wallet_id = $1)",
        );
        history_filters(query, &mut sql);

        let row = bind_history(sqlx::query(&sql), query)
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = row.try_get("total")?;
        Ok(total as u64)
    }

    async fn total_balance(&self) -> Result<Money> {
        let total: Decimal = sqlx::query_scalar("SELECT COALESCE(SUM(balance), 0) FROM wallets")
            .fetch_one(&self.pool)
            .await?;
        Ok(Money::new(total))
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl WalletRepository for PgUnitOfWork {
    async fn open_wallet(
        &mut self,
        account_id: AccountId,
        purpose: WalletPurpose,
    ) -> Result<Wallet> {
        sqlx::query(
            r#"
            INSERT INTO wallets (account_id, purpose)
            VALUES ($1, $2)
            ON CONFLICT (account_id, purpose) DO NOTHING
            "#,
        )
        .bind(account_id.as_i64())
        .bind(purpose.as_str())
        .execute(&mut *self.tx)
        .await?;

        self.find_wallet(account_id, purpose)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "wallet",
                id: account_id.as_i64(),
            })
    }

    async fn find_wallet(
        &mut self,
        account_id: AccountId,
        purpose: WalletPurpose,
    ) -> Result<Option<Wallet>> {
        let row = sqlx::query(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets WHERE account_id = $1 AND purpose = $2"
        ))
        .bind(account_id.as_i64())
        .bind(purpose.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(row_to_wallet).transpose()
    }

    async fn find_wallet_for_update(
        &mut self,
        account_id: AccountId,
        purpose: WalletPurpose,
    ) -> Result<Option<Wallet>> {
        let row = sqlx::query(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets WHERE account_id = $1 AND purpose = $2 FOR UPDATE"
        ))
        .bind(account_id.as_i64())
        .bind(purpose.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(row_to_wallet).transpose()
    }

    async fn lock_wallet(&mut self, wallet_id: WalletId) -> Result<Option<Wallet>> {
        let row = sqlx::query(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallets WHERE id = $1 FOR UPDATE"
        ))
        .bind(wallet_id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(row_to_wallet).transpose()
    }

    async fn set_wallet_active(
        &mut self,
        account_id: AccountId,
        purpose: WalletPurpose,
        active: bool,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE wallets SET is_active = $3, updated_at = NOW()
            WHERE account_id = $1 AND purpose = $2
            "#,
        )
        .bind(account_id.as_i64())
        .bind(purpose.as_str())
        .bind(active)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn apply_balance_delta(
        &mut self,
        wallet_id: WalletId,
        purpose: WalletPurpose,
        delta: Money,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE wallets SET balance = balance + $3, updated_at = NOW()
            WHERE id = $1 AND purpose = $2 AND is_active
            "#,
        )
        .bind(wallet_id.as_i64())
        .bind(purpose.as_str())
        .bind(delta.amount())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| match &e {
            // numeric_value_out_of_range
            sqlx::Error::Database(db) if db.code().as_deref() == Some("22003") => {
                StoreError::BalanceOutOfRange(wallet_id.as_i64())
            }
            _ => StoreError::from(e),
        })?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TransactionRepository for PgUnitOfWork {
    async fn insert_transaction(&mut self, transaction: NewTransaction) -> Result<Transaction> {
        let row = sqlx::query(
            r#"
            INSERT INTO transactions (title, amount, from_wallet_id, to_wallet_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, amount, from_wallet_id, to_wallet_id, created_at
            "#,
        )
        .bind(transaction.title.as_str())
        .bind(transaction.amount.amount())
        .bind(transaction.from_wallet_id.map(|id| id.as_i64()))
        .bind(transaction.to_wallet_id.as_i64())
        .fetch_one(&mut *self.tx)
        .await?;

        row_to_transaction(&row)
    }

    async fn find_transaction(&mut self, id: TransactionId) -> Result<Option<Transaction>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, amount, from_wallet_id, to_wallet_id, created_at
            FROM transactions WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(row_to_transaction).transpose()
    }
}

#[async_trait]
impl OrderRepository for PgUnitOfWork {
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO orders (buyer_id, seller_id, shop_id, courier_id, delivery_cost,
                                transaction_id, promotion_id, promotion_name, promotion_amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order.buyer_id.as_i64())
        .bind(order.seller_id.as_i64())
        .bind(order.shop_id.as_i64())
        .bind(order.courier_id.as_i64())
        .bind(order.delivery_cost.amount())
        .bind(order.transaction_id.as_i64())
        .bind(order.promotion_id.map(|id| id.as_i64()))
        .bind(order.promotion_name)
        .bind(order.promotion_amount.map(|m| m.amount()))
        .fetch_one(&mut *self.tx)
        .await?;

        row_to_order(&row)
    }

    async fn insert_order_detail(&mut self, detail: NewOrderDetail) -> Result<OrderDetail> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO order_details (order_id, product_code, product_name, thumbnail_url,
                                       variant_id, variant_name, quantity, sub_total_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {DETAIL_COLUMNS}
            "#
        ))
        .bind(detail.order_id.as_i64())
        .bind(detail.product_code)
        .bind(detail.product_name)
        .bind(detail.thumbnail_url)
        .bind(detail.variant_id.map(|id| id.as_i64()))
        .bind(detail.variant_name)
        .bind(i64::from(detail.quantity))
        .bind(detail.sub_total_price.amount())
        .fetch_one(&mut *self.tx)
        .await?;

        row_to_detail(&row)
    }

    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(row_to_order).transpose()
    }

    async fn find_order_details(&mut self, order_id: OrderId) -> Result<Vec<OrderDetail>> {
        let rows = sqlx::query(&format!(
            "SELECT {DETAIL_COLUMNS} FROM order_details WHERE order_id = $1 ORDER BY id ASC"
        ))
        .bind(order_id.as_i64())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter().map(row_to_detail).collect()
    }

    async fn update_order_status(
        &mut self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        estimated_arrival: Option<DateTime<Utc>>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $3,
                estimated_arrival = COALESCE($4, estimated_arrival),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id.as_i64())
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(estimated_arrival)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CartRepository for PgUnitOfWork {
    async fn find_checked_lines(
        &mut self,
        buyer_id: AccountId,
        shop_id: ShopId,
    ) -> Result<Vec<CartLine>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id AS cart_id, s.id AS shop_id, s.account_id AS seller_id,
                   p.id AS product_id, p.code, p.name, p.thumbnail_url,
                   v.id AS variant_id, v.first_type, v.second_type, v.price,
                   v.discount_percent, c.quantity
            FROM carts c
            JOIN product_variants v ON v.id = c.variant_id
            JOIN products p ON p.id = v.product_id
            JOIN shops s ON s.id = p.shop_id
            WHERE c.account_id = $1 AND c.is_checked AND s.id = $2
            ORDER BY c.id ASC
            "#,
        )
        .bind(buyer_id.as_i64())
        .bind(shop_id.as_i64())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter()
            .map(|row| -> Result<CartLine> {
                Ok(CartLine {
                    cart_id: CartId::new(row.try_get("cart_id")?),
                    shop_id: ShopId::new(row.try_get("shop_id")?),
                    seller_id: AccountId::new(row.try_get("seller_id")?),
                    product_id: ProductId::new(row.try_get("product_id")?),
                    product_code: row.try_get("code")?,
                    product_name: row.try_get("name")?,
                    thumbnail_url: row.try_get("thumbnail_url")?,
                    variant_id: VariantId::new(row.try_get("variant_id")?),
                    first_type: row.try_get("first_type")?,
                    second_type: row.try_get("second_type")?,
                    base_price: Money::new(row.try_get("price")?),
                    discount_percent: row.try_get("discount_percent")?,
                    quantity: to_u32(row.try_get("quantity")?, "quantity")?,
                })
            })
            .collect()
    }

    async fn delete_cart_rows(&mut self, ids: &[CartId]) -> Result<u64> {
        let ids: Vec<i64> = ids.iter().map(|id| id.as_i64()).collect();
        let result = sqlx::query("DELETE FROM carts WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CatalogRepository for PgUnitOfWork {
    async fn variant_stock(&mut self, variant_id: VariantId) -> Result<Option<u32>> {
        let stock: Option<i32> =
            sqlx::query_scalar("SELECT stock FROM product_variants WHERE id = $1")
                .bind(variant_id.as_i64())
                .fetch_optional(&mut *self.tx)
                .await?;

        stock.map(|s| to_u32(s, "stock")).transpose()
    }

    async fn decrement_stock(&mut self, variant_id: VariantId, quantity: u32) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE product_variants SET stock = stock - $2 WHERE id = $1 AND stock >= $2",
        )
        .bind(variant_id.as_i64())
        .bind(i64::from(quantity))
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn product_weight(&mut self, product_id: ProductId) -> Result<Option<u32>> {
        let weight: Option<i32> = sqlx::query_scalar("SELECT weight FROM products WHERE id = $1")
            .bind(product_id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;

        weight.map(|w| to_u32(w, "weight")).transpose()
    }

    async fn find_variant_by_types(
        &mut self,
        product_code: &str,
        first_type: &str,
        second_type: &str,
    ) -> Result<Option<VariantId>> {
        let id: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT v.id FROM product_variants v
            JOIN products p ON p.id = v.product_id
            WHERE p.code = $1 AND v.first_type = $2 AND v.second_type = $3
            ORDER BY v.id ASC
            LIMIT 1
            "#,
        )
        .bind(product_code)
        .bind(first_type)
        .bind(second_type)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(id.map(VariantId::new))
    }
}

#[async_trait]
impl PromotionRepository for PgUnitOfWork {
    async fn find_promotion(
        &mut self,
        shop_id: ShopId,
        promotion_id: PromotionId,
    ) -> Result<Option<Promotion>> {
        let row = sqlx::query(
            r#"
            SELECT id, shop_id, name, percentage, exact_price, minimum_spend, quota,
                   started_at, expired_at
            FROM promotions
            WHERE id = $1 AND shop_id = $2
            "#,
        )
        .bind(promotion_id.as_i64())
        .bind(shop_id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(|row| -> Result<Promotion> {
            Ok(Promotion {
                id: PromotionId::new(row.try_get("id")?),
                shop_id: ShopId::new(row.try_get("shop_id")?),
                name: row.try_get("name")?,
                percentage: row.try_get("percentage")?,
                exact_price: row
                    .try_get::<Option<Decimal>, _>("exact_price")?
                    .map(Money::new),
                minimum_spend: Money::new(row.try_get("minimum_spend")?),
                quota: to_u32(row.try_get("quota")?, "quota")?,
                started_at: row.try_get("started_at")?,
                expired_at: row.try_get("expired_at")?,
            })
        })
        .transpose()
    }

    async fn decrement_quota(&mut self, promotion_id: PromotionId) -> Result<u64> {
        let result =
            sqlx::query("UPDATE promotions SET quota = quota - 1 WHERE id = $1 AND quota > 0")
                .bind(promotion_id.as_i64())
                .execute(&mut *self.tx)
                .await?;

        Ok(result.rows_affected())
    }
}
