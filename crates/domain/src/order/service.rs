//! Order service: checkout into orders, and every later status change.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use common::{AccountId, CartId, Money, OrderId, VariantId};
use ledger::transfer_within;
use ledger::wallet_store::{find_active, lock_active_pair};
use store::{
    CartRepository, CatalogRepository, MarketStore, NewOrder, NewOrderDetail, Order, OrderDetail,
    OrderQuery, OrderRepository, Pagination, PromotionRepository, StoreError, Transaction,
    TransactionRepository, TransactionTitle, UnitOfWork, WalletPurpose,
};

use super::transition::{Role, Transition};
use super::variant::VariantLabel;
use super::view::{
    CreateOrderRequest, ORDER_PAGE_SIZE, OrderListRequest, OrderPage, OrderWithDetails,
    SellerStatusRequest,
};
use crate::checkout::{CheckoutCalculator, line_total};
use crate::error::{OrderError, Result};
use crate::services::{AddressService, ShippingService};

/// Lead times a seller may promise when handing an order to the courier.
pub const EST_DAYS_RANGE: std::ops::RangeInclusive<u32> = 1..=3;

/// Service for placing orders and moving them through their lifecycle.
///
/// Every operation runs in one unit of work: the status write, the wallet
/// transfer and any stock or quota change commit together or not at all.
pub struct OrderService<S, A, C>
where
    S: MarketStore,
    A: AddressService,
    C: ShippingService,
{
    checkout: CheckoutCalculator<S, A, C>,
}

impl<S, A, C> OrderService<S, A, C>
where
    S: MarketStore,
    A: AddressService,
    C: ShippingService,
{
    pub fn new(store: S, addresses: A, shipping: C) -> Self {
        Self {
            checkout: CheckoutCalculator::new(store, addresses, shipping),
        }
    }

    pub fn with_service_fee(mut self, service_fee: Money) -> Self {
        self.checkout = self.checkout.with_service_fee(service_fee);
        self
    }

    /// The calculator used to price checkouts.
    pub fn checkout(&self) -> &CheckoutCalculator<S, A, C> {
        &self.checkout
    }

    fn store(&self) -> &S {
        self.checkout.store()
    }

    /// Places one order per shop and moves the buyer's money into escrow.
    #[tracing::instrument(skip(self, request))]
    pub async fn create_orders(
        &self,
        buyer_id: AccountId,
        request: &CreateOrderRequest,
    ) -> Result<Vec<Order>> {
        match self.place_orders(buyer_id, request).await {
            Ok(orders) => {
                metrics::counter!("orders_created_total").increment(orders.len() as u64);
                tracing::info!(%buyer_id, orders = orders.len(), "orders created");
                Ok(orders)
            }
            Err(e) => {
                metrics::counter!("order_transition_rejections_total", "reason" => e.kind())
                    .increment(1);
                tracing::warn!(%buyer_id, error = %e, "order creation rejected");
                Err(e)
            }
        }
    }

    async fn place_orders(
        &self,
        buyer_id: AccountId,
        request: &CreateOrderRequest,
    ) -> Result<Vec<Order>> {
        if request.order_deliveries.is_empty() {
            return Err(OrderError::Validation(
                "at least one order delivery is required".to_string(),
            ));
        }
        let mut shops = HashSet::new();
        let mut courier_ids = Vec::with_capacity(request.order_deliveries.len());
        for delivery in &request.order_deliveries {
            if !shops.insert(delivery.shop_id) {
                return Err(OrderError::Validation(format!(
                    "shop {} is listed twice",
                    delivery.shop_id
                )));
            }
            let courier_id = delivery.shop_courier_id.ok_or_else(|| {
                OrderError::Validation(format!("shop {} has no courier", delivery.shop_id))
            })?;
            courier_ids.push(courier_id);
        }

        let now = Utc::now();
        let quotes = self.checkout.quote_all(buyer_id, request, now).await?;

        let mut uow = self.store().begin().await?;
        let (personal, escrow) =
            lock_active_pair(&mut uow, buyer_id, WalletPurpose::Personal, WalletPurpose::Escrow)
                .await?;

        // Delivery was quoted outside this unit; the cart and promotion it
        // was quoted for must still hold under the wallet lock.
        for (quote, delivery) in quotes.iter().zip(&request.order_deliveries) {
            let pricing = self
                .checkout
                .price_shop(&mut uow, buyer_id, delivery, now)
                .await?;
            if pricing != quote.pricing {
                return Err(OrderError::Validation(format!(
                    "cart for shop {} changed during checkout",
                    delivery.shop_id
                )));
            }
        }

        let total: Money = quotes.iter().map(|q| q.subtotal()).sum();
        let required = total + self.checkout.service_fee();
        if required > personal.balance {
            return Err(OrderError::InsufficientBalance {
                required,
                available: personal.balance,
            });
        }

        let mut orders = Vec::with_capacity(quotes.len());
        for (quote, courier_id) in quotes.iter().zip(courier_ids) {
            let transaction_id = transfer_within(
                &mut uow,
                personal.id,
                escrow.id,
                quote.subtotal(),
                TransactionTitle::PaymentOrder,
            )
            .await?;

            let order = uow
                .insert_order(NewOrder {
                    buyer_id,
                    seller_id: quote.pricing.seller_id,
                    shop_id: quote.pricing.shop_id,
                    courier_id,
                    delivery_cost: quote.delivery_cost,
                    transaction_id,
                    promotion_id: quote.pricing.promotion.as_ref().map(|p| p.id),
                    promotion_name: quote.pricing.promotion.as_ref().map(|p| p.name.clone()),
                    promotion_amount: quote.pricing.promotion.as_ref().map(|p| p.amount),
                })
                .await?;

            for line in &quote.pricing.lines {
                uow.insert_order_detail(NewOrderDetail {
                    order_id: order.id,
                    product_code: line.product_code.clone(),
                    product_name: line.product_name.clone(),
                    thumbnail_url: line.thumbnail_url.clone(),
                    variant_id: Some(line.variant_id),
                    variant_name: VariantLabel::build(&line.first_type, &line.second_type),
                    quantity: line.quantity,
                    sub_total_price: line_total(line),
                })
                .await?;
            }

            let cart_ids: Vec<CartId> = quote.pricing.lines.iter().map(|l| l.cart_id).collect();
            uow.delete_cart_rows(&cart_ids).await?;
            orders.push(order);
        }

        uow.commit().await?;
        Ok(orders)
    }

    /// NEW → PROCESS. Takes the ordered units out of stock and consumes one
    /// redemption of the applied promotion.
    #[tracing::instrument(skip(self))]
    pub async fn process(&self, order_id: OrderId, seller_id: AccountId) -> Result<Order> {
        let result = self.apply_process(order_id, seller_id).await;
        observe(Transition::Process, order_id, result)
    }

    async fn apply_process(&self, order_id: OrderId, seller_id: AccountId) -> Result<Order> {
        let (mut uow, order) = self
            .begin_transition(order_id, seller_id, Transition::Process)
            .await?;

        for detail in uow.find_order_details(order_id).await? {
            let variant_id = match detail.variant_id {
                Some(variant_id) => variant_id,
                None => resolve_variant_by_label(&mut uow, &detail).await?,
            };
            if uow.decrement_stock(variant_id, detail.quantity).await? == 0 {
                return Err(OrderError::OutOfStock { variant_id });
            }
        }

        // Creation only checks that quota is left, so several NEW orders can
        // share the last redemption; the first one processed takes it.
        if let Some(promotion_id) = order.promotion_id {
            if uow.decrement_quota(promotion_id).await? == 0 {
                return Err(OrderError::PromotionExpired);
            }
        }

        finish_transition(uow, &order, Transition::Process, None).await
    }

    /// PROCESS → DELIVER, promising arrival within `est_days` days.
    #[tracing::instrument(skip(self))]
    pub async fn deliver(
        &self,
        order_id: OrderId,
        seller_id: AccountId,
        est_days: u32,
    ) -> Result<Order> {
        let result = self.apply_deliver(order_id, seller_id, est_days).await;
        observe(Transition::Deliver, order_id, result)
    }

    async fn apply_deliver(
        &self,
        order_id: OrderId,
        seller_id: AccountId,
        est_days: u32,
    ) -> Result<Order> {
        if !EST_DAYS_RANGE.contains(&est_days) {
            return Err(OrderError::Validation(format!(
                "est_days must be between {} and {}, got {est_days}",
                EST_DAYS_RANGE.start(),
                EST_DAYS_RANGE.end()
            )));
        }

        let (uow, order) = self
            .begin_transition(order_id, seller_id, Transition::Deliver)
            .await?;
        let estimated_arrival = Utc::now() + Duration::days(i64::from(est_days));
        finish_transition(uow, &order, Transition::Deliver, Some(estimated_arrival)).await
    }

    /// DELIVER → ARRIVE.
    #[tracing::instrument(skip(self))]
    pub async fn arrive(&self, order_id: OrderId, seller_id: AccountId) -> Result<Order> {
        let result = self.apply_arrive(order_id, seller_id).await;
        observe(Transition::Arrive, order_id, result)
    }

    async fn apply_arrive(&self, order_id: OrderId, seller_id: AccountId) -> Result<Order> {
        let (uow, order) = self
            .begin_transition(order_id, seller_id, Transition::Arrive)
            .await?;
        finish_transition(uow, &order, Transition::Arrive, None).await
    }

    /// Dispatches a seller status request to PROCESS, DELIVER or ARRIVE.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        seller_id: AccountId,
        request: &SellerStatusRequest,
    ) -> Result<Order> {
        match Transition::for_seller_status(request.status) {
            Some(Transition::Process) => self.process(order_id, seller_id).await,
            Some(Transition::Deliver) => {
                let est_days = request.est_days.ok_or_else(|| {
                    OrderError::Validation("est_days is required to deliver".to_string())
                })?;
                self.deliver(order_id, seller_id, est_days).await
            }
            Some(Transition::Arrive) => self.arrive(order_id, seller_id).await,
            _ => Err(OrderError::Validation(format!(
                "sellers cannot set status {}",
                request.status
            ))),
        }
    }

    /// ARRIVE → RECEIVE. Pays the order's escrowed amount to the seller's
    /// shop wallet.
    #[tracing::instrument(skip(self))]
    pub async fn receive(&self, order_id: OrderId, buyer_id: AccountId) -> Result<Order> {
        let result = self.apply_receive(order_id, buyer_id).await;
        observe(Transition::Receive, order_id, result)
    }

    async fn apply_receive(&self, order_id: OrderId, buyer_id: AccountId) -> Result<Order> {
        let (mut uow, order) = self
            .begin_transition(order_id, buyer_id, Transition::Receive)
            .await?;
        let payment = payment_of(&mut uow, &order).await?;
        let shop = find_active(&mut uow, order.seller_id, WalletPurpose::Shop).await?;

        transfer_within(
            &mut uow,
            payment.to_wallet_id,
            shop.id,
            payment.amount,
            TransactionTitle::TransferOrder,
        )
        .await?;

        finish_transition(uow, &order, Transition::Receive, None).await
    }

    /// NEW → CANCEL by the buyer, refunding the escrowed amount.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, order_id: OrderId, buyer_id: AccountId) -> Result<Order> {
        let result = self
            .cancel_and_reject(order_id, buyer_id, Transition::Cancel)
            .await;
        observe(Transition::Cancel, order_id, result)
    }

    /// NEW → CANCEL by the seller, refunding the escrowed amount.
    #[tracing::instrument(skip(self))]
    pub async fn reject(&self, order_id: OrderId, seller_id: AccountId) -> Result<Order> {
        let result = self
            .cancel_and_reject(order_id, seller_id, Transition::Reject)
            .await;
        observe(Transition::Reject, order_id, result)
    }

    async fn cancel_and_reject(
        &self,
        order_id: OrderId,
        actor: AccountId,
        transition: Transition,
    ) -> Result<Order> {
        let (mut uow, order) = self.begin_transition(order_id, actor, transition).await?;
        let payment = payment_of(&mut uow, &order).await?;
        let source = payment.from_wallet_id.ok_or_else(|| {
            StoreError::Corrupt(format!(
                "payment {} of order {order_id} has no source wallet",
                payment.id
            ))
        })?;

        transfer_within(
            &mut uow,
            payment.to_wallet_id,
            source,
            payment.amount,
            TransactionTitle::RefundOrder,
        )
        .await?;

        finish_transition(uow, &order, transition, None).await
    }

    /// Locks the order and checks the actor and the predecessor status.
    async fn begin_transition(
        &self,
        order_id: OrderId,
        actor: AccountId,
        transition: Transition,
    ) -> Result<(S::Uow, Order)> {
        let mut uow = self.store().begin().await?;
        let order = uow
            .lock_order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        let party = match transition.role() {
            Role::Buyer => order.buyer_id,
            Role::Seller => order.seller_id,
        };
        if party != actor {
            return Err(OrderError::UnauthorizedActor { actor, order_id });
        }
        if order.status != transition.from() {
            return Err(OrderError::WrongInitialStatus {
                current: order.status,
                expected: transition.from(),
            });
        }

        Ok((uow, order))
    }

    /// Reads one order with its line items. Only its buyer and seller may.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId, actor: AccountId) -> Result<OrderWithDetails> {
        let order = self
            .store()
            .order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;
        if order.buyer_id != actor && order.seller_id != actor {
            return Err(OrderError::UnauthorizedActor { actor, order_id });
        }
        let details = self.store().order_details(order_id).await?;
        Ok(OrderWithDetails { order, details })
    }

    pub async fn list_for_buyer(
        &self,
        buyer_id: AccountId,
        request: &OrderListRequest,
    ) -> Result<OrderPage> {
        self.list(OrderQuery::for_buyer(buyer_id), request).await
    }

    pub async fn list_for_seller(
        &self,
        seller_id: AccountId,
        request: &OrderListRequest,
    ) -> Result<OrderPage> {
        self.list(OrderQuery::for_seller(seller_id), request).await
    }

    async fn list(&self, mut query: OrderQuery, request: &OrderListRequest) -> Result<OrderPage> {
        if let Some(status) = request.status {
            query = query.status(status);
        }
        let page = Pagination::new(request.page, ORDER_PAGE_SIZE);
        let total = self.store().count_orders(&query).await?;

        let mut orders = Vec::new();
        for order in self.store().orders(&query.page(page)).await? {
            let details = self.store().order_details(order.id).await?;
            orders.push(OrderWithDetails { order, details });
        }

        Ok(OrderPage {
            orders,
            page: page.page,
            total_pages: page.total_pages(total),
        })
    }
}

/// Writes the new status and commits.
async fn finish_transition<U: UnitOfWork>(
    mut uow: U,
    order: &Order,
    transition: Transition,
    estimated_arrival: Option<DateTime<Utc>>,
) -> Result<Order> {
    let rows = uow
        .update_order_status(order.id, transition.from(), transition.to(), estimated_arrival)
        .await?;
    if rows == 0 {
        let current = uow
            .lock_order(order.id)
            .await?
            .map_or(order.status, |o| o.status);
        return Err(OrderError::WrongInitialStatus {
            current,
            expected: transition.from(),
        });
    }

    let updated = uow
        .lock_order(order.id)
        .await?
        .ok_or(OrderError::OrderNotFound(order.id))?;
    uow.commit().await?;

    metrics::counter!("order_transitions_total", "to" => transition.to().as_str()).increment(1);
    tracing::info!(order_id = %order.id, %transition, status = %updated.status, "order transitioned");
    Ok(updated)
}

fn observe<T>(transition: Transition, order_id: OrderId, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        metrics::counter!("order_transition_rejections_total", "reason" => e.kind()).increment(1);
        tracing::warn!(%order_id, %transition, error = %e, "order transition rejected");
    }
    result
}

/// The PAYMENT-ORDER entry that moved the buyer's money into escrow.
async fn payment_of<U: UnitOfWork>(uow: &mut U, order: &Order) -> Result<Transaction> {
    let payment = uow
        .find_transaction(order.transaction_id)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "transaction",
            id: order.transaction_id.as_i64(),
        })?;
    Ok(payment)
}

/// Resolves the variant of a detail row written without a variant id by
/// splitting its `type1-type2` label.
async fn resolve_variant_by_label<U: UnitOfWork>(
    uow: &mut U,
    detail: &OrderDetail,
) -> Result<VariantId> {
    let (first_type, second_type) = VariantLabel::split(&detail.variant_name);
    let variant_id = uow
        .find_variant_by_types(&detail.product_code, &first_type, &second_type)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "variant",
            id: detail.id.as_i64(),
        })?;
    Ok(variant_id)
}
