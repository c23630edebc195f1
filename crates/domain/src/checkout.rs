//! Checkout calculator.
//!
//! Prices a buyer's checked cart rows per shop: discounted line totals,
//! the selected shop promotion, and a delivery quote for the chosen
//! courier. Store reads for a summary run inside a unit of work that is
//! always rolled back, so pricing never writes anything and may run as
//! often as needed. Order creation quotes first, then re-prices each shop
//! from the store inside its own unit and refuses the checkout if the cart
//! moved in between.

use std::time::Instant;

use chrono::{DateTime, Utc};
use common::{AccountId, AddressId, DistrictId, Money, PromotionId, ShopCourierId, ShopId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use store::{CartLine, MarketStore, Promotion, StoreError, UnitOfWork};

use crate::error::{OrderError, Result};
use crate::services::{AddressService, RateQuery, ShippingService, ShopCourier};

/// Flat fee charged once per checkout, in major units.
pub const DEFAULT_SERVICE_FEE: i64 = 1000;

/// A shop's share of a checkout: which courier ships it and which
/// promotion, if any, the buyer picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDelivery {
    pub shop_id: ShopId,
    #[serde(default)]
    pub shop_courier_id: Option<ShopCourierId>,
    #[serde(default)]
    pub promotion_id: Option<PromotionId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub order_deliveries: Vec<OrderDelivery>,
    pub buyer_address_id: AddressId,
}

/// A promotion as it was applied to one shop's subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedPromotion {
    pub id: PromotionId,
    pub name: String,
    /// The reduction granted.
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionOutcome {
    pub sub_total_promotion: Money,
    pub applied: Option<AppliedPromotion>,
}

/// A shop's checked cart rows priced from the store alone: line totals,
/// promotion, units and weight. Carries no delivery quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopPricing {
    pub shop_id: ShopId,
    pub seller_id: AccountId,
    pub lines: Vec<CartLine>,
    pub sub_total_product: Money,
    pub sub_total_promotion: Money,
    pub promotion: Option<AppliedPromotion>,
    /// Units across all lines.
    pub quantity: u32,
    /// Grams across all lines.
    pub weight: u32,
}

/// Everything needed to pay for and record one shop order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopQuote {
    pub pricing: ShopPricing,
    pub courier: Option<ShopCourier>,
    pub delivery_cost: Money,
}

impl ShopQuote {
    /// What the buyer pays for this shop: promoted products plus delivery.
    pub fn subtotal(&self) -> Money {
        self.pricing.sub_total_promotion + self.delivery_cost
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopSummary {
    pub shop_id: ShopId,
    pub sub_total_product: Money,
    pub sub_total_promotion: Money,
    pub delivery_cost: Money,
    pub subtotal: Money,
}

impl From<&ShopQuote> for ShopSummary {
    fn from(quote: &ShopQuote) -> Self {
        Self {
            shop_id: quote.pricing.shop_id,
            sub_total_product: quote.pricing.sub_total_product,
            sub_total_promotion: quote.pricing.sub_total_promotion,
            delivery_cost: quote.delivery_cost,
            subtotal: quote.subtotal(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSummary {
    pub orders: Vec<ShopSummary>,
    /// Sum of promoted product subtotals.
    pub total_shop_price: Money,
    /// Units across every shop.
    pub total_product: u32,
    pub total_delivery_cost: Money,
    pub service_price: Money,
    /// Every shop subtotal plus the service fee.
    pub summary_price: Money,
}

impl CheckoutSummary {
    pub fn from_quotes(quotes: &[ShopQuote], service_fee: Money) -> Self {
        let orders: Vec<ShopSummary> = quotes.iter().map(ShopSummary::from).collect();
        let total_shop_price = quotes.iter().map(|q| q.pricing.sub_total_promotion).sum();
        let total_delivery_cost = quotes.iter().map(|q| q.delivery_cost).sum();
        let subtotals: Money = quotes.iter().map(ShopQuote::subtotal).sum();

        Self {
            orders,
            total_shop_price,
            total_product: quotes.iter().map(|q| q.pricing.quantity).sum(),
            total_delivery_cost,
            service_price: service_fee,
            summary_price: subtotals + service_fee,
        }
    }
}

/// `base_price × quantity × (1 − discount/100)`.
pub fn line_total(line: &CartLine) -> Money {
    line.base_price
        .times(line.quantity)
        .less_percent(line.discount_percent)
}

/// Sum of discounted line totals.
pub fn price_lines(lines: &[CartLine]) -> Money {
    lines.iter().map(line_total).sum()
}

/// Checks that a looked-up promotion exists, has quota left and is inside
/// its active window.
pub fn resolve_promotion(promotion: Option<Promotion>, now: DateTime<Utc>) -> Result<Promotion> {
    let promotion = promotion.ok_or(OrderError::PromotionNotFound)?;
    if promotion.quota == 0 || now < promotion.started_at || now >= promotion.expired_at {
        return Err(OrderError::PromotionExpired);
    }
    Ok(promotion)
}

/// Applies a resolved promotion to a shop's product subtotal.
///
/// The percentage cut comes first, then the exact-price cut; the result
/// never drops below zero. Nothing applies below the minimum spend, and a
/// promotion with neither cut set counts as no promotion.
pub fn apply_promotion(sub_total_product: Money, promotion: &Promotion) -> PromotionOutcome {
    let percentage = promotion.percentage.unwrap_or(Decimal::ZERO);
    let exact_price = promotion.exact_price.unwrap_or(Money::ZERO);
    let unchanged = PromotionOutcome {
        sub_total_promotion: sub_total_product,
        applied: None,
    };

    if percentage.is_zero() && exact_price.is_zero() {
        return unchanged;
    }
    if sub_total_product < promotion.minimum_spend {
        return unchanged;
    }

    let mut reduced = sub_total_product;
    if !percentage.is_zero() {
        reduced = reduced.less_percent(percentage);
    }
    if !exact_price.is_zero() {
        reduced = reduced.saturating_sub(exact_price);
    }

    PromotionOutcome {
        sub_total_promotion: reduced,
        applied: Some(AppliedPromotion {
            id: promotion.id,
            name: promotion.name.clone(),
            amount: sub_total_product - reduced,
        }),
    }
}

/// Picks the selected courier out of a shop's couriers.
pub fn resolve_courier(couriers: &[ShopCourier], id: ShopCourierId) -> Result<ShopCourier> {
    let courier = couriers
        .iter()
        .find(|c| c.id == id)
        .ok_or(OrderError::CourierNotBelongToShop)?;
    if !courier.is_available {
        return Err(OrderError::CourierNotAvailable);
    }
    Ok(courier.clone())
}

/// Gathers pricing inputs from the store and the address and shipping
/// collaborators.
pub struct CheckoutCalculator<S, A, C>
where
    S: MarketStore,
    A: AddressService,
    C: ShippingService,
{
    store: S,
    addresses: A,
    shipping: C,
    service_fee: Money,
}

impl<S, A, C> CheckoutCalculator<S, A, C>
where
    S: MarketStore,
    A: AddressService,
    C: ShippingService,
{
    pub fn new(store: S, addresses: A, shipping: C) -> Self {
        Self {
            store,
            addresses,
            shipping,
            service_fee: Money::from_major(DEFAULT_SERVICE_FEE),
        }
    }

    pub fn with_service_fee(mut self, service_fee: Money) -> Self {
        self.service_fee = service_fee;
        self
    }

    pub fn service_fee(&self) -> Money {
        self.service_fee
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Prices a checkout without changing anything.
    #[tracing::instrument(skip(self, request))]
    pub async fn summarize(
        &self,
        buyer_id: AccountId,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSummary> {
        let started = Instant::now();
        let quotes = self.quote_all(buyer_id, request, Utc::now()).await?;

        metrics::histogram!("checkout_summary_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        Ok(CheckoutSummary::from_quotes(&quotes, self.service_fee))
    }

    /// Quotes every shop of a checkout.
    ///
    /// Store reads run in a unit of work that is rolled back before any
    /// address or shipping call, so no transaction stays open while a
    /// collaborator answers.
    pub async fn quote_all(
        &self,
        buyer_id: AccountId,
        request: &CheckoutRequest,
        now: DateTime<Utc>,
    ) -> Result<Vec<ShopQuote>> {
        let mut uow = self.store.begin().await?;
        let mut pricings = Vec::with_capacity(request.order_deliveries.len());
        for delivery in &request.order_deliveries {
            pricings.push(self.price_shop(&mut uow, buyer_id, delivery, now).await?);
        }
        uow.rollback().await?;

        let buyer_district = self
            .addresses
            .buyer_district(buyer_id, request.buyer_address_id)
            .await?;

        let mut quotes = Vec::with_capacity(pricings.len());
        for (pricing, delivery) in pricings.into_iter().zip(&request.order_deliveries) {
            let (courier, delivery_cost) = self.ship(&pricing, delivery, buyer_district).await?;
            quotes.push(ShopQuote {
                pricing,
                courier,
                delivery_cost,
            });
        }
        Ok(quotes)
    }

    /// Prices one shop's checked cart rows from the store inside the
    /// caller's unit of work.
    pub async fn price_shop<U: UnitOfWork>(
        &self,
        uow: &mut U,
        buyer_id: AccountId,
        delivery: &OrderDelivery,
        now: DateTime<Utc>,
    ) -> Result<ShopPricing> {
        let shop_id = delivery.shop_id;
        let lines = uow.find_checked_lines(buyer_id, shop_id).await?;
        let Some(first) = lines.first() else {
            return Err(OrderError::NoCheckedItems { shop_id });
        };
        let seller_id = first.seller_id;

        let promotion = match delivery.promotion_id {
            Some(promotion_id) => Some(resolve_promotion(
                uow.find_promotion(shop_id, promotion_id).await?,
                now,
            )?),
            None => None,
        };

        let mut weight = 0u32;
        let mut quantity = 0u32;
        for line in &lines {
            let unit_weight =
                uow.product_weight(line.product_id)
                    .await?
                    .ok_or(StoreError::NotFound {
                        entity: "product",
                        id: line.product_id.as_i64(),
                    })?;
            weight = weight.saturating_add(unit_weight.saturating_mul(line.quantity));
            quantity = quantity.saturating_add(line.quantity);
        }

        let sub_total_product = price_lines(&lines);
        let outcome = match &promotion {
            Some(promotion) => apply_promotion(sub_total_product, promotion),
            None => PromotionOutcome {
                sub_total_promotion: sub_total_product,
                applied: None,
            },
        };

        Ok(ShopPricing {
            shop_id,
            seller_id,
            lines,
            sub_total_product,
            sub_total_promotion: outcome.sub_total_promotion,
            promotion: outcome.applied,
            quantity,
            weight,
        })
    }

    /// Validates the selected courier and quotes delivery for a priced shop.
    async fn ship(
        &self,
        pricing: &ShopPricing,
        delivery: &OrderDelivery,
        buyer_district: DistrictId,
    ) -> Result<(Option<ShopCourier>, Money)> {
        let shop_id = pricing.shop_id;
        let Some(courier_id) = delivery.shop_courier_id else {
            return Ok((None, Money::ZERO));
        };

        let couriers = self.shipping.shop_couriers(shop_id).await?;
        let courier = resolve_courier(&couriers, courier_id)?;
        if pricing.weight == 0 {
            return Ok((Some(courier), Money::ZERO));
        }

        let origin = self.addresses.shop_district(shop_id).await?;
        let query = RateQuery::new(origin, buyer_district, pricing.weight, &courier);
        let cost = self.shipping.quote_cost(&query).await?;
        Ok((Some(courier), cost))
    }
}
