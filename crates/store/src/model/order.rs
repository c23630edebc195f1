use chrono::{DateTime, Utc};
use common::{
    AccountId, Money, OrderDetailId, OrderId, PromotionId, ShopCourierId, ShopId, TransactionId,
    VariantId,
};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// The persisted status of an order.
///
/// ```text
/// NEW ──► PROCESS ──► DELIVER ──► ARRIVE ──► RECEIVE
///  │
///  └──► CANCEL
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    New,
    Process,
    Deliver,
    Arrive,
    Receive,
    Cancel,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::New,
        OrderStatus::Process,
        OrderStatus::Deliver,
        OrderStatus::Arrive,
        OrderStatus::Receive,
        OrderStatus::Cancel,
    ];

    /// Returns true if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Receive | OrderStatus::Cancel)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Process => "PROCESS",
            OrderStatus::Deliver => "DELIVER",
            OrderStatus::Arrive => "ARRIVE",
            OrderStatus::Receive => "RECEIVE",
            OrderStatus::Cancel => "CANCEL",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown order status {s:?}")))
    }
}

/// An order placed with a single shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub buyer_id: AccountId,
    pub seller_id: AccountId,
    pub shop_id: ShopId,
    pub courier_id: ShopCourierId,
    pub delivery_cost: Money,
    /// The escrow debit that paid for this order.
    pub transaction_id: TransactionId,
    pub promotion_id: Option<PromotionId>,
    pub promotion_name: Option<String>,
    pub promotion_amount: Option<Money>,
    pub estimated_arrival: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order about to be inserted. New orders always start in `NEW`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub buyer_id: AccountId,
    pub seller_id: AccountId,
    pub shop_id: ShopId,
    pub courier_id: ShopCourierId,
    pub delivery_cost: Money,
    pub transaction_id: TransactionId,
    pub promotion_id: Option<PromotionId>,
    pub promotion_name: Option<String>,
    pub promotion_amount: Option<Money>,
}

/// A line item snapshotted when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub id: OrderDetailId,
    pub order_id: OrderId,
    pub product_code: String,
    pub product_name: String,
    pub thumbnail_url: String,
    /// Missing only on rows written before variant ids were recorded.
    pub variant_id: Option<VariantId>,
    pub variant_name: String,
    pub quantity: u32,
    pub sub_total_price: Money,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderDetail {
    pub order_id: OrderId,
    pub product_code: String,
    pub product_name: String,
    pub thumbnail_url: String,
    pub variant_id: Option<VariantId>,
    pub variant_name: String,
    pub quantity: u32,
    pub sub_total_price: Money,
}
