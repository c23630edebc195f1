//! Order requests and read models.

use serde::{Deserialize, Serialize};
use store::{Order, OrderDetail, OrderStatus};

use crate::checkout::CheckoutRequest;

/// Orders per page in buyer and seller listings.
pub const ORDER_PAGE_SIZE: u32 = 6;

/// Places one order per listed shop from the buyer's checked cart rows.
pub type CreateOrderRequest = CheckoutRequest;

/// A seller moving an order forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerStatusRequest {
    pub status: OrderStatus,
    /// Lead time in days; required when the status is DELIVER.
    #[serde(default)]
    pub est_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithDetails {
    #[serde(flatten)]
    pub order: Order,
    pub details: Vec<OrderDetail>,
}

/// Listing filter shared by buyers and sellers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderListRequest {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPage {
    pub orders: Vec<OrderWithDetails>,
    pub page: u32,
    pub total_pages: u32,
}
