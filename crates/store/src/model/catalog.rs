//! Rows owned by the cart, catalog and promotion collaborators.
//!
//! The core only reads these and applies the narrow mutations that must
//! share an order's unit of work: deleting checked cart rows, decrementing
//! variant stock and consuming promotion quota.

use chrono::{DateTime, Utc};
use common::{AccountId, CartId, Money, ProductId, PromotionId, ShopId, VariantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Variant type name used when a product has fewer than two variant axes.
pub const DEFAULT_VARIANT_TYPE: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    /// The seller account that owns the shop.
    pub account_id: AccountId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub shop_id: ShopId,
    pub code: String,
    pub name: String,
    pub thumbnail_url: String,
    /// Shipping weight of one unit, in grams.
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub shop_id: ShopId,
    pub code: String,
    pub name: String,
    pub thumbnail_url: String,
    pub weight: u32,
}

/// A purchasable combination of up to two variant types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub first_type: String,
    pub second_type: String,
    pub price: Money,
    pub discount_percent: Decimal,
    pub stock: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVariant {
    pub product_id: ProductId,
    pub first_type: String,
    pub second_type: String,
    pub price: Money,
    pub discount_percent: Decimal,
    pub stock: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartId,
    pub account_id: AccountId,
    pub variant_id: VariantId,
    pub quantity: u32,
    pub is_checked: bool,
}

/// A checked cart row joined with its product, variant and shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub cart_id: CartId,
    pub shop_id: ShopId,
    pub seller_id: AccountId,
    pub product_id: ProductId,
    pub product_code: String,
    pub product_name: String,
    pub thumbnail_url: String,
    pub variant_id: VariantId,
    pub first_type: String,
    pub second_type: String,
    pub base_price: Money,
    pub discount_percent: Decimal,
    pub quantity: u32,
}

/// A shop-level discount with a finite redemption quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: PromotionId,
    pub shop_id: ShopId,
    pub name: String,
    pub percentage: Option<Decimal>,
    pub exact_price: Option<Money>,
    pub minimum_spend: Money,
    pub quota: u32,
    pub started_at: DateTime<Utc>,
    pub expired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPromotion {
    pub shop_id: ShopId,
    pub name: String,
    pub percentage: Option<Decimal>,
    pub exact_price: Option<Money>,
    pub minimum_spend: Money,
    pub quota: u32,
    pub started_at: DateTime<Utc>,
    pub expired_at: DateTime<Utc>,
}
