//! Shared identifiers and the money value object.

pub mod money;
pub mod types;

pub use money::{MONEY_INTEGER_DIGITS, MONEY_SCALE, Money};
pub use types::{
    AccountId, AddressId, CartId, DistrictId, OrderDetailId, OrderId, ProductId, PromotionId,
    ShopCourierId, ShopId, TransactionId, VariantId, WalletId,
};
