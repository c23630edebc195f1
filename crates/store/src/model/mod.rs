//! Row models persisted by the store.

pub mod catalog;
pub mod order;
pub mod transaction;
pub mod wallet;

pub use catalog::{
    CartItem, CartLine, DEFAULT_VARIANT_TYPE, NewProduct, NewPromotion, NewVariant, Product,
    Promotion, Shop, Variant,
};
pub use order::{NewOrder, NewOrderDetail, Order, OrderDetail, OrderStatus};
pub use transaction::{HistoryEntry, NewTransaction, Transaction, TransactionTitle};
pub use wallet::{Wallet, WalletPurpose};
