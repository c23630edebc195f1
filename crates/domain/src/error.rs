//! Domain error types.

use common::{AccountId, Money, OrderId, ShopId, VariantId};
use ledger::LedgerError;
use store::{OrderStatus, StoreError};
use thiserror::Error;

/// Errors returned by checkout and order operations.
///
/// Every failed operation reports exactly one of these and leaves no partial
/// state behind.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Wrong initial status: order is {current}, expected {expected}")]
    WrongInitialStatus {
        current: OrderStatus,
        expected: OrderStatus,
    },

    #[error("Account {actor} may not act on order {order_id}")]
    UnauthorizedActor { actor: AccountId, order_id: OrderId },

    #[error("Wallet not activated")]
    WalletNotActivated,

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Money, available: Money },

    #[error("Promotion not found")]
    PromotionNotFound,

    #[error("Promotion expired")]
    PromotionExpired,

    #[error("No checked cart items for shop {shop_id}")]
    NoCheckedItems { shop_id: ShopId },

    #[error("Courier not available")]
    CourierNotAvailable,

    #[error("Courier does not belong to the shop")]
    CourierNotBelongToShop,

    #[error("Out of stock: variant {variant_id}")]
    OutOfStock { variant_id: VariantId },

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// An external collaborator (address book, shipping rates) failed.
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Ledger error: {0}")]
    Ledger(LedgerError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl OrderError {
    /// Short machine-readable name, used as a metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            OrderError::Validation(_) => "validation",
            OrderError::WrongInitialStatus { .. } => "wrong_initial_status",
            OrderError::UnauthorizedActor { .. } => "unauthorized_actor",
            OrderError::WalletNotActivated => "wallet_not_activated",
            OrderError::InsufficientBalance { .. } => "insufficient_balance",
            OrderError::PromotionNotFound => "promotion_not_found",
            OrderError::PromotionExpired => "promotion_expired",
            OrderError::NoCheckedItems { .. } => "no_checked_items",
            OrderError::CourierNotAvailable => "courier_not_available",
            OrderError::CourierNotBelongToShop => "courier_not_belong_to_shop",
            OrderError::OutOfStock { .. } => "out_of_stock",
            OrderError::OrderNotFound(_) => "order_not_found",
            OrderError::Collaborator(_) => "collaborator",
            OrderError::Ledger(_) => "ledger",
            OrderError::Store(_) => "store",
        }
    }
}

impl From<LedgerError> for OrderError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::WalletNotActivated { .. } | LedgerError::InactiveWallet { .. } => {
                OrderError::WalletNotActivated
            }
            LedgerError::InsufficientBalance {
                required,
                available,
            } => OrderError::InsufficientBalance {
                required,
                available,
            },
            LedgerError::Store(e) => OrderError::Store(e),
            other => OrderError::Ledger(other),
        }
    }
}

/// Result type for order operations.
pub type Result<T> = std::result::Result<T, OrderError>;
