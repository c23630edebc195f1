//! Order fulfillment for the marketplace.
//!
//! This crate provides:
//! - the checkout calculator that prices checked cart rows per shop
//! - the order state machine and the service that places orders and moves
//!   them from NEW to RECEIVE or CANCEL
//! - address and shipping collaborator traits with in-memory implementations

pub mod checkout;
pub mod error;
pub mod order;
pub mod services;

pub use checkout::{
    AppliedPromotion, CheckoutCalculator, CheckoutRequest, CheckoutSummary, DEFAULT_SERVICE_FEE,
    OrderDelivery, ShopPricing, ShopQuote, ShopSummary,
};
pub use error::{OrderError, Result};
pub use order::{
    CreateOrderRequest, EST_DAYS_RANGE, ORDER_PAGE_SIZE, OrderListRequest, OrderPage,
    OrderService, OrderWithDetails, Role, SellerStatusRequest, Transition, VariantLabel,
    can_transition,
};
pub use services::{
    AddressService, InMemoryAddressService, InMemoryShippingService, RateQuery, ShippingService,
    ShopCourier,
};
