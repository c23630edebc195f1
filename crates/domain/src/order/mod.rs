//! Orders: the status state machine and the service that drives it.

mod service;
mod transition;
mod variant;
mod view;

pub use service::{EST_DAYS_RANGE, OrderService};
pub use transition::{Role, Transition, can_transition};
pub use variant::VariantLabel;
pub use view::{
    CreateOrderRequest, ORDER_PAGE_SIZE, OrderListRequest, OrderPage, OrderWithDetails,
    SellerStatusRequest,
};
