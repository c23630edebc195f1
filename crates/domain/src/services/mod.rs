//! External collaborator traits and in-memory implementations.

pub mod address;
pub mod shipping;

pub use address::{AddressService, InMemoryAddressService};
pub use shipping::{InMemoryShippingService, RateQuery, ShippingService, ShopCourier};
