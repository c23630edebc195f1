//! HTTP route handlers and the state they share.

pub mod checkout;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod seller;
pub mod wallets;

use domain::{AddressService, OrderService, ShippingService};
use ledger::WalletService;
use store::MarketStore;

/// Shared application state accessible from all handlers.
pub struct AppState<S, A, C>
where
    S: MarketStore,
    A: AddressService,
    C: ShippingService,
{
    pub wallets: WalletService<S>,
    pub orders: OrderService<S, A, C>,
}
