//! HTTP API for the marketplace wallet ledger and order fulfillment.
//!
//! Provides REST endpoints for wallets, checkout and the order lifecycle,
//! with structured logging (tracing) and Prometheus metrics. Callers are
//! identified by the `x-account-id` header.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use common::Money;
use domain::{AddressService, OrderService, ShippingService};
use ledger::WalletService;
use metrics_exporter_prometheus::PrometheusHandle;
use store::MarketStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use routes::AppState;

/// Builds the shared state over one store and its collaborators.
pub fn create_state<S, A, C>(
    store: S,
    addresses: A,
    shipping: C,
    service_fee: Money,
) -> Arc<AppState<S, A, C>>
where
    S: MarketStore + Clone,
    A: AddressService,
    C: ShippingService,
{
    Arc::new(AppState {
        wallets: WalletService::new(store.clone()),
        orders: OrderService::new(store, addresses, shipping).with_service_fee(service_fee),
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, A, C>(
    state: Arc<AppState<S, A, C>>,
    metrics_handle: PrometheusHandle,
    request_timeout: Duration,
) -> Router
where
    S: MarketStore + 'static,
    A: AddressService + 'static,
    C: ShippingService + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/wallets", post(routes::wallets::open::<S, A, C>))
        .route(
            "/wallets/personal",
            get(routes::wallets::personal::<S, A, C>),
        )
        .route(
            "/wallets/personal/activate",
            post(routes::wallets::activate_personal::<S, A, C>),
        )
        .route("/wallets/shop", get(routes::wallets::shop::<S, A, C>))
        .route(
            "/wallets/shop/activate",
            post(routes::wallets::activate_shop::<S, A, C>),
        )
        .route("/wallets/topup", post(routes::wallets::top_up::<S, A, C>))
        .route(
            "/wallets/withdraw",
            post(routes::wallets::withdraw::<S, A, C>),
        )
        .route(
            "/wallets/history",
            get(routes::wallets::history::<S, A, C>),
        )
        .route(
            "/checkout/summary",
            post(routes::checkout::summary::<S, A, C>),
        )
        .route(
            "/orders",
            post(routes::orders::create::<S, A, C>).get(routes::orders::list::<S, A, C>),
        )
        .route("/orders/{id}", get(routes::orders::get::<S, A, C>))
        .route(
            "/orders/{id}/receive",
            post(routes::orders::receive::<S, A, C>),
        )
        .route(
            "/orders/{id}/cancel",
            post(routes::orders::cancel::<S, A, C>),
        )
        .route("/seller/orders", get(routes::seller::list::<S, A, C>))
        .route(
            "/seller/orders/{id}/status",
            patch(routes::seller::update_status::<S, A, C>),
        )
        .route(
            "/seller/orders/{id}/reject",
            post(routes::seller::reject::<S, A, C>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
