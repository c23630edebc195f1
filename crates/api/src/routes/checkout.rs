//! Checkout pricing endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::{AddressService, CheckoutRequest, CheckoutSummary, ShippingService};
use store::MarketStore;

use super::AppState;
use crate::error::ApiError;
use crate::extract::Actor;

/// POST /checkout/summary: prices the buyer's checked cart rows per shop
/// without placing anything.
#[tracing::instrument(skip(state, req))]
pub async fn summary<S, A, C>(
    State(state): State<Arc<AppState<S, A, C>>>,
    Actor(buyer_id): Actor,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<CheckoutSummary>, ApiError>
where
    S: MarketStore + 'static,
    A: AddressService + 'static,
    C: ShippingService + 'static,
{
    let summary = state.orders.checkout().summarize(buyer_id, &req).await?;
    Ok(Json(summary))
}
