//! Seller order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::OrderId;
use domain::{AddressService, OrderListRequest, OrderPage, SellerStatusRequest, ShippingService};
use store::{MarketStore, Order};

use super::AppState;
use crate::error::ApiError;
use crate::extract::Actor;

/// GET /seller/orders?status&page
pub async fn list<S, A, C>(
    State(state): State<Arc<AppState<S, A, C>>>,
    Actor(seller_id): Actor,
    Query(req): Query<OrderListRequest>,
) -> Result<Json<OrderPage>, ApiError>
where
    S: MarketStore + 'static,
    A: AddressService + 'static,
    C: ShippingService + 'static,
{
    Ok(Json(state.orders.list_for_seller(seller_id, &req).await?))
}

/// PATCH /seller/orders/{id}/status: PROCESS, DELIVER (with `est_days`)
/// or ARRIVE.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S, A, C>(
    State(state): State<Arc<AppState<S, A, C>>>,
    Actor(seller_id): Actor,
    Path(id): Path<i64>,
    Json(req): Json<SellerStatusRequest>,
) -> Result<Json<Order>, ApiError>
where
    S: MarketStore + 'static,
    A: AddressService + 'static,
    C: ShippingService + 'static,
{
    let order = state
        .orders
        .update_status(OrderId::new(id), seller_id, &req)
        .await?;
    Ok(Json(order))
}

/// POST /seller/orders/{id}/reject: refunds a NEW order to the buyer.
#[tracing::instrument(skip(state))]
pub async fn reject<S, A, C>(
    State(state): State<Arc<AppState<S, A, C>>>,
    Actor(seller_id): Actor,
    Path(id): Path<i64>,
) -> Result<Json<Order>, ApiError>
where
    S: MarketStore + 'static,
    A: AddressService + 'static,
    C: ShippingService + 'static,
{
    Ok(Json(state.orders.reject(OrderId::new(id), seller_id).await?))
}
