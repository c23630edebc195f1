//! Buyer order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::OrderId;
use domain::{
    AddressService, CreateOrderRequest, OrderListRequest, OrderPage, OrderWithDetails,
    ShippingService,
};
use store::{MarketStore, Order};

use super::AppState;
use crate::error::ApiError;
use crate::extract::Actor;

/// POST /orders: one order per shop, paid into escrow.
#[tracing::instrument(skip(state, req))]
pub async fn create<S, A, C>(
    State(state): State<Arc<AppState<S, A, C>>>,
    Actor(buyer_id): Actor,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Vec<Order>>), ApiError>
where
    S: MarketStore + 'static,
    A: AddressService + 'static,
    C: ShippingService + 'static,
{
    let orders = state.orders.create_orders(buyer_id, &req).await?;
    Ok((StatusCode::CREATED, Json(orders)))
}

/// GET /orders?status&page
pub async fn list<S, A, C>(
    State(state): State<Arc<AppState<S, A, C>>>,
    Actor(buyer_id): Actor,
    Query(req): Query<OrderListRequest>,
) -> Result<Json<OrderPage>, ApiError>
where
    S: MarketStore + 'static,
    A: AddressService + 'static,
    C: ShippingService + 'static,
{
    Ok(Json(state.orders.list_for_buyer(buyer_id, &req).await?))
}

/// GET /orders/{id}: visible to the order's buyer and seller.
pub async fn get<S, A, C>(
    State(state): State<Arc<AppState<S, A, C>>>,
    Actor(actor): Actor,
    Path(id): Path<i64>,
) -> Result<Json<OrderWithDetails>, ApiError>
where
    S: MarketStore + 'static,
    A: AddressService + 'static,
    C: ShippingService + 'static,
{
    Ok(Json(state.orders.get_order(OrderId::new(id), actor).await?))
}

/// POST /orders/{id}/receive: releases escrow to the seller's shop wallet.
#[tracing::instrument(skip(state))]
pub async fn receive<S, A, C>(
    State(state): State<Arc<AppState<S, A, C>>>,
    Actor(buyer_id): Actor,
    Path(id): Path<i64>,
) -> Result<Json<Order>, ApiError>
where
    S: MarketStore + 'static,
    A: AddressService + 'static,
    C: ShippingService + 'static,
{
    Ok(Json(state.orders.receive(OrderId::new(id), buyer_id).await?))
}

/// POST /orders/{id}/cancel: refunds a NEW order to the buyer.
#[tracing::instrument(skip(state))]
pub async fn cancel<S, A, C>(
    State(state): State<Arc<AppState<S, A, C>>>,
    Actor(buyer_id): Actor,
    Path(id): Path<i64>,
) -> Result<Json<Order>, ApiError>
where
    S: MarketStore + 'static,
    A: AddressService + 'static,
    C: ShippingService + 'static,
{
    Ok(Json(state.orders.cancel(OrderId::new(id), buyer_id).await?))
}
