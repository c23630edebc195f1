//! Courier and shipping-rate collaborator.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{DistrictId, Money, ShopCourierId, ShopId};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{OrderError, Result};

/// A courier service offered by a shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopCourier {
    pub id: ShopCourierId,
    pub shop_id: ShopId,
    /// Carrier code, e.g. `jne`.
    pub code: String,
    /// Carrier service level, e.g. `REG`.
    pub service: String,
    pub is_available: bool,
}

/// A shipping-rate lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateQuery {
    pub origin: DistrictId,
    pub destination: DistrictId,
    /// Total weight in grams.
    pub weight: u32,
    pub courier_code: String,
    pub service_code: String,
}

impl RateQuery {
    pub fn new(origin: DistrictId, destination: DistrictId, weight: u32, courier: &ShopCourier) -> Self {
        let query = Self {
            origin,
            destination,
            weight,
            courier_code: courier.code.clone(),
            service_code: courier.service.clone(),
        };
        query.with_same_district_service()
    }

    /// Same-district `jne` shipments are quoted under the city-courier
    /// service codes.
    pub fn with_same_district_service(mut self) -> Self {
        if self.origin == self.destination && self.courier_code == "jne" {
            self.service_code = match self.service_code.as_str() {
                "REG" => "CTC".to_string(),
                "YES" => "CTCYES".to_string(),
                _ => self.service_code,
            };
        }
        self
    }
}

/// Courier listings and delivery-cost quotes.
#[async_trait]
pub trait ShippingService: Send + Sync {
    /// Every courier a shop has configured, available or not.
    async fn shop_couriers(&self, shop_id: ShopId) -> Result<Vec<ShopCourier>>;

    async fn quote_cost(&self, query: &RateQuery) -> Result<Money>;
}

#[derive(Debug, Default)]
struct InMemoryShippingState {
    couriers: HashMap<ShopCourierId, ShopCourier>,
    /// Cost per started kilogram, keyed by (courier code, service code).
    rates: HashMap<(String, String), Money>,
    quotes: Vec<RateQuery>,
    next_id: i64,
    fail_on_quote: bool,
}

/// In-memory courier registry and rate card for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryShippingService {
    state: Arc<RwLock<InMemoryShippingState>>,
}

impl InMemoryShippingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_courier(
        &self,
        shop_id: ShopId,
        code: &str,
        service: &str,
        is_available: bool,
    ) -> ShopCourier {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let courier = ShopCourier {
            id: ShopCourierId::new(state.next_id),
            shop_id,
            code: code.to_string(),
            service: service.to_string(),
            is_available,
        };
        state.couriers.insert(courier.id, courier.clone());
        courier
    }

    /// Sets the price of one started kilogram for a courier service.
    pub async fn set_rate(&self, code: &str, service: &str, per_kilogram: Money) {
        self.state
            .write()
            .await
            .rates
            .insert((code.to_string(), service.to_string()), per_kilogram);
    }

    pub async fn set_fail_on_quote(&self, fail: bool) {
        self.state.write().await.fail_on_quote = fail;
    }

    /// Every rate query received so far.
    pub async fn quotes(&self) -> Vec<RateQuery> {
        self.state.read().await.quotes.clone()
    }
}

#[async_trait]
impl ShippingService for InMemoryShippingService {
    async fn shop_couriers(&self, shop_id: ShopId) -> Result<Vec<ShopCourier>> {
        let state = self.state.read().await;
        let mut couriers: Vec<_> = state
            .couriers
            .values()
            .filter(|c| c.shop_id == shop_id)
            .cloned()
            .collect();
        couriers.sort_by_key(|c| c.id);
        Ok(couriers)
    }

    async fn quote_cost(&self, query: &RateQuery) -> Result<Money> {
        let mut state = self.state.write().await;
        if state.fail_on_quote {
            return Err(OrderError::Collaborator(
                "shipping rates unavailable".to_string(),
            ));
        }
        state.quotes.push(query.clone());

        let per_kilogram = state
            .rates
            .get(&(query.courier_code.clone(), query.service_code.clone()))
            .copied()
            .ok_or_else(|| {
                OrderError::Collaborator(format!(
                    "no rate for {}/{}",
                    query.courier_code, query.service_code
                ))
            })?;

        Ok(per_kilogram.times(query.weight.div_ceil(1000)))
    }
}
