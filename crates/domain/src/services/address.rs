//! Address book collaborator.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{AccountId, AddressId, DistrictId, ShopId};
use tokio::sync::RwLock;

use crate::error::{OrderError, Result};

/// Resolves the districts that shipping rates are quoted between.
#[async_trait]
pub trait AddressService: Send + Sync {
    /// District of one of the buyer's saved addresses.
    async fn buyer_district(&self, buyer_id: AccountId, address_id: AddressId)
    -> Result<DistrictId>;

    /// District a shop ships from.
    async fn shop_district(&self, shop_id: ShopId) -> Result<DistrictId>;
}

#[derive(Debug, Default)]
struct InMemoryAddressState {
    addresses: HashMap<AddressId, (AccountId, DistrictId)>,
    shops: HashMap<ShopId, DistrictId>,
    next_id: i64,
    fail: bool,
}

/// In-memory address book for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAddressService {
    state: Arc<RwLock<InMemoryAddressState>>,
}

impl InMemoryAddressService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves an address for `account_id` and returns its id.
    pub async fn add_address(&self, account_id: AccountId, district_id: DistrictId) -> AddressId {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let id = AddressId::new(state.next_id);
        state.addresses.insert(id, (account_id, district_id));
        id
    }

    pub async fn set_shop_district(&self, shop_id: ShopId, district_id: DistrictId) {
        self.state.write().await.shops.insert(shop_id, district_id);
    }

    /// Makes every lookup fail, as if the address book were unreachable.
    pub async fn set_fail(&self, fail: bool) {
        self.state.write().await.fail = fail;
    }
}

#[async_trait]
impl AddressService for InMemoryAddressService {
    async fn buyer_district(
        &self,
        buyer_id: AccountId,
        address_id: AddressId,
    ) -> Result<DistrictId> {
        let state = self.state.read().await;
        if state.fail {
            return Err(OrderError::Collaborator("address book unavailable".to_string()));
        }

        match state.addresses.get(&address_id) {
            Some((owner, district)) if *owner == buyer_id => Ok(*district),
            _ => Err(OrderError::Validation(format!(
                "address {address_id} not found"
            ))),
        }
    }

    async fn shop_district(&self, shop_id: ShopId) -> Result<DistrictId> {
        let state = self.state.read().await;
        if state.fail {
            return Err(OrderError::Collaborator("address book unavailable".to_string()));
        }

        state
            .shops
            .get(&shop_id)
            .copied()
            .ok_or_else(|| OrderError::Collaborator(format!("shop {shop_id} has no address")))
    }
}
