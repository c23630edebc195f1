use chrono::{DateTime, Utc};
use common::{AccountId, Money, WalletId};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// What a wallet is used for. Each account owns one wallet per purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletPurpose {
    /// The account's spendable balance.
    Personal,
    /// Holds buyer funds between order placement and receipt.
    Escrow,
    /// Seller proceeds from received orders.
    Shop,
}

impl WalletPurpose {
    pub const ALL: [WalletPurpose; 3] = [
        WalletPurpose::Personal,
        WalletPurpose::Escrow,
        WalletPurpose::Shop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WalletPurpose::Personal => "PERSONAL",
            WalletPurpose::Escrow => "ESCROW",
            WalletPurpose::Shop => "SHOP",
        }
    }
}

impl std::fmt::Display for WalletPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WalletPurpose {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PERSONAL" => Ok(WalletPurpose::Personal),
            "ESCROW" => Ok(WalletPurpose::Escrow),
            "SHOP" => Ok(WalletPurpose::Shop),
            other => Err(StoreError::Corrupt(format!("unknown wallet purpose {other:?}"))),
        }
    }
}

/// A per-account, per-purpose balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub account_id: AccountId,
    pub purpose: WalletPurpose,
    pub balance: Money,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
