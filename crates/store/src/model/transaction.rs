use chrono::{DateTime, Utc};
use common::{Money, OrderId, TransactionId, WalletId};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// The purpose tag recorded on every ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionTitle {
    /// Buyer personal wallet into escrow at order creation.
    #[serde(rename = "PAYMENT-ORDER")]
    PaymentOrder,
    /// Escrow into the seller's shop wallet on receipt.
    #[serde(rename = "TRANSFER-ORDER")]
    TransferOrder,
    /// Escrow back into the buyer's personal wallet on cancellation.
    #[serde(rename = "REFUND-ORDER")]
    RefundOrder,
    /// External funding into a personal wallet.
    #[serde(rename = "TOPUP")]
    TopUp,
    /// Shop proceeds moved into the seller's personal wallet.
    #[serde(rename = "WITHDRAW")]
    Withdraw,
}

impl TransactionTitle {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionTitle::PaymentOrder => "PAYMENT-ORDER",
            TransactionTitle::TransferOrder => "TRANSFER-ORDER",
            TransactionTitle::RefundOrder => "REFUND-ORDER",
            TransactionTitle::TopUp => "TOPUP",
            TransactionTitle::Withdraw => "WITHDRAW",
        }
    }
}

impl std::fmt::Display for TransactionTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionTitle {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PAYMENT-ORDER" => Ok(TransactionTitle::PaymentOrder),
            "TRANSFER-ORDER" => Ok(TransactionTitle::TransferOrder),
            "REFUND-ORDER" => Ok(TransactionTitle::RefundOrder),
            "TOPUP" => Ok(TransactionTitle::TopUp),
            "WITHDRAW" => Ok(TransactionTitle::Withdraw),
            other => Err(StoreError::Corrupt(format!(
                "unknown transaction title {other:?}"
            ))),
        }
    }
}

/// An immutable ledger entry.
///
/// `from_wallet_id` is `None` only for top-ups, whose funds come from outside
/// the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub title: TransactionTitle,
    pub amount: Money,
    pub from_wallet_id: Option<WalletId>,
    pub to_wallet_id: WalletId,
    pub created_at: DateTime<Utc>,
}

/// A ledger entry about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub title: TransactionTitle,
    pub amount: Money,
    pub from_wallet_id: Option<WalletId>,
    pub to_wallet_id: WalletId,
}

/// One line of a wallet's history as seen by its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub transaction_id: TransactionId,
    pub title: TransactionTitle,
    pub amount: Money,
    /// True when the wallet received the funds.
    pub incoming: bool,
    /// The order paid for by this entry, if any.
    pub order_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_text_matches_serde() {
        for title in [
            TransactionTitle::PaymentOrder,
            TransactionTitle::TransferOrder,
            TransactionTitle::RefundOrder,
            TransactionTitle::TopUp,
            TransactionTitle::Withdraw,
        ] {
            let json = serde_json::to_string(&title).unwrap();
            assert_eq!(json, format!("\"{}\"", title.as_str()));
            assert_eq!(title.as_str().parse::<TransactionTitle>().unwrap(), title);
        }
    }
}
