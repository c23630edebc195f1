use serde::{Deserialize, Serialize};

/// Declares a typed identifier over a database `BIGSERIAL` key.
///
/// Each identifier is a distinct type so a wallet id can never be passed
/// where an order id is expected.
macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw database key.
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw database key.
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

row_id!(
    /// A marketplace account. Buyers and sellers are both accounts.
    AccountId
);
row_id!(
    /// A wallet row. Wallets are locked in ascending `WalletId` order.
    WalletId
);
row_id!(
    /// A ledger entry.
    TransactionId
);
row_id!(OrderId);
row_id!(OrderDetailId);
row_id!(ShopId);
row_id!(ProductId);
row_id!(VariantId);
row_id!(CartId);
row_id!(PromotionId);
row_id!(AddressId);
row_id!(DistrictId);
row_id!(
    /// A courier service enabled for a particular shop.
    ShopCourierId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_preserve_raw_value() {
        let id = WalletId::new(42);
        assert_eq!(id.as_i64(), 42);
        assert_eq!(i64::from(id), 42);
        assert_eq!(WalletId::from(42), id);
    }

    #[test]
    fn ids_order_by_raw_value() {
        let mut ids = vec![WalletId::new(9), WalletId::new(2), WalletId::new(5)];
        ids.sort();
        assert_eq!(ids, vec![WalletId::new(2), WalletId::new(5), WalletId::new(9)]);
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&OrderId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, OrderId::new(7));
    }

    #[test]
    fn display_prints_raw_value() {
        assert_eq!(AccountId::new(13).to_string(), "13");
    }
}
