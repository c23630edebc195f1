use chrono::{DateTime, Utc};
use common::{AccountId, WalletId};

use crate::model::{OrderStatus, TransactionTitle};

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    /// Creates a page request. Page numbers below 1 are treated as page 1.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page,
        }
    }

    /// Rows to skip before this page.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.per_page as usize
    }

    pub fn limit(&self) -> usize {
        self.per_page as usize
    }

    /// Number of pages needed to show `total` rows.
    pub fn total_pages(&self, total: u64) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        total.div_ceil(self.per_page as u64) as u32
    }
}

/// Builder for a wallet's transaction history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub wallet_id: WalletId,

    /// Only entries created at or after this timestamp.
    pub from_timestamp: Option<DateTime<Utc>>,

    /// Only entries created at or before this timestamp.
    pub to_timestamp: Option<DateTime<Utc>>,

    /// Only entries with one of these titles.
    pub titles: Option<Vec<TransactionTitle>>,

    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl HistoryQuery {
    pub fn for_wallet(wallet_id: WalletId) -> Self {
        Self {
            wallet_id,
            from_timestamp: None,
            to_timestamp: None,
            titles: None,
            limit: None,
            offset: None,
        }
    }

    pub fn from_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.from_timestamp = Some(timestamp);
        self
    }

    pub fn to_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.to_timestamp = Some(timestamp);
        self
    }

    pub fn titles(mut self, titles: Vec<TransactionTitle>) -> Self {
        self.titles = Some(titles);
        self
    }

    /// Applies a page window.
    pub fn page(mut self, page: Pagination) -> Self {
        self.limit = Some(page.limit());
        self.offset = Some(page.offset());
        self
    }

    /// Returns true if an entry with this title and timestamp passes the filters.
    pub fn accepts(&self, title: TransactionTitle, created_at: DateTime<Utc>) -> bool {
        if let Some(from) = self.from_timestamp
            && created_at < from
        {
            return false;
        }
        if let Some(to) = self.to_timestamp
            && created_at > to
        {
            return false;
        }
        if let Some(ref titles) = self.titles
            && !titles.contains(&title)
        {
            return false;
        }
        true
    }
}

/// Which side of an order an account is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderParty {
    Buyer(AccountId),
    Seller(AccountId),
}

/// Builder for order listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    pub party: OrderParty,
    pub status: Option<OrderStatus>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl OrderQuery {
    pub fn for_buyer(buyer_id: AccountId) -> Self {
        Self {
            party: OrderParty::Buyer(buyer_id),
            status: None,
            limit: None,
            offset: None,
        }
    }

    pub fn for_seller(seller_id: AccountId) -> Self {
        Self {
            party: OrderParty::Seller(seller_id),
            status: None,
            limit: None,
            offset: None,
        }
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn page(mut self, page: Pagination) -> Self {
        self.limit = Some(page.limit());
        self.offset = Some(page.offset());
        self
    }
}
