use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use store::{HistoryEntry, TransactionTitle};

/// Entries shown per history page.
pub const HISTORY_PAGE_SIZE: u32 = 10;

/// Which kinds of entries a history listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    #[default]
    All,
    Topup,
    Payment,
    Refund,
}

impl HistoryKind {
    /// Titles matched by this kind; `None` matches every title.
    pub fn titles(&self) -> Option<Vec<TransactionTitle>> {
        match self {
            HistoryKind::All => None,
            HistoryKind::Topup => Some(vec![TransactionTitle::TopUp]),
            HistoryKind::Payment => Some(vec![TransactionTitle::PaymentOrder]),
            HistoryKind::Refund => Some(vec![TransactionTitle::RefundOrder]),
        }
    }
}

impl std::str::FromStr for HistoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(HistoryKind::All),
            "topup" => Ok(HistoryKind::Topup),
            "payment" => Ok(HistoryKind::Payment),
            "refund" => Ok(HistoryKind::Refund),
            other => Err(format!("unknown history kind {other:?}")),
        }
    }
}

/// A request for one page of a personal wallet's history.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryRequest {
    /// Inclusive lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub to: Option<DateTime<Utc>>,
    pub kind: HistoryKind,
    /// 1-based page number.
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryPage {
    pub entries: Vec<HistoryEntry>,
    pub page: u32,
    pub total_pages: u32,
}
