//! Order state machine.
//!
//! ```text
//! NEW ──► PROCESS ──► DELIVER ──► ARRIVE ──► RECEIVE
//!  │
//!  └──► CANCEL
//! ```
//!
//! Every edge names the single predecessor it starts from and the party
//! allowed to fire it. There is no other way to change an order's status.

use serde::{Deserialize, Serialize};
use store::OrderStatus;

/// The side of an order an account acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Seller => "seller",
        }
    }
}

/// An edge of the order state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Process,
    Deliver,
    Arrive,
    Receive,
    /// Buyer-initiated NEW → CANCEL.
    Cancel,
    /// Seller-initiated NEW → CANCEL.
    Reject,
}

impl Transition {
    pub const ALL: [Transition; 6] = [
        Transition::Process,
        Transition::Deliver,
        Transition::Arrive,
        Transition::Receive,
        Transition::Cancel,
        Transition::Reject,
    ];

    /// The only status this transition may start from.
    pub fn from(&self) -> OrderStatus {
        match self {
            Transition::Process | Transition::Cancel | Transition::Reject => OrderStatus::New,
            Transition::Deliver => OrderStatus::Process,
            Transition::Arrive => OrderStatus::Deliver,
            Transition::Receive => OrderStatus::Arrive,
        }
    }

    pub fn to(&self) -> OrderStatus {
        match self {
            Transition::Process => OrderStatus::Process,
            Transition::Deliver => OrderStatus::Deliver,
            Transition::Arrive => OrderStatus::Arrive,
            Transition::Receive => OrderStatus::Receive,
            Transition::Cancel | Transition::Reject => OrderStatus::Cancel,
        }
    }

    /// The party allowed to fire this transition.
    pub fn role(&self) -> Role {
        match self {
            Transition::Receive | Transition::Cancel => Role::Buyer,
            Transition::Process | Transition::Deliver | Transition::Arrive | Transition::Reject => {
                Role::Seller
            }
        }
    }

    /// Maps a seller status request to its transition. Only PROCESS, DELIVER
    /// and ARRIVE can be requested this way.
    pub fn for_seller_status(status: OrderStatus) -> Option<Transition> {
        match status {
            OrderStatus::Process => Some(Transition::Process),
            OrderStatus::Deliver => Some(Transition::Deliver),
            OrderStatus::Arrive => Some(Transition::Arrive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Process => "process",
            Transition::Deliver => "deliver",
            Transition::Arrive => "arrive",
            Transition::Receive => "receive",
            Transition::Cancel => "cancel",
            Transition::Reject => "reject",
        }
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true if some transition leads from `from` to `to`.
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    Transition::ALL
        .iter()
        .any(|t| t.from() == from && t.to() == to)
}
