//! Relational persistence for the marketplace wallet ledger and orders.
//!
//! The store exposes repository traits grouped into a [`UnitOfWork`], with a
//! PostgreSQL implementation for production and an in-memory one for tests.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod query;
pub mod repository;

pub use error::{Result, StoreError};
pub use memory::{InMemoryStore, InMemoryUnitOfWork};
pub use model::*;
pub use postgres::{PgUnitOfWork, PostgresStore};
pub use query::{HistoryQuery, OrderParty, OrderQuery, Pagination};
pub use repository::{
    CartRepository, CatalogRepository, MarketStore, OrderRepository, PromotionRepository,
    TransactionRepository, UnitOfWork, WalletRepository,
};
