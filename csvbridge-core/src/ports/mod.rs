//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The deduplication
//! core depends only on these traits, not on concrete implementations.

mod observer;
mod transaction_gateway;

pub use observer::{DedupEvent, DedupObserver};
pub use transaction_gateway::TransactionGateway;
