//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Firefly III REST client for TransactionGateway
//! - In-process mock ledger server for tests

pub mod firefly;

#[cfg(test)]
pub mod firefly_mock;
