//! Remote ledger gateway port
//!
//! Defines the interface for reading transactions that already exist in the
//! remote ledger. The deduplication service depends only on this trait.

use chrono::NaiveDate;

use crate::domain::result::Result;
use crate::domain::RemoteTransaction;

/// Remote transaction gateway trait
///
/// Implementations hide authentication and pagination. Any transport or API
/// failure must come back as `Error::Import`; implementations never retry.
pub trait TransactionGateway: Send + Sync {
    /// Gateway name (e.g., "firefly")
    fn name(&self) -> &str;

    /// List every remote transaction dated within `[start, end]`
    ///
    /// Groups are flattened: page order first, then order within each group.
    /// No matches is an empty vector, not an error.
    fn list_transactions_by_dates(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RemoteTransaction>>;
}
