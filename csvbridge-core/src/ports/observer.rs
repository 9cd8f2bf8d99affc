//! Progress observer port
//!
//! The deduplication service reports what it is doing through this trait.
//! Observers are passive: they cannot fail the run or change its result.

use serde::Serialize;

use crate::domain::DateWindow;

/// Stage notifications emitted during one deduplication run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DedupEvent {
    Started { lines: usize },
    DatesCollected { count: usize },
    WindowResolved { window: DateWindow },
    TransactionsFetched { count: usize, window: DateWindow },
    ExternalIdsMapped { count: usize },
    Finished { lines: usize, skipped: usize, removed_transactions: usize },
}

/// Receives stage notifications
pub trait DedupObserver: Send + Sync {
    fn on_event(&self, event: &DedupEvent);
}
