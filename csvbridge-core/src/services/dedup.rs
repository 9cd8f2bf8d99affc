//! Deduplication service - drop lines the ledger already has
//!
//! A run takes the date window of the batch, asks the ledger for everything
//! recorded in that window and removes sub-transactions whose external id is
//! already known. Lines that end up empty are dropped.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::{DateWindow, Line, RemoteTransaction};
use crate::ports::{DedupEvent, DedupObserver, TransactionGateway};
use crate::services::date_range;
use crate::services::logging::TracingObserver;

/// External ids already present in the ledger
pub fn external_ids(existing: &[RemoteTransaction]) -> HashSet<String> {
    existing
        .iter()
        .filter_map(|tx| tx.dedup_key())
        .map(str::to_string)
        .collect()
}

/// Outcome of filtering one batch
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    /// Surviving lines, original order
    pub lines: Vec<Line>,
    /// Sub-transactions removed across all lines
    pub removed_transactions: usize,
}

/// Remove sub-transactions whose external id is in `known`
///
/// Entries without an external id are always kept. A line is kept when at
/// least one of its entries survives.
pub fn filter_duplicates(lines: &[Line], known: &HashSet<String>) -> FilterOutcome {
    let mut removed_transactions = 0;
    let mut kept = Vec::with_capacity(lines.len());

    for line in lines {
        let survivors: Vec<_> = line
            .transactions
            .iter()
            .filter(|tx| !tx.dedup_key().is_some_and(|id| known.contains(id)))
            .cloned()
            .collect();

        removed_transactions += line.transactions.len() - survivors.len();

        if !survivors.is_empty() {
            kept.push(line.with_transactions(survivors));
        }
    }

    FilterOutcome {
        lines: kept,
        removed_transactions,
    }
}

/// Summary of one deduplication run
#[derive(Debug, Clone, Serialize)]
pub struct DedupReport {
    pub window: DateWindow,
    pub dates_seen: usize,
    pub remote_transactions: usize,
    pub external_ids: usize,
    pub lines_in: usize,
    pub lines_out: usize,
    pub removed_transactions: usize,
    #[serde(skip)]
    pub lines: Vec<Line>,
}

impl DedupReport {
    pub fn lines_skipped(&self) -> usize {
        self.lines_in - self.lines_out
    }
}

/// Removes already-imported transactions from a batch
pub struct DuplicationRemover {
    gateway: Arc<dyn TransactionGateway>,
    observer: Arc<dyn DedupObserver>,
}

impl DuplicationRemover {
    /// Create a remover that reports through `tracing`
    pub fn new(gateway: Arc<dyn TransactionGateway>) -> Self {
        Self {
            gateway,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replace the progress observer
    pub fn with_observer(mut self, observer: Arc<dyn DedupObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Return the lines that still need importing
    ///
    /// Fails with `Error::Validation` before any request when the batch is
    /// empty or holds a bad date, and with `Error::Import` when the ledger
    /// cannot be read. Nothing is returned on failure.
    pub fn process_pseudo(&self, lines: &[Line]) -> Result<Vec<Line>> {
        self.run(lines).map(|report| report.lines)
    }

    /// Same as [`process_pseudo`](Self::process_pseudo), with run counts
    pub fn run(&self, lines: &[Line]) -> Result<DedupReport> {
        self.notify(DedupEvent::Started { lines: lines.len() });

        let (window, dates_seen) = date_range::extract_counted(lines)?;
        self.notify(DedupEvent::DatesCollected { count: dates_seen });
        self.notify(DedupEvent::WindowResolved { window });

        let existing = self
            .gateway
            .list_transactions_by_dates(window.start, window.end)?;
        self.notify(DedupEvent::TransactionsFetched {
            count: existing.len(),
            window,
        });

        let known = external_ids(&existing);
        self.notify(DedupEvent::ExternalIdsMapped { count: known.len() });

        let outcome = filter_duplicates(lines, &known);
        let report = DedupReport {
            window,
            dates_seen,
            remote_transactions: existing.len(),
            external_ids: known.len(),
            lines_in: lines.len(),
            lines_out: outcome.lines.len(),
            removed_transactions: outcome.removed_transactions,
            lines: outcome.lines,
        };

        self.notify(DedupEvent::Finished {
            lines: report.lines_in,
            skipped: report.lines_skipped(),
            removed_transactions: report.removed_transactions,
        });

        Ok(report)
    }

    fn notify(&self, event: DedupEvent) {
        self.observer.on_event(&event);
    }
}
