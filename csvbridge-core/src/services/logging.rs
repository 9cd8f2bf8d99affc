//! Diagnostic logging via `tracing`

use std::sync::Once;

use crate::ports::{DedupEvent, DedupObserver};

static TRACING_INIT: Once = Once::new();

/// Install the global fmt subscriber
///
/// `RUST_LOG` takes precedence; otherwise `csvbridge_core` logs at `info`,
/// or `debug` when `verbose` is set. Safe to call more than once.
pub fn init_tracing(verbose: bool) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let level = if verbose { "debug" } else { "info" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("csvbridge_core={}", level)));

        // A host application may already own the global subscriber
        let _ = fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
    });
}

/// Observer writing each stage to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl DedupObserver for TracingObserver {
    fn on_event(&self, event: &DedupEvent) {
        match event {
            DedupEvent::Started { lines } => {
                tracing::info!(lines, "Deduplicating {} lines", lines);
            }
            DedupEvent::DatesCollected { count } => {
                tracing::debug!(count, "Collected transaction dates");
            }
            DedupEvent::WindowResolved { window } => {
                tracing::debug!(start = %window.start, end = %window.end, "Resolved date window");
            }
            DedupEvent::TransactionsFetched { count, window } => {
                tracing::debug!(
                    count,
                    start = %window.start,
                    end = %window.end,
                    "Found existing ledger transactions"
                );
            }
            DedupEvent::ExternalIdsMapped { count } => {
                tracing::debug!(count, "Mapped existing transactions to external ids");
            }
            DedupEvent::Finished {
                lines,
                skipped,
                removed_transactions,
            } => {
                tracing::info!(
                    lines,
                    skipped,
                    removed_transactions,
                    "Done deduplicating {} lines ({} skipped)",
                    lines,
                    skipped
                );
            }
        }
    }
}
