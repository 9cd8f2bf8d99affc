//! csvbridge core - keeps ledger imports free of duplicates
//!
//! Before a batch of parsed CSV lines is sent to the ledger, every
//! sub-transaction whose external id the ledger already knows is removed.
//! The crate follows hexagonal architecture:
//!
//! - **domain**: Lines, remote transactions, the date window, errors
//! - **ports**: Trait definitions for the ledger gateway and progress observer
//! - **services**: Date range extraction, duplicate filtering, run history
//! - **adapters**: Concrete implementations (Firefly III REST client)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use adapters::firefly::FireflyGateway;
use config::Config;
use ports::TransactionGateway;
use services::{DuplicationRemover, RunHistory, RunRecord};

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult, Result};
pub use domain::{DateWindow, Line, RemoteTransaction, SubTransaction};
pub use services::{extract_date_range, DedupReport};

/// Main context for csvbridge operations
///
/// Holds the loaded configuration and the run history. The ledger gateway is
/// built on demand so commands that never touch the network still work with
/// an incomplete configuration.
pub struct BridgeContext {
    pub config: Config,
    pub config_dir: PathBuf,
    /// `None` when history.duckdb could not be opened
    pub history: Option<RunHistory>,
}

impl BridgeContext {
    /// Create a new context from the csvbridge directory
    pub fn new(config_dir: &Path) -> anyhow::Result<Self> {
        let config = Config::load(config_dir)?;

        let history = match RunHistory::open(config_dir) {
            Ok(history) => Some(history),
            Err(e) => {
                tracing::warn!(error = %e, "Run history unavailable");
                None
            }
        };

        Ok(Self {
            config,
            config_dir: config_dir.to_path_buf(),
            history,
        })
    }

    /// Gateway for the configured ledger
    pub fn gateway(&self) -> Result<Arc<dyn TransactionGateway>> {
        Ok(Arc::new(FireflyGateway::new(&self.config.connection)?))
    }

    /// Deduplicate against the configured ledger and record the run
    pub fn deduplicate(&self, lines: &[Line]) -> Result<DedupReport> {
        let gateway = self.gateway()?;
        let name = gateway.name().to_string();
        let remover = DuplicationRemover::new(gateway);
        self.deduplicate_with(&remover, &name, lines)
    }

    /// Run `remover` over `lines` and record the outcome in history
    pub fn deduplicate_with(
        &self,
        remover: &DuplicationRemover,
        gateway_name: &str,
        lines: &[Line],
    ) -> Result<DedupReport> {
        let result = remover.run(lines);

        if let Some(history) = &self.history {
            let record = match &result {
                Ok(report) => RunRecord::completed(gateway_name, report),
                Err(e) => RunRecord::failed(
                    gateway_name,
                    lines.len(),
                    extract_date_range(lines).ok(),
                    e.to_string(),
                ),
            };
            // History is advisory; a write failure must not change the outcome
            if let Err(e) = history.record(&record) {
                tracing::warn!(error = %e, "Failed to record run history");
            }
        }

        result
    }
}
