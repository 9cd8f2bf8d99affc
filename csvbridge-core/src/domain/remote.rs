//! Transactions already recorded in the remote ledger

use serde::{Deserialize, Serialize};

/// A transaction group as returned by the ledger API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionGroup {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub transactions: Vec<RemoteTransaction>,
}

/// A single transaction (journal) inside a remote group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteTransaction {
    #[serde(default, alias = "externalId")]
    pub external_id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub transaction_journal_id: Option<String>,
}

impl RemoteTransaction {
    pub fn with_external_id(external_id: impl Into<String>) -> Self {
        Self {
            external_id: Some(external_id.into()),
            ..Default::default()
        }
    }

    /// External id usable for matching; absent or blank ids never match
    pub fn dedup_key(&self) -> Option<&str> {
        self.external_id.as_deref().filter(|id| !id.is_empty())
    }
}
