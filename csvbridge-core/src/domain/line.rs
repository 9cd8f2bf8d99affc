//! Import line domain model
//!
//! A line is one record produced by the CSV mapping pipeline. Only the
//! `transactions` list and each entry's `date` / `external_id` are read here;
//! every other field is carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// One parsed import record holding one or more sub-transactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub transactions: Vec<SubTransaction>,
    /// Fields owned by the mapping pipeline (tags, batch flags, ...)
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Line {
    pub fn new(transactions: Vec<SubTransaction>) -> Self {
        Self {
            transactions,
            extra: Map::new(),
        }
    }

    /// Copy of this line carrying a different transaction list
    pub fn with_transactions(&self, transactions: Vec<SubTransaction>) -> Self {
        Self {
            transactions,
            extra: self.extra.clone(),
        }
    }
}

/// A single monetary entry within a line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTransaction {
    /// Date-time string as produced by the mapper
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl SubTransaction {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            external_id: None,
            extra: Map::new(),
        }
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    /// External id used for duplicate matching; blank ids count as unset
    pub fn dedup_key(&self) -> Option<&str> {
        self.external_id.as_deref().filter(|id| !id.is_empty())
    }
}
