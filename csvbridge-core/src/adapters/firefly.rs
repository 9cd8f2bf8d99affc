//! Firefly III API client
//!
//! Reads existing transactions from the ledger's `transactions` endpoint so
//! that re-imported lines can be recognised. Responses are paginated:
//!
//! ```json
//! {
//!   "data": [ { "id": "1", "attributes": { "transactions": [ ... ] } } ],
//!   "meta": { "pagination": { "current_page": 1, "total_pages": 3 } }
//! }
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;
use url::Url;

use crate::config::ConnectionSettings;
use crate::domain::result::{Error as DomainError, Result as DomainResult};
use crate::domain::window::DATE_FORMAT;
use crate::domain::{RemoteTransaction, TransactionGroup};
use crate::ports::TransactionGateway;

// =============================================================================
// API Response Models
// =============================================================================

/// One page of `GET /api/v1/transactions`
#[derive(Debug, Deserialize)]
struct TransactionsPage {
    #[serde(default)]
    data: Vec<TransactionGroupRecord>,
    #[serde(default)]
    meta: Option<PageMeta>,
}

#[derive(Debug, Deserialize)]
struct TransactionGroupRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    attributes: GroupAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct GroupAttributes {
    #[serde(default)]
    transactions: Vec<RemoteTransaction>,
}

#[derive(Debug, Deserialize)]
struct PageMeta {
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct Pagination {
    current_page: u32,
    total_pages: u32,
}

impl From<TransactionGroupRecord> for TransactionGroup {
    fn from(record: TransactionGroupRecord) -> Self {
        Self {
            id: record.id,
            transactions: record.attributes.transactions,
        }
    }
}

// =============================================================================
// Firefly HTTP Client
// =============================================================================

/// Firefly III API client
#[derive(Debug)]
pub struct FireflyClient {
    client: Client,
    api_base: Url,
    access_token: String,
    timeout_secs: f64,
}

impl FireflyClient {
    /// Create a client from explicit connection settings
    pub fn new(settings: &ConnectionSettings) -> Result<Self> {
        settings.validate()?;

        let mut base = settings.base_url.trim().trim_end_matches('/').to_string();
        base.push_str("/api/v1/");
        let api_base = Url::parse(&base).context("Invalid ledger URL")?;

        let client = Client::builder()
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(!settings.verify)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_base,
            access_token: settings.access_token.clone(),
            timeout_secs: settings.timeout.as_secs_f64(),
        })
    }

    /// Build `transactions?start=..&end=..&page=..`
    fn transactions_url(&self, start: NaiveDate, end: NaiveDate, page: u32) -> Result<Url> {
        let mut url = self
            .api_base
            .join("transactions")
            .context("Failed to build transactions URL")?;
        url.query_pairs_mut()
            .append_pair("start", &start.format(DATE_FORMAT).to_string())
            .append_pair("end", &end.format(DATE_FORMAT).to_string())
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    /// Fetch every transaction group dated within `[start, end]`
    ///
    /// Pages are requested one after another until the last page reported by
    /// the pagination block has been read. Each page is requested once; a
    /// server echoing a different page number than the one asked for ends
    /// the walk.
    pub fn get_transaction_groups(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TransactionGroup>> {
        let mut groups = Vec::new();
        let mut page: u32 = 1;

        loop {
            let result = self.fetch_page(start, end, page)?;
            let pagination = result.meta.and_then(|m| m.pagination);
            let received = result.data.len();

            groups.extend(result.data.into_iter().map(TransactionGroup::from));

            match pagination {
                Some(p) if received > 0 && p.current_page == page && page < p.total_pages => {
                    page += 1
                }
                Some(p) if p.current_page != page => {
                    tracing::warn!(
                        requested = page,
                        reported = p.current_page,
                        total_pages = p.total_pages,
                        "Ledger reported an unexpected page, stopping pagination"
                    );
                    break;
                }
                _ => break,
            }
        }

        Ok(groups)
    }

    /// Fetch transactions and flatten their groups
    pub fn get_transactions(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<RemoteTransaction>> {
        let groups = self.get_transaction_groups(start, end)?;
        Ok(groups.into_iter().flat_map(|g| g.transactions).collect())
    }

    fn fetch_page(&self, start: NaiveDate, end: NaiveDate, page: u32) -> Result<TransactionsPage> {
        let url = self.transactions_url(start, end, page)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|e| self.map_request_error(e))?;

        self.check_response_status(&response)?;

        response
            .json::<TransactionsPage>()
            .with_context(|| format!("Failed to parse ledger transactions response (page {})", page))
    }

    /// Map request errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> anyhow::Error {
        if error.is_timeout() {
            anyhow::anyhow!("Connection timed out after {} seconds", self.timeout_secs)
        } else if error.is_connect() {
            anyhow::anyhow!("Unable to connect to the ledger at {}", self.api_base)
        } else {
            anyhow::anyhow!("Ledger request failed: {}", error)
        }
    }

    /// Check response status and return appropriate errors
    fn check_response_status(&self, response: &reqwest::blocking::Response) -> Result<()> {
        match response.status().as_u16() {
            200 => Ok(()),
            401 => anyhow::bail!(
                "Ledger authentication failed. Your access token may be invalid or expired."
            ),
            403 => anyhow::bail!("Ledger access denied. Check the access token's permissions."),
            404 => anyhow::bail!("Ledger transactions endpoint not found. Check the ledger URL."),
            429 => anyhow::bail!("Ledger rate limit exceeded. Please wait a moment and try again."),
            status => anyhow::bail!("Ledger API error: HTTP {}", status),
        }
    }
}

// =============================================================================
// FireflyGateway - implements TransactionGateway
// =============================================================================

/// Transaction gateway backed by the Firefly III REST API
#[derive(Debug)]
pub struct FireflyGateway {
    client: FireflyClient,
}

impl FireflyGateway {
    pub fn new(settings: &ConnectionSettings) -> DomainResult<Self> {
        let client = FireflyClient::new(settings).map_err(|e| match e.downcast::<DomainError>() {
            Ok(domain) => domain,
            Err(other) => DomainError::Config(other.to_string()),
        })?;
        Ok(Self { client })
    }
}

impl TransactionGateway for FireflyGateway {
    fn name(&self) -> &str {
        "firefly"
    }

    fn list_transactions_by_dates(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DomainResult<Vec<RemoteTransaction>> {
        tracing::debug!(
            start = %start.format(DATE_FORMAT),
            end = %end.format(DATE_FORMAT),
            "Listing ledger transactions"
        );

        self.client
            .get_transactions(start, end)
            .map_err(|e| DomainError::Import(format!("{:#}", e)))
    }
}
