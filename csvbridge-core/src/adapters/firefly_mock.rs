//! Mock ledger API server for testing
//!
//! Serves `GET /api/v1/transactions` with the same paginated envelope as the
//! real API, so the HTTP gateway can be exercised without a ledger instance.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use serde::Serialize;

/// Mock ledger server for testing
pub struct MockLedgerServer {
    port: u16,
    running: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<String>>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Configuration for the mock ledger
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// External ids per transaction group, in response order
    pub groups: Vec<Vec<Option<String>>>,
    /// Groups per page
    pub per_page: usize,
    /// Reject every request with 401
    pub fail_auth: bool,
    /// Answer every request with this status and an error body
    pub status_override: Option<u16>,
    /// Answer with a body that is not the expected JSON
    pub malformed_body: bool,
    /// Delay in milliseconds before responding
    pub delay_ms: u64,
    /// Report this as `current_page` whatever page was requested
    pub pinned_current_page: Option<usize>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            groups: generated_groups(3, 2),
            per_page: 50,
            fail_auth: false,
            status_override: None,
            malformed_body: false,
            delay_ms: 0,
            pinned_current_page: None,
        }
    }
}

/// Build `count` groups of `per_group` transactions with ids `ext_<g>_<t>`
pub fn generated_groups(count: usize, per_group: usize) -> Vec<Vec<Option<String>>> {
    (0..count)
        .map(|g| (0..per_group).map(|t| Some(format!("ext_{}_{}", g + 1, t + 1))).collect())
        .collect()
}

#[derive(Serialize)]
struct PageResponse {
    data: Vec<MockGroup>,
    meta: MockMeta,
}

#[derive(Serialize)]
struct MockGroup {
    #[serde(rename = "type")]
    kind: &'static str,
    id: String,
    attributes: MockAttributes,
}

#[derive(Serialize)]
struct MockAttributes {
    transactions: Vec<MockTransaction>,
}

#[derive(Serialize)]
struct MockTransaction {
    transaction_journal_id: String,
    date: String,
    amount: String,
    description: String,
    external_id: Option<String>,
}

#[derive(Serialize)]
struct MockMeta {
    pagination: MockPagination,
}

#[derive(Serialize)]
struct MockPagination {
    total: usize,
    count: usize,
    per_page: usize,
    current_page: usize,
    total_pages: usize,
}

impl MockLedgerServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let requests_clone = requests.clone();
        let config = Arc::new(config);

        // Non-blocking so stop() can end the accept loop
        listener.set_nonblocking(true)?;

        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let cfg = config.clone();
                        let log = requests_clone.clone();
                        thread::spawn(move || {
                            handle_connection(stream, &cfg, &log);
                        });
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(10));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            requests,
            thread_handle: Some(thread_handle),
        })
    }

    /// Get the base URL for this mock server
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Request targets received so far (path and query)
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockLedgerServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn handle_connection(mut stream: TcpStream, config: &MockConfig, log: &Mutex<Vec<String>>) {
    // Accepted sockets may inherit non-blocking mode
    let _ = stream.set_nonblocking(false);
    let mut buffer = [0; 4096];

    let Ok(n) = stream.read(&mut buffer) else {
        return;
    };
    let request = String::from_utf8_lossy(&buffer[..n]);

    if config.delay_ms > 0 {
        thread::sleep(std::time::Duration::from_millis(config.delay_ms));
    }

    let first_line = request.lines().next().unwrap_or("");
    let parts: Vec<&str> = first_line.split_whitespace().collect();
    if parts.len() < 2 {
        send_response(&mut stream, 400, "Bad Request", r#"{"message": "Invalid request"}"#);
        return;
    }

    let (method, target) = (parts[0], parts[1]);
    if let Ok(mut entries) = log.lock() {
        entries.push(target.to_string());
    }

    let has_valid_auth = request.to_lowercase().contains("authorization: bearer test_");
    if config.fail_auth || !has_valid_auth {
        send_response(&mut stream, 401, "Unauthorized", r#"{"message": "Unauthenticated."}"#);
        return;
    }

    if let Some(status) = config.status_override {
        send_response(&mut stream, status, "Error", r#"{"message": "Simulated failure"}"#);
        return;
    }

    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    if method != "GET" {
        send_response(&mut stream, 405, "Method Not Allowed", r#"{"message": "Method not allowed"}"#);
        return;
    }
    if path != "/api/v1/transactions" {
        send_response(&mut stream, 404, "Not Found", r#"{"message": "Resource not found"}"#);
        return;
    }

    if config.malformed_body {
        send_response(&mut stream, 200, "OK", "<html>maintenance</html>");
        return;
    }

    let page = query_param(query, "page")
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);
    let date = query_param(query, "start").unwrap_or("2020-01-01").to_string();

    let body = build_page(config, page, &date);
    match serde_json::to_string(&body) {
        Ok(json) => send_response(&mut stream, 200, "OK", &json),
        Err(_) => send_response(&mut stream, 500, "Internal Server Error", "{}"),
    }
}

fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn build_page(config: &MockConfig, page: usize, date: &str) -> PageResponse {
    let per_page = config.per_page.max(1);
    let total = config.groups.len();
    let total_pages = total.div_ceil(per_page).max(1);

    let data: Vec<MockGroup> = config
        .groups
        .iter()
        .enumerate()
        .skip((page - 1) * per_page)
        .take(per_page)
        .map(|(g, ids)| MockGroup {
            kind: "transactions",
            id: (g + 1).to_string(),
            attributes: MockAttributes {
                transactions: ids
                    .iter()
                    .enumerate()
                    .map(|(t, external_id)| MockTransaction {
                        transaction_journal_id: format!("{}{:02}", g + 1, t + 1),
                        date: format!("{}T00:00:00+00:00", date),
                        amount: "10.00".to_string(),
                        description: format!("Mock transaction {}.{}", g + 1, t + 1),
                        external_id: external_id.clone(),
                    })
                    .collect(),
            },
        })
        .collect();

    PageResponse {
        meta: MockMeta {
            pagination: MockPagination {
                total,
                count: data.len(),
                per_page,
                current_page: config.pinned_current_page.unwrap_or(page),
                total_pages,
            },
        },
        data,
    }
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::NaiveDate;

    use crate::adapters::firefly::{FireflyClient, FireflyGateway};
    use crate::config::ConnectionSettings;
    use crate::domain::result::Error;
    use crate::ports::TransactionGateway;

    fn settings(server: &MockLedgerServer, token: &str) -> ConnectionSettings {
        ConnectionSettings::new(server.base_url(), token).with_timeout(Duration::from_secs(5))
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_single_page() {
        let server = MockLedgerServer::start(MockConfig::default()).unwrap();
        let client = FireflyClient::new(&settings(&server, "test_token")).unwrap();

        let txs = client.get_transactions(ymd(2020, 1, 5), ymd(2020, 1, 5)).unwrap();

        assert_eq!(txs.len(), 6);
        assert_eq!(txs[0].external_id.as_deref(), Some("ext_1_1"));
        assert_eq!(txs[5].external_id.as_deref(), Some("ext_3_2"));
        assert_eq!(server.requests().len(), 1);
        assert!(server.requests()[0].contains("start=2020-01-05&end=2020-01-05"));
    }

    #[test]
    fn test_all_pages_are_drained_in_order() {
        let server = MockLedgerServer::start(MockConfig {
            groups: generated_groups(5, 2),
            per_page: 2,
            ..Default::default()
        })
        .unwrap();
        let client = FireflyClient::new(&settings(&server, "test_token")).unwrap();

        let txs = client.get_transactions(ymd(2020, 1, 1), ymd(2020, 1, 10)).unwrap();

        let ids: Vec<&str> = txs.iter().filter_map(|t| t.external_id.as_deref()).collect();
        assert_eq!(ids.len(), 10);
        assert_eq!(ids.first(), Some(&"ext_1_1"));
        assert_eq!(ids.last(), Some(&"ext_5_2"));

        let pages: Vec<String> = server.requests();
        assert_eq!(pages.len(), 3);
        assert!(pages[2].ends_with("page=3"));
    }

    #[test]
    fn test_stale_current_page_does_not_repeat_requests() {
        let server = MockLedgerServer::start(MockConfig {
            groups: generated_groups(6, 1),
            per_page: 2,
            pinned_current_page: Some(1),
            ..Default::default()
        })
        .unwrap();
        let client = FireflyClient::new(&settings(&server, "test_token")).unwrap();

        let txs = client.get_transactions(ymd(2020, 1, 1), ymd(2020, 1, 10)).unwrap();

        // Page 1 is honest; page 2 claims to be page 1 and ends the walk
        let pages = server.requests();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].ends_with("page=1"));
        assert!(pages[1].ends_with("page=2"));
        let ids: Vec<&str> = txs.iter().filter_map(|t| t.external_id.as_deref()).collect();
        assert_eq!(ids, vec!["ext_1_1", "ext_2_1", "ext_3_1", "ext_4_1"]);
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let server = MockLedgerServer::start(MockConfig {
            groups: Vec::new(),
            ..Default::default()
        })
        .unwrap();
        let gateway = FireflyGateway::new(&settings(&server, "test_token")).unwrap();

        let txs = gateway
            .list_transactions_by_dates(ymd(2020, 1, 1), ymd(2020, 1, 1))
            .unwrap();
        assert!(txs.is_empty());
    }

    #[test]
    fn test_auth_failure_becomes_import_error() {
        let server = MockLedgerServer::start(MockConfig::default()).unwrap();
        let gateway = FireflyGateway::new(&settings(&server, "wrong_token")).unwrap();

        let err = gateway
            .list_transactions_by_dates(ymd(2020, 1, 1), ymd(2020, 1, 1))
            .unwrap_err();
        match err {
            Error::Import(msg) => assert!(msg.contains("authentication"), "got: {}", msg),
            other => panic!("expected import error, got {:?}", other),
        }
    }

    #[test]
    fn test_server_error_becomes_import_error() {
        let server = MockLedgerServer::start(MockConfig {
            status_override: Some(500),
            ..Default::default()
        })
        .unwrap();
        let gateway = FireflyGateway::new(&settings(&server, "test_token")).unwrap();

        let err = gateway
            .list_transactions_by_dates(ymd(2020, 1, 1), ymd(2020, 1, 1))
            .unwrap_err();
        assert!(matches!(err, Error::Import(ref msg) if msg.contains("HTTP 500")));
    }

    #[test]
    fn test_malformed_body_becomes_import_error() {
        let server = MockLedgerServer::start(MockConfig {
            malformed_body: true,
            ..Default::default()
        })
        .unwrap();
        let gateway = FireflyGateway::new(&settings(&server, "test_token")).unwrap();

        let err = gateway
            .list_transactions_by_dates(ymd(2020, 1, 1), ymd(2020, 1, 1))
            .unwrap_err();
        assert!(matches!(err, Error::Import(ref msg) if msg.contains("Failed to parse")));
    }

    #[test]
    fn test_timeout_becomes_import_error() {
        let server = MockLedgerServer::start(MockConfig {
            delay_ms: 1500,
            ..Default::default()
        })
        .unwrap();
        let settings = ConnectionSettings::new(server.base_url(), "test_token")
            .with_timeout(Duration::from_millis(200));
        let gateway = FireflyGateway::new(&settings).unwrap();

        let err = gateway
            .list_transactions_by_dates(ymd(2020, 1, 1), ymd(2020, 1, 1))
            .unwrap_err();
        assert!(matches!(err, Error::Import(ref msg) if msg.contains("timed out")));
    }
}
