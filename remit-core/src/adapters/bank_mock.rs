//! Mock banking API server for testing
//!
//! In-process HTTP server that behaves like the banking backend:
//! - GET /api/v1/accounts/{id} returns the account
//! - GET /api/v1/accounts/{id}/balance returns a bare number
//! - GET /api/v1/accounts/{id}/transactions returns the transaction log
//! - POST /api/v1/transfers moves money, deduplicating on idempotencyKey
//!
//! Every endpoint requires `Authorization: Basic <base64 alice:secret>`.
//! Transfers can be made to fail in transit, before or after the backend
//! applied them, or to answer slower than the client timeout, to exercise
//! retry behaviour.

use std::collections::{BTreeMap, HashSet};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{Duration, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{
    Account, AccountStatus, ErrorResponse, TransactionLog, TransactionStatus, TransferRequest,
    TransferResponse,
};
use crate::services::interceptor::encode_credential;

pub const MOCK_USERNAME: &str = "alice";
pub const MOCK_PASSWORD: &str = "secret";

const API_PREFIX: &str = "/api/v1";

/// Mock banking server for testing
pub struct MockBankServer {
    port: u16,
    running: Arc<AtomicBool>,
    state: Arc<MockState>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Failure injection for the mock server
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Transfers applied by the bank whose response is then dropped
    pub lost_responses: usize,
    /// Transfers whose connection is dropped before the bank sees them
    pub refused_transfers: usize,
    /// Transfers applied by the bank and answered only after `delay_ms`
    pub slow_transfers: usize,
    /// Delay in milliseconds before answering a slow transfer
    pub delay_ms: u64,
}

struct MockState {
    bank: Mutex<Bank>,
    credential: String,
    lost_responses: AtomicUsize,
    refused_transfers: AtomicUsize,
    slow_transfers: AtomicUsize,
    transfer_posts: AtomicUsize,
    delay_ms: u64,
}

struct Bank {
    accounts: BTreeMap<i64, Account>,
    transactions: Vec<TransactionLog>,
    keys: HashSet<String>,
    clock: NaiveDateTime,
}

impl Bank {
    fn seeded() -> Self {
        let mut accounts = BTreeMap::new();
        accounts.insert(1, Account::new(1, "Alice Johnson", Decimal::new(1000, 0)));
        accounts.insert(2, Account::new(2, "Bob Smith", Decimal::new(500, 0)));
        let mut locked = Account::new(3, "Carol White", Decimal::new(250, 0));
        locked.status = AccountStatus::Locked;
        accounts.insert(3, locked);

        Self {
            accounts,
            transactions: Vec::new(),
            keys: HashSet::new(),
            clock: Utc::now().naive_utc(),
        }
    }

    /// Strictly increasing creation times so ordering is deterministic
    fn tick(&mut self) -> NaiveDateTime {
        self.clock += Duration::seconds(1);
        self.clock
    }

    fn record(&mut self, request: &TransferRequest, failure: Option<&str>) -> TransactionLog {
        let created_on = self.tick();
        let entry = TransactionLog {
            id: Uuid::new_v4().to_string(),
            from_account_id: request.from_account_id,
            to_account_id: request.to_account_id,
            amount: request.amount,
            status: if failure.is_some() {
                TransactionStatus::Failed
            } else {
                TransactionStatus::Success
            },
            failure_reason: failure.map(str::to_string),
            idempotency_key: request.idempotency_key.clone(),
            created_on,
        };
        self.keys.insert(request.idempotency_key.clone());
        self.transactions.push(entry.clone());
        entry
    }

    fn transfer(&mut self, request: &TransferRequest) -> Reply {
        if self.keys.contains(&request.idempotency_key) {
            return Reply::error(
                409,
                "TRX-409",
                format!(
                    "Duplicate transfer detected with idempotency key: {}",
                    request.idempotency_key
                ),
            );
        }

        match self.apply(request) {
            Ok(()) => {
                let entry = self.record(request, None);
                Reply::json(
                    200,
                    &TransferResponse {
                        transaction_id: Uuid::parse_str(&entry.id).unwrap_or_else(|_| Uuid::nil()),
                        status: "SUCCESS".to_string(),
                        message: "Transfer completed successfully".to_string(),
                        debited_from: request.from_account_id,
                        credited_to: request.to_account_id,
                        amount: request.amount,
                    },
                )
            }
            Err((status, code, message)) => {
                self.record(request, Some(&message));
                Reply::error(status, code, message)
            }
        }
    }

    fn apply(&mut self, request: &TransferRequest) -> Result<(), (u16, &'static str, String)> {
        if request.from_account_id == request.to_account_id {
            return Err((422, "VAL-422", "Cannot transfer to the same account".to_string()));
        }
        if request.amount <= Decimal::ZERO {
            return Err((
                422,
                "VAL-422",
                "Transfer amount must be greater than zero".to_string(),
            ));
        }

        for id in [request.from_account_id, request.to_account_id] {
            match self.accounts.get(&id) {
                None => {
                    return Err((404, "ACC-404", format!("Account not found with ID: {}", id)))
                }
                Some(account) if !account.is_active() => {
                    return Err((
                        403,
                        "ACC-403",
                        format!(
                            "Account {} is not active. Account status: {}",
                            id,
                            account.status.as_str()
                        ),
                    ))
                }
                Some(_) => {}
            }
        }

        let available = self.accounts[&request.from_account_id].balance;
        if available < request.amount {
            return Err((
                400,
                "TRX-400",
                format!(
                    "Insufficient balance. Available: {}, Required: {}",
                    available, request.amount
                ),
            ));
        }

        if let Some(from) = self.accounts.get_mut(&request.from_account_id) {
            from.balance -= request.amount;
        }
        if let Some(to) = self.accounts.get_mut(&request.to_account_id) {
            to.balance += request.amount;
        }
        Ok(())
    }
}

struct Reply {
    status: u16,
    body: String,
}

impl Reply {
    fn json<T: serde::Serialize>(status: u16, value: &T) -> Self {
        Self {
            status,
            body: serde_json::to_string(value).unwrap_or_default(),
        }
    }

    fn error(status: u16, code: &str, message: String) -> Self {
        Self::json(
            status,
            &ErrorResponse {
                error_code: code.to_string(),
                message,
                timestamp: Some(Utc::now().naive_utc().to_string()),
            },
        )
    }
}

impl MockBankServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();
        let state = Arc::new(MockState {
            bank: Mutex::new(Bank::seeded()),
            credential: encode_credential(MOCK_USERNAME, MOCK_PASSWORD),
            lost_responses: AtomicUsize::new(config.lost_responses),
            refused_transfers: AtomicUsize::new(config.refused_transfers),
            slow_transfers: AtomicUsize::new(config.slow_transfers),
            transfer_posts: AtomicUsize::new(0),
            delay_ms: config.delay_ms,
        });
        let state_clone = state.clone();

        // Set listener to non-blocking for graceful shutdown
        listener.set_nonblocking(true)?;

        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let state = state_clone.clone();
                        thread::spawn(move || {
                            handle_connection(stream, &state);
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
            state,
            thread_handle: Some(thread_handle),
        })
    }

    /// Base URL including the API prefix
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}{}", self.port, API_PREFIX)
    }

    /// Seed a historical transaction
    pub fn add_transaction(&self, entry: TransactionLog) {
        if let Ok(mut bank) = self.state.bank.lock() {
            bank.keys.insert(entry.idempotency_key.clone());
            bank.transactions.push(entry);
        }
    }

    /// Transactions recorded under an idempotency key
    pub fn transactions_with_key(&self, key: &str) -> Vec<TransactionLog> {
        self.state
            .bank
            .lock()
            .map(|bank| {
                bank.transactions
                    .iter()
                    .filter(|t| t.idempotency_key == key)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn balance_of(&self, account_id: i64) -> Option<Decimal> {
        self.state
            .bank
            .lock()
            .ok()
            .and_then(|bank| bank.accounts.get(&account_id).map(|a| a.balance))
    }

    /// Number of POST /transfers requests received, including dropped ones
    pub fn transfer_posts(&self) -> usize {
        self.state.transfer_posts.load(Ordering::SeqCst)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockBankServer {
    fn drop(&mut self) {
        self.stop();
    }
}

struct RawRequest {
    method: String,
    path: String,
    authorization: Option<String>,
    body: Vec<u8>,
}

fn read_request(stream: &TcpStream) -> Option<RawRequest> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut content_length = 0usize;
    let mut authorization = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).ok()? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse().unwrap_or(0);
            } else if name.eq_ignore_ascii_case("authorization") {
                authorization = Some(value.to_string());
            }
        }
    }

    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).ok()?;

    Some(RawRequest {
        method,
        path,
        authorization,
        body,
    })
}

fn handle_connection(mut stream: TcpStream, state: &MockState) {
    let _ = stream.set_nonblocking(false);
    let Some(request) = read_request(&stream) else {
        return;
    };

    let expected = format!("Basic {}", state.credential);
    if request.authorization.as_deref() != Some(expected.as_str()) {
        send_response(&mut stream, 401, "");
        return;
    }

    let path = request.path.split('?').next().unwrap_or("");
    let Some(route) = path.strip_prefix(API_PREFIX) else {
        send_response(&mut stream, 404, "");
        return;
    };
    let segments: Vec<&str> = route.trim_matches('/').split('/').collect();

    let reply = match (request.method.as_str(), segments.as_slice()) {
        ("GET", ["accounts", id]) => with_account(state, id, |account, _| {
            Reply::json(200, account)
        }),
        ("GET", ["accounts", id, "balance"]) => with_account(state, id, |account, _| {
            Reply::json(200, &account.balance)
        }),
        ("GET", ["accounts", id, "transactions"]) => with_account(state, id, |account, bank| {
            let entries: Vec<&TransactionLog> = bank
                .transactions
                .iter()
                .filter(|t| t.from_account_id == account.id || t.to_account_id == account.id)
                .collect();
            Reply::json(200, &entries)
        }),
        ("POST", ["transfers"]) => {
            state.transfer_posts.fetch_add(1, Ordering::SeqCst);
            if take_one(&state.refused_transfers) {
                let _ = stream.shutdown(Shutdown::Both);
                return;
            }

            let transfer: TransferRequest = match serde_json::from_slice(&request.body) {
                Ok(t) => t,
                Err(e) => {
                    let fields = BTreeMap::from([("body".to_string(), e.to_string())]);
                    send_reply(&mut stream, Reply::json(422, &fields));
                    return;
                }
            };

            let reply = match state.bank.lock() {
                Ok(mut bank) => bank.transfer(&transfer),
                Err(_) => Reply::error(500, "SYS-500", "state poisoned".to_string()),
            };

            if take_one(&state.lost_responses) {
                let _ = stream.shutdown(Shutdown::Both);
                return;
            }
            if take_one(&state.slow_transfers) {
                thread::sleep(std::time::Duration::from_millis(state.delay_ms));
            }
            reply
        }
        _ => Reply::error(404, "SYS-404", "Endpoint not found".to_string()),
    };

    send_reply(&mut stream, reply);
}

fn with_account(state: &MockState, id: &str, f: impl FnOnce(&Account, &Bank) -> Reply) -> Reply {
    let Ok(id) = id.parse::<i64>() else {
        return Reply::error(422, "VAL-422", format!("Invalid account id: {}", id));
    };
    let Ok(bank) = state.bank.lock() else {
        return Reply::error(500, "SYS-500", "state poisoned".to_string());
    };
    match bank.accounts.get(&id) {
        Some(account) => f(account, &bank),
        None => Reply::error(404, "ACC-404", format!("Account not found with ID: {}", id)),
    }
}

/// Decrement a failure budget, returning whether one was consumed
fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

fn send_reply(stream: &mut TcpStream, reply: Reply) {
    send_response(stream, reply.status, &reply.body);
}

fn send_response(stream: &mut TcpStream, status: u16, body: &str) {
    let status_text = match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        _ => "Internal Server Error",
    };
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
    use crate::adapters::{FileStorage, HttpTransport, MemoryStorage};
    use crate::domain::result::{AuthError, TransferError};
    use crate::ports::{SessionStorage, Transport};
    use crate::services::{AccountService, ApiClient, SessionService, TransferService};
    use tempfile::tempdir;

    struct Client {
        session: SessionService,
        accounts: AccountService,
        transfers: TransferService,
    }

    fn client(server: &MockBankServer, storage: Arc<dyn SessionStorage>, retries: u32) -> Client {
        client_with_timeout(server, storage, retries, 5)
    }

    fn client_with_timeout(
        server: &MockBankServer,
        storage: Arc<dyn SessionStorage>,
        retries: u32,
        timeout_secs: u64,
    ) -> Client {
        let transport: Arc<dyn Transport> = Arc::new(
            HttpTransport::new(
                &server.base_url(),
                std::time::Duration::from_secs(timeout_secs),
            )
            .unwrap(),
        );
        let api = Arc::new(ApiClient::new(transport.clone(), storage.clone()));
        Client {
            session: SessionService::new(storage, transport, 1),
            accounts: AccountService::new(api.clone()),
            transfers: TransferService::new(api, retries),
        }
    }

    fn logged_in(server: &MockBankServer, retries: u32) -> Client {
        logged_in_with_timeout(server, retries, 5)
    }

    fn logged_in_with_timeout(server: &MockBankServer, retries: u32, timeout_secs: u64) -> Client {
        let client =
            client_with_timeout(server, Arc::new(MemoryStorage::new()), retries, timeout_secs);
        client.session.login(MOCK_USERNAME, MOCK_PASSWORD).unwrap();
        client.session.set_current_account_id(1).unwrap();
        client
    }

    #[test]
    fn test_login_with_wrong_password_stores_nothing() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        let client = client(&server, Arc::new(MemoryStorage::new()), 0);

        let result = client.session.login(MOCK_USERNAME, "wrong");

        assert_eq!(result, Err(AuthError::InvalidCredentials));
        assert!(!client.session.is_authenticated());
    }

    #[test]
    fn test_transfer_and_duplicate_resubmission() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        let client = logged_in(&server, 0);

        let request = TransferRequest::new(1, 2, Decimal::new(50, 0), "k1");
        let response = client.transfers.transfer(&request).unwrap();
        assert_eq!(response.amount, Decimal::new(50, 0));
        assert_eq!(response.debited_from, 1);

        let again = client.transfers.transfer(&request).unwrap_err();
        assert!(again.is_duplicate());
        assert_eq!(server.transactions_with_key("k1").len(), 1);
        assert_eq!(server.balance_of(1), Some(Decimal::new(950, 0)));
        assert_eq!(server.balance_of(2), Some(Decimal::new(550, 0)));
    }

    #[test]
    fn test_lost_response_retry_is_deduplicated() {
        let server = MockBankServer::start(MockConfig {
            lost_responses: 1,
            ..Default::default()
        })
        .unwrap();
        let client = logged_in(&server, 1);

        let request = TransferRequest::new(1, 2, Decimal::new(50, 0), "k-lost");
        let result = client.transfers.transfer_with_retry(&request);

        match result {
            Err(e) => assert!(e.is_duplicate(), "expected duplicate, got {:?}", e),
            Ok(r) => panic!("expected duplicate, got {:?}", r),
        }
        assert_eq!(server.transfer_posts(), 2);
        assert_eq!(server.transactions_with_key("k-lost").len(), 1);
        assert_eq!(server.balance_of(1), Some(Decimal::new(950, 0)));
    }

    #[test]
    fn test_slow_answer_times_out_as_network_failure() {
        let server = MockBankServer::start(MockConfig {
            slow_transfers: 1,
            delay_ms: 2500,
            ..Default::default()
        })
        .unwrap();
        let client = logged_in_with_timeout(&server, 0, 1);

        let request = TransferRequest::new(1, 2, Decimal::new(50, 0), "k-slow");
        let started = std::time::Instant::now();
        let err = client.transfers.transfer(&request).unwrap_err();

        assert!(matches!(err, TransferError::Network(_)), "got {:?}", err);
        assert!(err.is_retryable());
        assert!(started.elapsed() < std::time::Duration::from_millis(2500));
        // The bank applied it even though the answer never arrived
        assert_eq!(server.transactions_with_key("k-slow").len(), 1);
    }

    #[test]
    fn test_timeout_then_retry_keeps_one_transaction() {
        let server = MockBankServer::start(MockConfig {
            slow_transfers: 1,
            delay_ms: 2500,
            ..Default::default()
        })
        .unwrap();
        let client = logged_in_with_timeout(&server, 1, 1);

        let request = TransferRequest::new(1, 2, Decimal::new(50, 0), "k-timeout");
        let err = client.transfers.transfer_with_retry(&request).unwrap_err();

        assert!(err.is_duplicate(), "expected duplicate, got {:?}", err);
        assert_eq!(server.transfer_posts(), 2);
        assert_eq!(server.transactions_with_key("k-timeout").len(), 1);
        assert_eq!(server.balance_of(1), Some(Decimal::new(950, 0)));
    }

    #[test]
    fn test_refused_transfer_succeeds_on_retry() {
        let server = MockBankServer::start(MockConfig {
            refused_transfers: 1,
            ..Default::default()
        })
        .unwrap();
        let client = logged_in(&server, 1);

        let request = TransferRequest::new(1, 2, Decimal::new(25, 0), "k-refused");
        let response = client.transfers.transfer_with_retry(&request).unwrap();

        assert_eq!(response.amount, Decimal::new(25, 0));
        assert_eq!(server.transfer_posts(), 2);
        assert_eq!(server.transactions_with_key("k-refused").len(), 1);
    }

    #[test]
    fn test_backend_rejections() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        let client = logged_in(&server, 1);

        let too_much = TransferRequest::new(1, 2, Decimal::new(5000, 0), "k-big");
        match client.transfers.transfer_with_retry(&too_much) {
            Err(TransferError::Rejected { error_code, .. }) => assert_eq!(error_code, "TRX-400"),
            other => panic!("expected TRX-400, got {:?}", other),
        }
        // Not retried, recorded as failed
        assert_eq!(server.transfer_posts(), 1);
        let failed = server.transactions_with_key("k-big");
        assert_eq!(failed[0].status, TransactionStatus::Failed);

        let missing = TransferRequest::new(1, 99, Decimal::new(5, 0), "k-missing");
        match client.transfers.transfer(&missing) {
            Err(TransferError::Rejected { error_code, .. }) => assert_eq!(error_code, "ACC-404"),
            other => panic!("expected ACC-404, got {:?}", other),
        }

        let locked = TransferRequest::new(1, 3, Decimal::new(5, 0), "k-locked");
        match client.transfers.transfer(&locked) {
            Err(TransferError::Rejected { error_code, .. }) => assert_eq!(error_code, "ACC-403"),
            other => panic!("expected ACC-403, got {:?}", other),
        }
    }

    #[test]
    fn test_account_queries() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        let client = logged_in(&server, 0);

        let account = client.accounts.get_account(1).unwrap();
        assert_eq!(account.holder_name, "Alice Johnson");
        assert!(account.is_active());
        assert_eq!(
            client.accounts.get_balance(2).unwrap(),
            Decimal::new(500, 0)
        );

        let missing = client.accounts.get_account(42);
        assert!(matches!(missing, Err(crate::Error::NotFound(_))));
    }

    #[test]
    fn test_history_newest_first() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        let old = |id: &str, days: i64| TransactionLog {
            id: id.to_string(),
            from_account_id: 2,
            to_account_id: 1,
            amount: Decimal::new(10, 0),
            status: TransactionStatus::Success,
            failure_reason: None,
            idempotency_key: format!("seed-{}", id),
            created_on: Utc::now().naive_utc() - Duration::days(days),
        };
        server.add_transaction(old("older", 10));
        server.add_transaction(old("newer", 2));

        let client = logged_in(&server, 0);
        client
            .transfers
            .transfer(&TransferRequest::new(1, 2, Decimal::new(5, 0), "k-new"))
            .unwrap();

        let history = client.accounts.get_transactions(1).unwrap();
        let keys: Vec<&str> = history.iter().map(|t| t.idempotency_key.as_str()).collect();
        assert_eq!(keys, vec!["k-new", "seed-newer", "seed-older"]);
    }

    #[test]
    fn test_requests_without_session_are_unauthorized() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        let client = client(&server, Arc::new(MemoryStorage::new()), 0);

        assert!(matches!(
            client.accounts.get_account(1),
            Err(crate::Error::NotAuthenticated(_))
        ));
    }

    #[test]
    fn test_file_session_survives_restart() {
        let server = MockBankServer::start(MockConfig::default()).unwrap();
        let dir = tempdir().unwrap();

        {
            let first = client(&server, Arc::new(FileStorage::in_dir(dir.path())), 0);
            first.session.login(MOCK_USERNAME, MOCK_PASSWORD).unwrap();
            first.session.set_current_account_id(1).unwrap();
        }

        let second = client(&server, Arc::new(FileStorage::in_dir(dir.path())), 0);
        assert!(second.session.is_authenticated());
        assert_eq!(second.session.username().unwrap().as_deref(), Some("alice"));
        assert_eq!(second.session.current_account_id().unwrap(), Some(1));
        assert_eq!(second.accounts.get_account(1).unwrap().id, 1);

        second.session.logout().unwrap();
        let third = client(&server, Arc::new(FileStorage::in_dir(dir.path())), 0);
        assert!(!third.session.is_authenticated());
    }
}
