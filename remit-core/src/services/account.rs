//! Account service - account details, balance and transaction history

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use crate::domain::result::{Error, Result};
use crate::domain::{sort_newest_first, Account, ErrorResponse, TransactionLog};
use crate::ports::{ApiRequest, ApiResponse};
use crate::services::ApiClient;

/// Read-only queries against the account endpoints
pub struct AccountService {
    api: Arc<ApiClient>,
}

impl AccountService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub fn get_account(&self, account_id: i64) -> Result<Account> {
        self.fetch(&format!("/accounts/{}", account_id))
    }

    pub fn get_balance(&self, account_id: i64) -> Result<Decimal> {
        self.fetch(&format!("/accounts/{}/balance", account_id))
    }

    /// Transaction history, newest first
    pub fn get_transactions(&self, account_id: i64) -> Result<Vec<TransactionLog>> {
        let mut transactions: Vec<TransactionLog> =
            self.fetch(&format!("/accounts/{}/transactions", account_id))?;
        sort_newest_first(&mut transactions);
        Ok(transactions)
    }

    fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .api
            .send(&ApiRequest::get(path))
            .map_err(|e| Error::Network(e.to_string()))?;

        check_response_status(&response)?;

        response
            .json()
            .map_err(|e| Error::Api(format!("Unexpected response from {}: {}", path, e)))
    }
}

/// Map non-2xx answers to errors, keeping the backend's message when it sent one
fn check_response_status(response: &ApiResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    let backend_message = response
        .json::<ErrorResponse>()
        .ok()
        .map(|e| e.message);

    match response.status {
        401 => Err(Error::not_authenticated(
            "the server rejected the stored credential",
        )),
        404 => Err(Error::not_found(
            backend_message.unwrap_or_else(|| "resource not found".to_string()),
        )),
        status => Err(Error::Api(
            backend_message.unwrap_or_else(|| format!("HTTP {}", status)),
        )),
    }
}
