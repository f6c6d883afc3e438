//! Transfer service - submit money movements exactly once per user action
//!
//! The caller builds a `TransferRequest` (usually via `prepare`) and owns it
//! for the lifetime of the user action. Retries resend that same value, so
//! the backend can deduplicate on its idempotency key.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::domain::result::{TransferError, FIELD_VALIDATION_CODE};
use crate::domain::{
    generate_idempotency_key, validate_transfer, Account, ErrorResponse, TransferRequest,
    TransferResponse,
};
use crate::ports::{ApiRequest, ApiResponse};
use crate::services::ApiClient;

/// Delay before the first resubmission (doubles on each further retry)
const RETRY_DELAY_MS: u64 = 250;

type TransferResult = std::result::Result<TransferResponse, TransferError>;

/// Transfer submitter
pub struct TransferService {
    api: Arc<ApiClient>,
    max_retries: u32,
    in_flight: AtomicBool,
}

impl TransferService {
    /// `max_retries` bounds `transfer_with_retry`; `transfer` never retries
    pub fn new(api: Arc<ApiClient>, max_retries: u32) -> Self {
        Self {
            api,
            max_retries,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Fresh key for a new logical transfer attempt
    pub fn generate_idempotency_key(&self) -> String {
        generate_idempotency_key()
    }

    /// Validate against the locally known source account and build the request
    pub fn prepare(
        &self,
        source: &Account,
        to_account_id: i64,
        amount: Decimal,
    ) -> std::result::Result<TransferRequest, TransferError> {
        validate_transfer(source, to_account_id, amount)?;
        Ok(TransferRequest::new(
            source.id,
            to_account_id,
            amount,
            self.generate_idempotency_key(),
        ))
    }

    /// Whether a submission is currently running on this service
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Send the request exactly as constructed, once
    pub fn transfer(&self, request: &TransferRequest) -> TransferResult {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;
        self.submit(request)
    }

    /// Send the request, resubmitting the same value on transport failures
    ///
    /// At most `max_retries` resubmissions, each bounded by the transport
    /// timeout. Backend rejections are returned immediately. A `TRX-409`
    /// after a retry means an earlier attempt did reach the backend.
    pub fn transfer_with_retry(&self, request: &TransferRequest) -> TransferResult {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        let mut attempt: u32 = 0;
        loop {
            match self.submit(request) {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = retry_delay(attempt);
                    attempt += 1;
                    eprintln!(
                        "[remit] Transfer {} not confirmed, resubmitting in {}ms (attempt {}/{}): {}",
                        request.idempotency_key,
                        delay.as_millis(),
                        attempt,
                        self.max_retries,
                        e
                    );
                    thread::sleep(delay);
                }
                result => return result,
            }
        }
    }

    fn submit(&self, request: &TransferRequest) -> TransferResult {
        let api_request = ApiRequest::post_json("/transfers", request)
            .map_err(|e| TransferError::validation(format!("Could not encode transfer: {}", e)))?;

        let response = self
            .api
            .send(&api_request)
            .map_err(|e| TransferError::Network(e.to_string()))?;

        if !response.is_success() {
            return Err(rejection_from(&response));
        }

        response
            .json()
            .map_err(|e| TransferError::Network(format!("Unreadable transfer response: {}", e)))
    }
}

/// Backoff before resubmission `attempt + 1`, doubling and saturating
fn retry_delay(attempt: u32) -> Duration {
    Duration::from_millis(RETRY_DELAY_MS.saturating_mul(2u64.saturating_pow(attempt)))
}

/// Classify a non-2xx answer
///
/// A structured error body is surfaced verbatim; a 4xx field map (bean
/// validation) becomes a `VAL-422` rejection; a bare 401/403 means the
/// stored credential was refused; anything else carries no backend verdict
/// and is treated like a transport failure.
fn rejection_from(response: &ApiResponse) -> TransferError {
    if let Ok(error) = response.json::<ErrorResponse>() {
        return TransferError::Rejected {
            error_code: error.error_code,
            message: error.message,
        };
    }

    if (400..500).contains(&response.status) {
        if let Ok(fields) = response.json::<BTreeMap<String, String>>() {
            if !fields.is_empty() {
                let message = fields
                    .iter()
                    .map(|(field, msg)| format!("{}: {}", field, msg))
                    .collect::<Vec<_>>()
                    .join("; ");
                return TransferError::Rejected {
                    error_code: FIELD_VALIDATION_CODE.to_string(),
                    message,
                };
            }
        }
    }

    if matches!(response.status, 401 | 403) {
        return TransferError::NotAuthenticated;
    }

    TransferError::Network(format!("HTTP {} without error details", response.status))
}

/// Held for the duration of one submission
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> std::result::Result<Self, TransferError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| TransferError::InProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
