//! Transfer domain model and caller-side validation

use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::TransferError;
use super::Account;

/// Alphabet for the random half of an idempotency key
const KEY_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Number of random characters in an idempotency key
const KEY_RANDOM_LEN: usize = 9;

/// Generate an idempotency key for one logical transfer attempt
///
/// Format: `<unix millis>-<9 base36 chars>`. The timestamp alone collides
/// for calls within the same millisecond, the random suffix does not.
pub fn generate_idempotency_key() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..KEY_RANDOM_LEN)
        .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}

/// Request body for `POST /transfers`
///
/// Retrying must resend this exact value so the backend can deduplicate
/// on `idempotency_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub from_account_id: i64,
    pub to_account_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub idempotency_key: String,
}

impl TransferRequest {
    pub fn new(
        from_account_id: i64,
        to_account_id: i64,
        amount: Decimal,
        idempotency_key: impl Into<String>,
    ) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
            idempotency_key: idempotency_key.into(),
        }
    }
}

/// Successful transfer as reported by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub transaction_id: Uuid,
    pub status: String,
    pub message: String,
    pub debited_from: i64,
    pub credited_to: i64,
    pub amount: Decimal,
}

/// Error body returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_code: String,
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Pessimistic pre-submission check against the locally known source account
///
/// The balance may be stale; the backend decides sufficiency at execution time.
pub fn validate_transfer(
    source: &Account,
    to_account_id: i64,
    amount: Decimal,
) -> Result<(), TransferError> {
    if to_account_id <= 0 {
        return Err(TransferError::validation(
            "Please enter destination account ID",
        ));
    }
    if amount <= Decimal::ZERO {
        return Err(TransferError::validation("Please enter a valid amount"));
    }
    if to_account_id == source.id {
        return Err(TransferError::validation(
            "Cannot transfer to the same account",
        ));
    }
    if amount > source.balance {
        return Err(TransferError::validation("Insufficient balance"));
    }
    Ok(())
}
