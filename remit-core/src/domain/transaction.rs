//! Transaction history domain model

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome of a transfer as recorded by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Success,
    Failed,
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Success => "SUCCESS",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Which side of a transaction an account is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Sent,
    Received,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Sent => "SENT",
            Direction::Received => "RECEIVED",
        }
    }
}

/// A transaction log entry, read-only projection from the backend
///
/// `created_on` is a zone-less timestamp; the backend writes its local time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLog {
    pub id: String,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Decimal,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub idempotency_key: String,
    pub created_on: NaiveDateTime,
}

impl TransactionLog {
    /// Sent when the account is the debit side, received otherwise
    pub fn direction_for(&self, account_id: i64) -> Direction {
        if self.from_account_id == account_id {
            Direction::Sent
        } else {
            Direction::Received
        }
    }

    /// The account on the other side of the transaction
    pub fn counterparty_for(&self, account_id: i64) -> i64 {
        match self.direction_for(account_id) {
            Direction::Sent => self.to_account_id,
            Direction::Received => self.from_account_id,
        }
    }

    /// Amount as seen from the account: negative when sent
    pub fn signed_amount_for(&self, account_id: i64) -> Decimal {
        match self.direction_for(account_id) {
            Direction::Sent => -self.amount,
            Direction::Received => self.amount,
        }
    }
}

/// Order a history newest first
pub fn sort_newest_first(transactions: &mut [TransactionLog]) {
    transactions.sort_by(|a, b| b.created_on.cmp(&a.created_on));
}
