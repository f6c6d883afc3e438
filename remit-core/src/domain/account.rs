//! Account domain model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a bank account as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountStatus {
    Active,
    Locked,
    Closed,
    #[serde(other)]
    Unknown,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Locked => "LOCKED",
            AccountStatus::Closed => "CLOSED",
            AccountStatus::Unknown => "UNKNOWN",
        }
    }
}

/// A bank account, read-only projection of the backend's account response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub holder_name: String,
    pub balance: Decimal,
    pub status: AccountStatus,
}

impl Account {
    /// Create an active account
    pub fn new(id: i64, holder_name: impl Into<String>, balance: Decimal) -> Self {
        Self {
            id,
            holder_name: holder_name.into(),
            balance,
            status: AccountStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}
