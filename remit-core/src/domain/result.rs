//! Result and error types for the core library

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error code the backend uses when an idempotency key was already processed
pub const DUPLICATE_TRANSFER_CODE: &str = "TRX-409";

/// Error code used for field-level validation failures reported by the backend
pub const FIELD_VALIDATION_CODE: &str = "VAL-422";

/// Login failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Please enter both username and password")]
    MissingCredentials,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Login failed. Please try again. ({0})")]
    Unreachable(String),

    #[error("Could not save session: {0}")]
    Storage(String),
}

/// Transfer failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Caller-side check failed; nothing was sent
    #[error("{0}")]
    Validation(String),

    /// Backend answered with a structured error body
    #[error("{message}")]
    Rejected { error_code: String, message: String },

    /// No structured answer from the backend
    #[error("Transfer failed. Please try again. ({0})")]
    Network(String),

    #[error("A transfer is already in progress")]
    InProgress,

    /// The backend refused the stored credential; resubmitting cannot help
    #[error("The server rejected the stored credential. Log in again.")]
    NotAuthenticated,
}

impl TransferError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True when the backend reports the idempotency key as already used
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Rejected { error_code, .. } if error_code == DUPLICATE_TRANSFER_CODE)
    }

    /// Only transport-level failures are safe to resubmit blindly
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Stable label without amounts or account ids, for event logs
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Rejected { .. } => "rejected",
            Self::Network(_) => "network",
            Self::InProgress => "in_progress",
            Self::NotAuthenticated => "not_authenticated",
        }
    }
}

impl AuthError {
    /// Stable label without user input, for event logs
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing_credentials",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Unreachable(_) => "unreachable",
            Self::Storage(_) => "storage",
        }
    }
}

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not logged in: {0}")]
    NotAuthenticated(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a not authenticated error
    pub fn not_authenticated(msg: impl Into<String>) -> Self {
        Self::NotAuthenticated(msg.into())
    }

    /// Variant name, for event logs that must not carry message details
    pub fn category(&self) -> &'static str {
        match self {
            Self::Storage(_) => "storage",
            Self::NotFound(_) => "not_found",
            Self::NotAuthenticated(_) => "not_authenticated",
            Self::Config(_) => "config",
            Self::Api(_) => "api",
            Self::Network(_) => "network",
            Self::Auth(e) => e.category(),
            Self::Transfer(e) => e.category(),
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Other(_) => "other",
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_code: None,
            context: None,
        }
    }

    /// Create a failed result
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            error_code: None,
            context: None,
        }
    }

    /// Attach a machine-readable error code
    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(e.to_string()),
        }
    }
}

impl<T> From<std::result::Result<T, TransferError>> for OperationResult<T> {
    fn from(result: std::result::Result<T, TransferError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(TransferError::Rejected { error_code, message }) => {
                Self::fail(message).with_error_code(error_code)
            }
            Err(e) => Self::fail(e.to_string()),
        }
    }
}
