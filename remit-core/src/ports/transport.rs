//! Transport port - outgoing API requests
//!
//! Requests are plain values so pipeline stages (such as the auth
//! interceptor) can derive modified copies without touching the original.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// HTTP method subset used by the banking API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// An outgoing API request, path relative to the configured base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<JsonValue>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Build a POST with a JSON body
    pub fn post_json<T: Serialize>(
        path: impl Into<String>,
        body: &T,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            method: Method::Post,
            path: path.into(),
            headers: Vec::new(),
            body: Some(serde_json::to_value(body)?),
        })
    }

    /// Set a header, replacing any existing header with the same name
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Look up a header value (case-insensitive name)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A received response; the body is kept raw so callers can try several shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

/// Failure before any HTTP status was received
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection timed out after {0} seconds")]
    Timeout(u64),

    #[error("Unable to connect to the banking service")]
    Connect,

    #[error("Request failed: {0}")]
    Other(String),
}

/// Sends requests to the backend
///
/// Implementations perform no retries; retry policy belongs to the caller.
pub trait Transport: Send + Sync {
    fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}
