//! HTTP transport for the banking API
//!
//! Thin `reqwest::blocking` wrapper: joins request paths onto the configured
//! base URL, enforces the client timeout and maps transport failures to
//! `TransportError`. Authorization is added upstream by the interceptor.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use url::Url;

use crate::ports::{ApiRequest, ApiResponse, Method, Transport, TransportError};

/// Default API base URL of a local backend
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";

/// Blocking HTTP transport
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport for `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL: {}", base_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("API base URL must use http or https: {}", base_url);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Map request errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(self.timeout.as_secs())
        } else if error.is_connect() {
            TransportError::Connect
        } else {
            TransportError::Other(error.to_string())
        }
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: ApiRequest) -> std::result::Result<ApiResponse, TransportError> {
        let url = self.url_for(&request.path);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        builder = builder.header("Accept", "application/json");
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().map_err(|e| self.map_request_error(e))?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| self.map_request_error(e))?;

        Ok(ApiResponse::new(status, body))
    }
}
